pub mod confirmation;
pub mod engine;

pub use confirmation::{ConfirmationCoordinator, KlineProvider};
pub use engine::SignalEngine;
