pub mod rest;
pub mod websocket;

pub use rest::{BybitRestClient, RestError};
pub use websocket::BybitWsManager;
