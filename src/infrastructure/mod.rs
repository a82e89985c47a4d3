pub mod bybit;
pub mod core;
