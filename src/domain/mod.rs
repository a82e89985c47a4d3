// Market analysis domain
pub mod market;
