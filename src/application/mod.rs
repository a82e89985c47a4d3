pub mod indicators;
pub mod market_data;
pub mod scanner;
pub mod signal;
