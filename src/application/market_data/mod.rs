pub mod feed;
pub mod kline_store;

pub use feed::MarketDataFeed;
pub use kline_store::KlineStore;
