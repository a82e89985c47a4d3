pub mod candle;
pub mod indicator_kind;
pub mod series;
pub mod signal;
pub mod timeframe;

pub use candle::{Candle, Ticker};
pub use indicator_kind::IndicatorKind;
pub use series::{MarketCategory, SeriesKey};
pub use signal::{Direction, IndicatorVote, Signal};
pub use timeframe::Timeframe;
