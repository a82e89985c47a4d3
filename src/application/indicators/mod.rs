//! Pure indicator functions over price/candle sequences ordered
//! oldest-to-newest.
//!
//! Every function returns `None` when the input is shorter than the
//! statistical requirement for its parameters, and never panics.

mod adx;
mod bollinger;
mod candle_patterns;
mod donchian;
mod fibonacci;
mod ichimoku;
mod macd;
mod moving;
mod oscillators;
mod parabolic_sar;
mod volatility;

pub use adx::adx;
pub use bollinger::{BollingerBands, bollinger};
pub use candle_patterns::{CandlePattern, detect_patterns};
pub use donchian::{Donchian, donchian};
pub use fibonacci::fibonacci_levels;
pub use ichimoku::{Ichimoku, ichimoku};
pub use macd::{Macd, macd};
pub use moving::{ema, sma};
pub use oscillators::{Kdj, Stochastic, kdj, rsi, stoch_rsi, stochastic};
pub use parabolic_sar::parabolic_sar;
pub use volatility::{Supertrend, atr, supertrend};
