//! Pure indicator transforms over OHLCV series.
//!
//! Every function returns a series length-aligned with its input, with
//! `None` at indices before the indicator's warmup completes. Consumers
//! must treat `None` as "not yet computable", never as zero; the
//! alignment invariant is what keeps indices comparable across series.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod rsi;
pub mod sma;
pub mod velocity;

pub use atr::atr;
pub use bollinger::{bollinger, BollingerPoint};
pub use ema::ema;
pub use rsi::rsi;
pub use sma::sma;
pub use velocity::{candle_velocity, velocity_average, VELOCITY_AVG_PERIOD};
