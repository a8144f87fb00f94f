use thiserror::Error;

use crate::Timeframe;

/// Which collaborator call an upstream failure originated from. Propagated
/// so a failed cycle names the call instead of fabricating data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamCall {
    Candles,
    Quote,
    Equity,
    SubmitOrder,
    SubmitClose,
    OpenPositions,
}

impl std::fmt::Display for UpstreamCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpstreamCall::Candles => write!(f, "candles"),
            UpstreamCall::Quote => write!(f, "quote"),
            UpstreamCall::Equity => write!(f, "equity"),
            UpstreamCall::SubmitOrder => write!(f, "submit-order"),
            UpstreamCall::SubmitClose => write!(f, "submit-close"),
            UpstreamCall::OpenPositions => write!(f, "open-positions"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// Too little warmed-up history to evaluate the cycle. Fatal to this
    /// cycle, not a bug: the caller should wait for more bars and retry.
    /// Also raised when a gap truncates the usable series, and when an
    /// indicator is still undefined at the evaluation index.
    #[error("insufficient {timeframe} history: need {required} bars, have {got}")]
    InsufficientHistory {
        timeframe: Timeframe,
        required: usize,
        got: usize,
    },

    /// Zero-distance stop. The signal is rejected before sizing; a stop at
    /// the entry price would divide by zero.
    #[error("invalid stop: entry {entry} equals stop-loss {stop}")]
    InvalidStop { entry: f64, stop: f64 },

    /// A collaborator call failed or timed out. The originating call is
    /// carried so the caller knows what to retry.
    #[error("upstream {call} failed: {message}")]
    Upstream { call: UpstreamCall, message: String },

    /// Supplied candle data violates the OHLC or ordering invariant. The
    /// whole batch is rejected; no partial repair is attempted.
    #[error("malformed candle at index {index}: {detail}")]
    MalformedCandle { index: usize, detail: String },

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
