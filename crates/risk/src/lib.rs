pub mod monitor;
pub mod sizing;

pub use monitor::{monitor, LOSS_LIMIT_PERCENT};
pub use sizing::{size, RiskParameters, TP1_REWARD_MULTIPLE, TP2_FAST_EMA_PERIOD};
