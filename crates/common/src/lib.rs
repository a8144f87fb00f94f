pub mod collaborators;
pub mod config;
pub mod error;
pub mod types;

pub use collaborators::{AccountService, ExecutionGateway, MarketData};
pub use config::{Config, InstrumentConfig, InstrumentFileConfig};
pub use error::{Error, Result, UpstreamCall};
pub use types::*;
