use serde::{Deserialize, Serialize};

use crate::Timeframe;

/// Process configuration loaded from environment variables at startup.
/// Missing required variables cause an immediate panic with a clear message.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the TOML instrument file.
    pub instrument_config_path: String,
    /// Path to the candle replay file consumed by the paper feed.
    pub candle_file: String,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present. Panics on any missing required variable.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        Config {
            instrument_config_path: optional_env("INSTRUMENT_CONFIG_PATH")
                .unwrap_or_else(|| "config/instruments.toml".to_string()),
            candle_file: required_env("CANDLE_FILE"),
        }
    }
}

fn required_env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        panic!("Required environment variable '{key}' is not set. Check your .env file.")
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Top-level instrument config file (TOML).
///
/// Example `config/instruments.toml`:
/// ```toml
/// [[instrument]]
/// symbol = "EURUSD"
/// label = "coil-breakout"
/// entry_timeframe = "m5"
/// context_timeframe = "h1"
/// point_value = 1.0
/// risk_fraction = 0.02
/// cycle_interval_secs = 60
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InstrumentFileConfig {
    #[serde(rename = "instrument")]
    pub instruments: Vec<InstrumentConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InstrumentConfig {
    /// Instrument symbol, e.g. "EURUSD".
    pub symbol: String,
    /// Label attached to submitted orders, shown in logs.
    pub label: String,
    /// Fast timeframe the detectors run on.
    pub entry_timeframe: Timeframe,
    /// Slow timeframe supplying trend context.
    pub context_timeframe: Timeframe,
    /// Account-currency value of one point of price movement per lot.
    pub point_value: f64,
    /// Minimum lot increment of the instrument.
    #[serde(default = "default_lot_step")]
    pub lot_step: f64,
    /// Fraction of equity risked per trade.
    #[serde(default = "default_risk_fraction")]
    pub risk_fraction: f64,
    /// Seconds between analysis cycles.
    #[serde(default = "default_cycle_interval")]
    pub cycle_interval_secs: u64,
}

fn default_lot_step() -> f64 {
    0.01
}

fn default_risk_fraction() -> f64 {
    0.02
}

fn default_cycle_interval() -> u64 {
    60
}

impl InstrumentFileConfig {
    /// Load from a TOML file. Exits process on error.
    pub fn load(path: &str) -> Self {
        let content = std::fs::read_to_string(path)
            .unwrap_or_else(|e| panic!("Failed to read instrument config at '{path}': {e}"));
        toml::from_str(&content)
            .unwrap_or_else(|e| panic!("Failed to parse instrument config at '{path}': {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instrument_file_parses_with_defaults() {
        let toml = r#"
            [[instrument]]
            symbol = "EURUSD"
            label = "coil-breakout"
            entry_timeframe = "m5"
            context_timeframe = "h1"
            point_value = 1.0
        "#;
        let cfg: InstrumentFileConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.instruments.len(), 1);
        let inst = &cfg.instruments[0];
        assert_eq!(inst.symbol, "EURUSD");
        assert_eq!(inst.entry_timeframe, Timeframe::M5);
        assert_eq!(inst.context_timeframe, Timeframe::H1);
        assert!((inst.risk_fraction - 0.02).abs() < f64::EPSILON);
        assert!((inst.lot_step - 0.01).abs() < f64::EPSILON);
        assert_eq!(inst.cycle_interval_secs, 60);
    }
}
