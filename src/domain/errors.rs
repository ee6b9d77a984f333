use thiserror::Error;

/// Input-validation failures. The run does not start when one of these occurs.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("candle table is empty")]
    EmptyCandles,

    #[error("timestamps are not strictly monotonic: bar {index} has timestamp {timestamp} which does not exceed the previous bar's {previous}")]
    NonMonotonicTimestamps {
        index: usize,
        timestamp: i64,
        previous: i64,
    },

    #[error("bar {index} has high ({high}) below low ({low})")]
    InvertedBar { index: usize, high: f64, low: f64 },

    #[error("need at least {required} bars, got {available}")]
    InsufficientBars { required: usize, available: usize },
}

/// Non-fatal per-condition failures raised while parsing a strategy document.
#[derive(Debug, Error)]
pub enum StrategyLoadError {
    #[error("unknown condition type '{type_name}'")]
    UnknownConditionType { type_name: String },

    #[error("condition '{type_name}' rejected parameter '{param}': {reason}")]
    InvalidParameter {
        type_name: String,
        param: String,
        reason: String,
    },

    #[error("failed to parse strategy document: {reason}")]
    DocumentParse { reason: String },

    #[error("strategy '{name}' has no remaining entry conditions and was disabled")]
    NoEntryConditions { name: String },
}

/// A single parallel backtest run's failure, isolated from the rest of the batch.
#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("strategy '{strategy_name}' is disabled and cannot be run")]
    StrategyDisabled { strategy_name: String },
}
