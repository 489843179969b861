use thiserror::Error;

pub type ChartResult<T> = Result<T, ChartError>;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("insufficient data: need at least {required} points, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("invalid timestamp at point {index}: {value:?}")]
    InvalidTimestamp { index: usize, value: String },

    #[error("timestamps must be strictly ascending (point {index})")]
    UnsortedData { index: usize },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid number format {spec:?}: {reason}")]
    InvalidFormat { spec: String, reason: String },

    #[error("invalid color {0:?}")]
    InvalidColor(String),

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("host error: {0}")]
    Host(String),
}

impl ChartError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
