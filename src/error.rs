use crate::ir::ChartKind;

pub type ChartResult<T> = Result<T, ChartError>;

#[derive(thiserror::Error, Debug)]
pub enum ChartError {
    /// The encoding does not fit the chart kind (or is malformed).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Record count is outside the bounds the chart kind accepts.
    #[error(
        "cardinality error: {kind} chart requires between {min} and {max} records, got {count}"
    )]
    Cardinality {
        kind: ChartKind,
        count: usize,
        min: usize,
        max: usize,
    },

    /// Input records could not be read as a flat record set.
    #[error("data error: {0}")]
    Data(String),

    #[error("render error: {0}")]
    Render(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ChartError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}

impl From<serde_json::Error> for ChartError {
    fn from(err: serde_json::Error) -> Self {
        Self::Data(err.to_string())
    }
}
