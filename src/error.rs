use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Invalid column plan for {report}: {details}")]
    InvalidColumnPlan { report: String, details: String },

    #[error("Rollup violation at {node} ({field}): expected {expected}, found {found}")]
    RollupViolation {
        node: String,
        field: String,
        expected: f64,
        found: f64,
    },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
