use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageFitError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Data Validation Error: {0}")]
    Validation(String),

    /// Both parameters sit at their floor and the content still overflows.
    /// The caller must reduce content or increase the column count.
    #[error("Layout bounds exhausted: {0}")]
    BoundsExhausted(String),

    /// The run burned through its step budget without reaching a terminal
    /// state. Fatal abort of the run, distinct from bounds exhaustion.
    #[error("Iteration budget exceeded: {0}")]
    IterationBudget(String),
}

pub type PfResult<T> = Result<T, PageFitError>;
