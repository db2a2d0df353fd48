use thiserror::Error;

/// Failures of the encoding pipeline. Both variants abort the current
/// estimate; nothing is substituted silently.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EncodeError {
    #[error("unknown category {value:?} for column {column}")]
    UnknownCategory { column: String, value: String },
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("feature length mismatch: got {got}, expected {expected}")]
    FeatureLength { got: usize, expected: usize },
    #[error("malformed tree {tree}: {reason}")]
    MalformedTree { tree: usize, reason: String },
    #[error("model produced a non-finite prediction ({0})")]
    NonFinite(f64),
    #[error("model backend failure: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("routing request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("routing service answered with status {0}")]
    Status(u16),
    #[error("routing response contained no route")]
    NoRoute,
    #[error("routing response geometry is malformed: {0}")]
    Geometry(String),
}

/// Everything that can end one estimate cycle early.
#[derive(Debug, Error)]
pub enum EstimateError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("unknown session {0}")]
    UnknownSession(String),
}
