//! Error types for this crate.
//!
//! All fallible operations return [`Result<T>`] which uses [`InspectError`] as the error type.

use thiserror::Error;

/// A [`Result`](std::result::Result) alias using [`InspectError`] as the error type.
pub type Result<T> = std::result::Result<T, InspectError>;

/// The unified error type for all crate errors.
///
/// # Example
///
/// ```rust,no_run
/// use zeroshot_inspect::core::InspectError;
///
/// fn handle_error(e: InspectError) {
///     match &e {
///         InspectError::IndexOutOfRange { index, len } => {
///             eprintln!("row {index} does not exist, dataset has {len} rows");
///         }
///         InspectError::Download(_) => {
///             // Network issue - retry with backoff
///         }
///         _ => eprintln!("{e}"),
///     }
/// }
/// ```
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum InspectError {
    /// A row position outside `0..len`.
    #[error("index {index} is out of range for dataset of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// A record lacks a field the caller asked for.
    #[error("record {index} has no field `{field}`")]
    MissingField { index: usize, field: String },

    /// A field exists but holds a value of the wrong kind.
    #[error("record {index} field `{field}`: {reason}")]
    InvalidField {
        index: usize,
        field: String,
        reason: String,
    },

    /// Classifier output whose columns disagree in length.
    #[error("malformed classification result: {labels} labels but {scores} scores")]
    MalformedResult { labels: usize, scores: usize },

    /// A classification result with no rows.
    #[error("classification result has no rows")]
    EmptyResult,

    /// Bad arguments or input data. Fix and retry.
    #[error("{0}")]
    InvalidInput(String),

    /// Network or download failure. Retry may help.
    #[error("{0}")]
    Download(String),

    /// Tokenization failure. Check input text.
    #[error("{0}")]
    Tokenization(String),

    /// Device initialization failure. Fall back to CPU.
    #[error("{0}")]
    Device(String),

    /// A chart could not be drawn.
    #[error("chart error: {0}")]
    Chart(String),

    /// Config file could not be read or parsed.
    #[error("{0}")]
    Config(String),

    /// Failure writing output or reading input files.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Internal error. Report if seen.
    #[error("{0}")]
    Unexpected(String),
}

impl From<hf_hub::api::sync::ApiError> for InspectError {
    fn from(value: hf_hub::api::sync::ApiError) -> Self {
        InspectError::Download(format!("HuggingFace API error: {value}"))
    }
}

impl From<candle_core::Error> for InspectError {
    fn from(value: candle_core::Error) -> Self {
        InspectError::Unexpected(value.to_string())
    }
}

impl From<serde_json::Error> for InspectError {
    fn from(value: serde_json::Error) -> Self {
        InspectError::InvalidInput(format!("JSON error: {value}"))
    }
}
