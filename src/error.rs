use chrono::NaiveDate;
use indicatif::style::TemplateError;
use thiserror::Error;

pub type EventStudyResult<T> = Result<T, EventStudyError>;

#[derive(Debug, Error)]
pub enum EventStudyError {
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    System(#[from] SystemError),
}

/// Errors raised when an operation is called in a state that cannot serve it.
#[derive(Debug, Error)]
pub enum PreconditionError {
    #[error("Event study is not fitted: call `fit` before running any test")]
    NotFitted,

    #[error("Regression window {window} exceeds series length {len}")]
    WindowTooLarge { window: usize, len: usize },

    #[error("Regression window {window} is below the minimum of {min} observations")]
    WindowTooSmall { window: usize, min: usize },

    #[error("Asset and benchmark series do not share a date axis: {0}")]
    AxisMismatch(String),
}

/// Errors caused by caller-supplied arguments.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Cannot draw {requested} dates without replacement from a pool of {pool}")]
    SampleTooLarge { requested: usize, pool: usize },

    #[error("Sampling pool is empty")]
    EmptyPool,

    #[error("Date {0} is not on the residual axis")]
    DateNotOnAxis(NaiveDate),

    #[error("Monte Carlo needs at least one trial (got {0})")]
    InvalidTrials(usize),

    #[error("Hypothesized mean must be finite (got {0})")]
    NonFiniteHypothesis(f64),
}

/// Errors related to series construction and table conversion.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Date axis is not strictly increasing at {0}")]
    UnsortedAxis(NaiveDate),

    #[error("Duplicate date on axis: {0}")]
    DuplicateDate(NaiveDate),

    #[error("Non-finite return at {0}")]
    NonFiniteValue(NaiveDate),

    #[error("Length mismatch: {dates} dates vs. {values} values")]
    LengthMismatch { dates: usize, values: usize },

    #[error("Missing value in column '{0}'")]
    MissingValue(String),

    #[error("Data frame error: {0}")]
    DataFrame(String),

    #[error("Serialization failed")]
    Json(#[from] serde_json::Error),
}

/// Errors related to internal invariants and third-party components.
#[derive(Debug, Error)]
pub enum SystemError {
    #[error("Failed to build distribution: {0}")]
    Distribution(String),

    #[error("Progress bar error")]
    ProgressBar(#[from] TemplateError),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl From<polars::error::PolarsError> for DataError {
    fn from(e: polars::error::PolarsError) -> Self {
        DataError::DataFrame(e.to_string())
    }
}

impl From<polars::error::PolarsError> for EventStudyError {
    fn from(e: polars::error::PolarsError) -> Self {
        EventStudyError::Data(e.into())
    }
}

impl From<serde_json::Error> for EventStudyError {
    fn from(e: serde_json::Error) -> Self {
        EventStudyError::Data(DataError::Json(e))
    }
}
