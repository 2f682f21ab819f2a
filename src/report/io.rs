use polars::{frame::DataFrame, prelude::SchemaRef};
use serde_json::Value;

use crate::{error::EventStudyResult, report::polars_ext::DataFrameExt};

// ================================================================================================
// Traits
// ================================================================================================

/// Defines a common interface for all result tables (test tables, Monte Carlo summaries).
pub trait Report {
    /// Access the underlying DataFrame.
    fn as_df(&self) -> &DataFrame;
}

pub trait ToSchema {
    /// Returns the canonical schema for this report type.
    fn to_schema() -> SchemaRef;
}

pub trait ToJson {
    /// Serializes the report to a generic JSON Value.
    /// Returns a `Value::Array` containing row objects; missing values become `null`.
    fn to_json(&self) -> EventStudyResult<Value>;
}

// ================================================================================================
// Blanket Implementations
// ================================================================================================

impl<T> ToJson for T
where
    T: Report + ToSchema,
{
    fn to_json(&self) -> EventStudyResult<Value> {
        let rows = self.as_df().to_json_rows()?;
        Ok(Value::Array(rows.into_iter().map(Value::Object).collect()))
    }
}
