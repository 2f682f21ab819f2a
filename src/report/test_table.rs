use std::sync::Arc;

use polars::{
    frame::DataFrame,
    prelude::{Column, DataType, Field, PlSmallStr, Schema, SchemaRef},
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::{
    error::{DataError, EventStudyError, EventStudyResult},
    hypothesis::WindowStats,
    report::{
        io::{Report, ToSchema},
        polars_ext::polars_to_event_study_error,
    },
};

/// Window-indexed result of a single-sample or two-sample CAR test.
///
/// One row per window, in the caller's window order. Missing statistics are
/// stored as nulls.
#[derive(Debug, Clone)]
pub struct TestTable {
    df: DataFrame,
}

impl Default for TestTable {
    fn default() -> Self {
        let df = DataFrame::empty_with_schema(&Self::to_schema());
        Self { df }
    }
}

impl Report for TestTable {
    fn as_df(&self) -> &DataFrame {
        &self.df
    }
}

impl ToSchema for TestTable {
    fn to_schema() -> SchemaRef {
        let fields: Vec<Field> = TestTableCol::iter()
            .map(|col| {
                let dtype = match col {
                    TestTableCol::Window | TestTableCol::N => DataType::UInt32,

                    TestTableCol::Mean
                    | TestTableCol::Std
                    | TestTableCol::TStat
                    | TestTableCol::PValue => DataType::Float64,
                };
                Field::new(col.into(), dtype)
            })
            .collect();

        Arc::new(Schema::from_iter(fields))
    }
}

impl TryFrom<&[WindowStats]> for TestTable {
    type Error = EventStudyError;

    fn try_from(rows: &[WindowStats]) -> EventStudyResult<Self> {
        let columns = TestTableCol::iter()
            .map(|col| {
                let name = col.name();
                match col {
                    TestTableCol::Window => {
                        Column::new(name, rows.iter().map(|r| r.window).collect::<Vec<u32>>())
                    }
                    TestTableCol::Mean => Column::new(name, collect_f64(rows, |r| r.mean)),
                    TestTableCol::Std => Column::new(name, collect_f64(rows, |r| r.std)),
                    TestTableCol::N => Column::new(
                        name,
                        rows.iter().map(|r| r.n).collect::<Vec<Option<u32>>>(),
                    ),
                    TestTableCol::TStat => Column::new(name, collect_f64(rows, |r| r.t_stat)),
                    TestTableCol::PValue => Column::new(name, collect_f64(rows, |r| r.p_value)),
                }
            })
            .collect::<Vec<_>>();

        let df = DataFrame::new(columns).map_err(convert_err)?;
        Ok(Self { df })
    }
}

impl TestTable {
    pub fn len(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Windows in row order.
    pub fn windows(&self) -> EventStudyResult<Vec<u32>> {
        let windows = self
            .df
            .column(TestTableCol::Window.as_str())
            .and_then(|c| c.u32().cloned())
            .map_err(convert_err)?;

        windows
            .into_iter()
            .map(|w| w.ok_or_else(|| DataError::MissingValue(TestTableCol::Window.to_string()).into()))
            .collect()
    }

    /// Values of a statistic column in row order; `None` marks a missing value.
    pub fn column_values(&self, col: TestTableCol) -> EventStudyResult<Vec<Option<f64>>> {
        let column = self
            .df
            .column(col.as_str())
            .and_then(|c| c.cast(&DataType::Float64))
            .map_err(convert_err)?;
        let values = column.f64().map_err(convert_err)?;
        Ok(values.into_iter().collect())
    }

    /// Reconstructs the typed rows.
    pub fn rows(&self) -> EventStudyResult<Vec<WindowStats>> {
        let windows = self.windows()?;
        let mean = self.column_values(TestTableCol::Mean)?;
        let std = self.column_values(TestTableCol::Std)?;
        let n = self.column_values(TestTableCol::N)?;
        let t_stat = self.column_values(TestTableCol::TStat)?;
        let p_value = self.column_values(TestTableCol::PValue)?;

        Ok(windows
            .into_iter()
            .enumerate()
            .map(|(i, window)| WindowStats {
                window,
                mean: mean[i],
                std: std[i],
                n: n[i].map(|v| v as u32),
                t_stat: t_stat[i],
                p_value: p_value[i],
            })
            .collect())
    }

    /// First row for `window`, if the window is part of the table.
    pub fn row(&self, window: u32) -> EventStudyResult<Option<WindowStats>> {
        Ok(self.rows()?.into_iter().find(|r| r.window == window))
    }
}

// ================================================================================================
// Helper Functions
// ================================================================================================
fn collect_f64(rows: &[WindowStats], f: impl Fn(&WindowStats) -> Option<f64>) -> Vec<Option<f64>> {
    rows.iter().map(f).collect()
}

fn convert_err(e: polars::error::PolarsError) -> EventStudyError {
    polars_to_event_study_error("test table", e)
}

/// Columns of a [`TestTable`]. Names and order are the contract with presentation layers.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    PartialOrd,
    Ord,
    EnumIter,
    IntoStaticStr,
    EnumCount,
)]
#[strum(serialize_all = "snake_case")]
pub enum TestTableCol {
    /// CAR window length (row key).
    Window,
    /// Mean CAR of the tested sample.
    Mean,
    /// Sample standard deviation of the CARs.
    Std,
    /// Number of CAR samples.
    N,
    /// Student t statistic.
    TStat,
    /// Two-sided p-value.
    PValue,
}

impl From<TestTableCol> for PlSmallStr {
    fn from(value: TestTableCol) -> Self {
        value.as_str().into()
    }
}

impl TestTableCol {
    pub fn name(&self) -> PlSmallStr {
        (*self).into()
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}
