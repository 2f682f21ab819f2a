use chrono::NaiveDate;
use polars::{
    frame::DataFrame,
    prelude::{Column, DataType, DateChunked, IntoColumn, PlSmallStr},
};
use serde::{Deserialize, Serialize};

use crate::error::{DataError, EventStudyResult, PreconditionError};

/// An ordered `(date, return)` sequence with a strictly increasing date axis.
///
/// This is the time axis every other computation refers to: event dates are
/// resolved to integer positions on it, and derived series (residuals) share it.
///
/// # Invariants
/// - `dates` is strictly increasing (no duplicates).
/// - `dates.len() == values.len()`.
/// - Every value is finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl ReturnSeries {
    /// Builds a series from parallel date and value vectors.
    ///
    /// # Errors
    /// - [`DataError::LengthMismatch`] if the vectors differ in length.
    /// - [`DataError::DuplicateDate`] / [`DataError::UnsortedAxis`] if the axis is not strictly increasing.
    /// - [`DataError::NonFiniteValue`] if any return is `NaN` or infinite.
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> EventStudyResult<Self> {
        if dates.len() != values.len() {
            return Err(DataError::LengthMismatch {
                dates: dates.len(),
                values: values.len(),
            }
            .into());
        }

        for pair in dates.windows(2) {
            if pair[1] == pair[0] {
                return Err(DataError::DuplicateDate(pair[1]).into());
            }
            if pair[1] < pair[0] {
                return Err(DataError::UnsortedAxis(pair[1]).into());
            }
        }

        if let Some((d, _)) = dates.iter().zip(&values).find(|(_, v)| !v.is_finite()) {
            return Err(DataError::NonFiniteValue(*d).into());
        }

        Ok(Self { dates, values })
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (NaiveDate, f64)>) -> EventStudyResult<Self> {
        let (dates, values) = pairs.into_iter().unzip();
        Self::new(dates, values)
    }

    /// Reads a series from a `DataFrame` holding a `Date` column and a numeric return column.
    ///
    /// Null entries in either column are rejected, not skipped.
    pub fn from_df(df: &DataFrame, date_col: &str, value_col: &str) -> EventStudyResult<Self> {
        let dates = df
            .column(date_col)?
            .date()?
            .as_date_iter()
            .map(|d| d.ok_or_else(|| DataError::MissingValue(date_col.to_string())))
            .collect::<Result<Vec<_>, _>>()?;

        let value_column = df.column(value_col)?.cast(&DataType::Float64)?;
        let values = value_column
            .f64()?
            .into_iter()
            .map(|v| v.ok_or_else(|| DataError::MissingValue(value_col.to_string())))
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(dates, values)
    }

    /// Converts the series into a two-column `DataFrame` (`date`, `value_col`).
    pub fn to_df(&self, value_col: &str) -> EventStudyResult<DataFrame> {
        let date = DateChunked::from_naive_date(PlSmallStr::from("date"), self.dates.iter().copied())
            .into_column();
        let value = Column::new(PlSmallStr::from(value_col), self.values.clone());
        Ok(DataFrame::new(vec![date, value])?)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    #[inline]
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Returns the 0-based offset of `date` on the axis, if present.
    #[inline]
    pub fn position(&self, date: &NaiveDate) -> Option<usize> {
        self.dates.binary_search(date).ok()
    }

    #[inline]
    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.position(date).is_some()
    }

    pub fn get(&self, date: &NaiveDate) -> Option<f64> {
        self.position(date).map(|i| self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &f64)> {
        self.dates.iter().zip(self.values.iter())
    }

    /// Fails unless `other` has exactly the same date axis.
    pub fn ensure_same_axis(&self, other: &Self) -> EventStudyResult<()> {
        if self.len() != other.len() {
            return Err(PreconditionError::AxisMismatch(format!(
                "lengths differ ({} vs. {})",
                self.len(),
                other.len()
            ))
            .into());
        }

        if let Some((a, b)) = self
            .dates
            .iter()
            .zip(&other.dates)
            .find(|(a, b)| a != b)
        {
            return Err(
                PreconditionError::AxisMismatch(format!("first differing dates {a} vs. {b}")).into(),
            );
        }

        Ok(())
    }

    /// Derives a series on the same axis. Callers guarantee `values.len() == self.len()`
    /// and finite values.
    pub(crate) fn with_values(&self, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), self.dates.len());
        Self {
            dates: self.dates.clone(),
            values,
        }
    }
}
