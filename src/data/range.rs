use serde::Serialize;

use super::model::Table;
use crate::fit::error::{FitError, Result};

/// Absolute tolerance used to find the rows sitting on a range bound.
pub const RANGE_TOLERANCE: f64 = 1e-4;

// ---------------------------------------------------------------------------
// XRange – a validated x window
// ---------------------------------------------------------------------------

/// An x-axis window `[lower, upper]`.
///
/// Bounds carry at most one decimal place: the row lookup is tuned to that
/// resolution and finer bounds would silently miss every sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct XRange {
    lower: f64,
    upper: f64,
}

impl XRange {
    pub fn new(lower: f64, upper: f64) -> Result<Self> {
        let invalid = |reason| FitError::InvalidRange {
            lower,
            upper,
            reason,
        };
        if !lower.is_finite() || !upper.is_finite() {
            return Err(invalid("bounds must be finite numbers"));
        }
        if upper <= lower {
            return Err(invalid("upper bound must be greater than lower bound"));
        }
        if !has_one_decimal(lower) || !has_one_decimal(upper) {
            return Err(invalid("bounds are limited to one decimal place"));
        }
        Ok(XRange { lower, upper })
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// Rows of `table` between the samples sitting on `lower` and `upper`,
    /// both included.
    ///
    /// Works for ascending and descending x; fails with `NoMatch` when no
    /// sample lies within [`RANGE_TOLERANCE`] of a bound.
    pub fn select(&self, table: &Table) -> Result<Table> {
        let top = bound_row(table, self.upper)?;
        let bottom = bound_row(table, self.lower)?;
        let selected = table.slice(top.min(bottom), top.max(bottom));
        log::debug!(
            "range [{}, {}] kept {} of {} rows",
            self.lower,
            self.upper,
            selected.row_count(),
            table.row_count()
        );
        Ok(selected)
    }
}

/// Restrict `table` to `[lower, upper]`.
pub fn select(table: &Table, lower: f64, upper: f64) -> Result<Table> {
    XRange::new(lower, upper)?.select(table)
}

fn has_one_decimal(v: f64) -> bool {
    let tenths = v * 10.0;
    (tenths - tenths.round()).abs() <= 1e-9 * tenths.abs().max(1.0)
}

/// Index of the row closest to `bound`, if it is within tolerance.
fn bound_row(table: &Table, bound: f64) -> Result<usize> {
    table
        .x()
        .enumerate()
        .map(|(i, x)| (i, (x - bound).abs()))
        .filter(|&(_, d)| d <= RANGE_TOLERANCE)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
        .ok_or(FitError::NoMatch {
            x: bound,
            tolerance: RANGE_TOLERANCE,
        })
}
