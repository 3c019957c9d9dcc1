use thiserror::Error;

/// Domain errors raised by the matching, residual and alignment routines.
///
/// These are precondition failures: they abort the current `residual` or
/// `optimise` call and are handed back to the caller untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("invalid range [{lower}, {upper}]: {reason}")]
    InvalidRange {
        lower: f64,
        upper: f64,
        reason: &'static str,
    },

    #[error("no row with x = {x} within ±{tolerance}")]
    NoMatch { x: f64, tolerance: f64 },

    #[error("{count} rows match x = {x} within ±{tolerance}")]
    AmbiguousMatch {
        x: f64,
        count: usize,
        tolerance: f64,
    },

    #[error("residual is undefined: observed intensities sum to zero")]
    DivideByZero,

    #[error("residual is not finite: {numerator} / {denominator}")]
    NonFinite { numerator: f64, denominator: f64 },

    #[error("malformed table: {0}")]
    Shape(String),

    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),
}

pub type Result<T> = std::result::Result<T, FitError>;
