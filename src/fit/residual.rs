use super::error::{FitError, Result};
use super::matcher::{match_rows_with, MatchOptions};
use crate::data::model::Table;
use crate::data::range::XRange;

/// Rf of `expected` against `observed`, in percent, with strict matching.
///
/// When `range` is given, `observed` is first restricted to it.
pub fn residual(expected: &Table, observed: &Table, range: Option<&XRange>) -> Result<f64> {
    residual_with(expected, observed, range, MatchOptions::default())
}

/// Rf with explicit matching options.
///
/// `Rf = 100 · Σ | |o| − |e| | / Σ |o|` over the observed samples, where `e`
/// is the expected row matched to each observed x. Zero means a perfect fit.
pub fn residual_with(
    expected: &Table,
    observed: &Table,
    range: Option<&XRange>,
    options: MatchOptions,
) -> Result<f64> {
    match range {
        Some(range) => rf(expected, &range.select(observed)?, options),
        None => rf(expected, observed, options),
    }
}

fn rf(expected: &Table, observed: &Table, options: MatchOptions) -> Result<f64> {
    let reduced = match_rows_with(expected, observed, options)?;

    let (numerator, denominator) = observed
        .column(1)
        .zip(reduced.column(1))
        .fold((0.0, 0.0), |(num, den), (o, e)| {
            (num + (o.abs() - e.abs()).abs(), den + o.abs())
        });

    if !(numerator.is_finite() && denominator.is_finite()) {
        return Err(FitError::NonFinite {
            numerator,
            denominator,
        });
    }
    if denominator == 0.0 {
        return Err(FitError::DivideByZero);
    }
    Ok(100.0 * numerator / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[[f64; 2]]) -> Table {
        Table::new(rows.iter().map(|r| r.to_vec()).collect()).unwrap()
    }

    #[test]
    fn identical_tables_score_zero() {
        let t = table(&[[0.0, 10.0], [1.0, 20.0], [2.0, 10.0]]);
        assert_eq!(residual(&t, &t, None).unwrap(), 0.0);
    }

    #[test]
    fn scores_absolute_intensity_mismatch() {
        let expected = table(&[[0.0, 5.0], [1.0, -10.0], [2.0, 5.0]]);
        let observed = table(&[[0.0, 10.0], [1.0, 20.0], [2.0, 10.0]]);
        // |10-5| + |20-10| + |10-5| = 20 over 40
        let rf = residual(&expected, &observed, None).unwrap();
        assert!((rf - 50.0).abs() < 1e-12);
    }

    #[test]
    fn range_restricts_observed_samples() {
        let expected = table(&[[0.0, 1.0], [1.0, 2.0], [2.0, 3.0], [3.0, 100.0]]);
        let observed = table(&[[0.0, 1.0], [1.0, 2.0], [2.0, 3.0], [3.0, 4.0]]);
        let range = XRange::new(0.0, 2.0).unwrap();
        assert_eq!(residual(&expected, &observed, Some(&range)).unwrap(), 0.0);
        assert!(residual(&expected, &observed, None).unwrap() > 0.0);
    }

    #[test]
    fn zero_observed_intensity_is_an_error() {
        let expected = table(&[[0.0, 1.0], [1.0, 2.0]]);
        let observed = table(&[[0.0, 0.0], [1.0, 0.0]]);
        assert_eq!(
            residual(&expected, &observed, None),
            Err(FitError::DivideByZero)
        );
    }

    #[test]
    fn unmatched_samples_follow_options() {
        let expected = table(&[[0.0, 10.0], [1.0, 20.0], [2.0, 10.0]]);
        let observed = table(&[[1.0, 500.0], [2.0, 1000.0], [3.0, 500.0]]);
        assert!(matches!(
            residual(&expected, &observed, None),
            Err(FitError::NoMatch { .. })
        ));
        let rf = residual_with(&expected, &observed, None, MatchOptions::lenient()).unwrap();
        assert!((rf - 98.5).abs() < 1e-9);
    }

    #[test]
    fn nan_intensity_is_an_error() {
        let expected = table(&[[1.0, 10.0], [2.0, 20.0], [3.0, 10.0]]);
        let mut observed = table(&[[1.0, 500.0], [2.0, 0.0], [3.0, 500.0]]);
        observed.rows_mut()[1][1] = f64::NAN;
        assert!(matches!(
            residual(&expected, &observed, None),
            Err(FitError::NonFinite { .. })
        ));
    }

    #[test]
    fn overflowing_sums_are_an_error() {
        let expected = table(&[[0.0, 1.0], [1.0, 1.0]]);
        let observed = table(&[[0.0, f64::MAX], [1.0, f64::MAX]]);
        assert!(matches!(
            residual(&expected, &observed, None),
            Err(FitError::NonFinite { .. })
        ));
    }
}
