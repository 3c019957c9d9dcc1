use serde::{Deserialize, Serialize};

use super::error::{FitError, Result};
use crate::data::model::Table;

/// Absolute x tolerance for pairing a target sample with a reference row.
pub const MATCH_TOLERANCE: f64 = 1e-5;

/// What to do with a target x that has no reference row within tolerance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unmatched {
    /// Fail with [`FitError::NoMatch`].
    #[default]
    Reject,
    /// Emit the target x with zero intensities.
    ZeroFill,
}

/// What to do when several reference rows fall within tolerance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Duplicates {
    /// Take the row closest in x (the first one on ties).
    #[default]
    Nearest,
    /// Fail with [`FitError::AmbiguousMatch`].
    Reject,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchOptions {
    pub unmatched: Unmatched,
    pub duplicates: Duplicates,
}

impl MatchOptions {
    /// Options used while searching: samples shifted outside the reference
    /// domain count as zero signal instead of aborting the fit.
    pub fn lenient() -> Self {
        MatchOptions {
            unmatched: Unmatched::ZeroFill,
            duplicates: Duplicates::Nearest,
        }
    }
}

/// Reduce `reference` onto the x samples of `target` with the strict
/// defaults: a missing sample is an error, duplicates resolve to the nearest.
pub fn match_rows(reference: &Table, target: &Table) -> Result<Table> {
    match_rows_with(reference, target, MatchOptions::default())
}

/// Build a table with one row per `target` row: the `reference` row whose x
/// lies within [`MATCH_TOLERANCE`] of the target x.
///
/// The output has `target`'s row count and `reference`'s column count.
pub fn match_rows_with(reference: &Table, target: &Table, options: MatchOptions) -> Result<Table> {
    let width = reference.column_count();
    let mut reduced = Vec::with_capacity(target.row_count());

    for x in target.x() {
        let row = match find_row(reference, x, options.duplicates)? {
            Some(i) => reference.row(i).to_vec(),
            None => match options.unmatched {
                Unmatched::Reject => {
                    return Err(FitError::NoMatch {
                        x,
                        tolerance: MATCH_TOLERANCE,
                    })
                }
                Unmatched::ZeroFill => {
                    let mut row = vec![0.0; width];
                    row[0] = x;
                    row
                }
            },
        };
        reduced.push(row);
    }

    Table::new(reduced)
}

fn find_row(reference: &Table, x: f64, duplicates: Duplicates) -> Result<Option<usize>> {
    let mut best: Option<(usize, f64)> = None;
    let mut count = 0;

    for (i, rx) in reference.x().enumerate() {
        let d = (rx - x).abs();
        if !(d <= MATCH_TOLERANCE) {
            continue;
        }
        count += 1;
        if best.map_or(true, |(_, bd)| d < bd) {
            best = Some((i, d));
        }
    }

    if count > 1 && duplicates == Duplicates::Reject {
        return Err(FitError::AmbiguousMatch {
            x,
            count,
            tolerance: MATCH_TOLERANCE,
        });
    }
    Ok(best.map(|(i, _)| i))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fine_reference() -> Table {
        Table::new(
            (0..=40)
                .map(|i| {
                    let x = i as f64 * 0.05;
                    vec![x, x * 10.0]
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn picks_reference_rows_for_coarser_target() {
        let target = Table::new(vec![vec![0.5, 0.0], vec![1.0, 0.0], vec![1.5, 0.0]]).unwrap();
        let reduced = match_rows(&fine_reference(), &target).unwrap();
        assert_eq!(reduced.row_count(), 3);
        for (row, expected_x) in reduced.rows().iter().zip([0.5, 1.0, 1.5]) {
            assert!((row[0] - expected_x).abs() < MATCH_TOLERANCE);
            assert!((row[1] - expected_x * 10.0).abs() < 1e-9);
        }
    }

    #[test]
    fn output_takes_reference_width() {
        let reference = Table::new(vec![vec![0.0, 1.0, 2.0, 3.0], vec![1.0, 4.0, 5.0, 6.0]]).unwrap();
        let target = Table::new(vec![vec![1.0, 9.0]]).unwrap();
        let reduced = match_rows(&reference, &target).unwrap();
        assert_eq!(reduced.column_count(), 4);
        assert_eq!(reduced.row(0), &[1.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn missing_sample_is_rejected_by_default() {
        let target = Table::new(vec![vec![0.5, 0.0], vec![0.52, 0.0]]).unwrap();
        let err = match_rows(&fine_reference(), &target).unwrap_err();
        assert_eq!(
            err,
            FitError::NoMatch {
                x: 0.52,
                tolerance: MATCH_TOLERANCE
            }
        );
    }

    #[test]
    fn missing_sample_can_be_zero_filled() {
        let target = Table::new(vec![vec![0.5, 0.0], vec![7.0, 0.0]]).unwrap();
        let reduced = match_rows_with(&fine_reference(), &target, MatchOptions::lenient()).unwrap();
        assert_eq!(reduced.row(1), &[7.0, 0.0]);
    }

    #[test]
    fn duplicates_resolve_to_nearest_or_fail() {
        let reference = Table::new(vec![
            vec![1.0 - 4e-6, 1.0],
            vec![1.0 + 1e-6, 2.0],
            vec![1.0 + 8e-6, 3.0],
        ])
        .unwrap();
        let target = Table::new(vec![vec![1.0, 0.0]]).unwrap();

        let reduced = match_rows(&reference, &target).unwrap();
        assert_eq!(reduced.row(0)[1], 2.0);

        let strict = MatchOptions {
            duplicates: Duplicates::Reject,
            ..MatchOptions::default()
        };
        assert!(matches!(
            match_rows_with(&reference, &target, strict),
            Err(FitError::AmbiguousMatch { count: 3, .. })
        ));
    }

    #[test]
    fn nan_reference_x_never_matches() {
        let mut reference =
            Table::new(vec![vec![0.0, 999.0], vec![1.0, 20.0], vec![2.0, 10.0]]).unwrap();
        reference.rows_mut()[0][0] = f64::NAN;
        let target = Table::new(vec![vec![1.0, 0.0], vec![2.0, 0.0], vec![7.0, 0.0]]).unwrap();

        let reduced = match_rows_with(&reference, &target, MatchOptions::lenient()).unwrap();
        assert_eq!(reduced.row(0), &[1.0, 20.0]);
        assert_eq!(reduced.row(1), &[2.0, 10.0]);
        assert_eq!(reduced.row(2), &[7.0, 0.0]);

        assert_eq!(
            match_rows(&reference, &target).unwrap_err(),
            FitError::NoMatch {
                x: 7.0,
                tolerance: MATCH_TOLERANCE
            }
        );
    }
}
