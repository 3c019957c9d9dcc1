use serde::Serialize;

use super::error::{FitError, Result};
use super::matcher::MatchOptions;
use super::residual::residual_with;
use super::schedule::{Axis, FitConfig, Pass};
use crate::data::model::{Spectrum, Table};
use crate::data::range::XRange;

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

/// Position and Rf after one pass of the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PassRecord {
    pub round: usize,
    pub axis: Axis,
    pub step: f64,
    pub shift: f64,
    pub scale: f64,
    pub residual: f64,
}

/// Result of [`Aligner::optimise`]: the fitted copy of the expected
/// spectrum plus the parameters that produced it.
#[derive(Debug, Clone)]
pub struct FitOutcome {
    pub spectrum: Spectrum,
    pub shift: f64,
    pub scale: f64,
    /// Rf (percent) of the fitted spectrum against the observed window.
    pub residual: f64,
    /// Number of residual evaluations the search spent.
    pub evaluations: usize,
    pub trace: Vec<PassRecord>,
}

/// Serializable summary of a [`FitOutcome`].
#[derive(Debug, Clone, Serialize)]
pub struct FitReport {
    pub shift: f64,
    pub scale: f64,
    pub residual: f64,
    pub evaluations: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<XRange>,
    pub trace: Vec<PassRecord>,
}

impl FitOutcome {
    pub fn report(&self, range: Option<XRange>) -> FitReport {
        FitReport {
            shift: self.shift,
            scale: self.scale,
            residual: self.residual,
            evaluations: self.evaluations,
            range,
            trace: self.trace.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Aligner
// ---------------------------------------------------------------------------

/// Fits shift and scale of an expected spectrum to an observed one by
/// alternating coordinate descent over a fixed coarse-to-fine schedule.
#[derive(Debug, Clone, Default)]
pub struct Aligner {
    config: FitConfig,
}

impl Aligner {
    pub fn new(config: FitConfig) -> Result<Self> {
        config.schedule.validate()?;
        if config.max_steps == 0 {
            return Err(FitError::InvalidSchedule("max_steps must be at least 1".into()));
        }
        Ok(Aligner { config })
    }

    pub fn config(&self) -> &FitConfig {
        &self.config
    }

    /// Find the shift and scale of `expected` that minimise Rf against
    /// `observed`, optionally restricted to `range`.
    ///
    /// Neither input is modified; the fitted spectrum is returned in the
    /// outcome.
    pub fn optimise(
        &self,
        expected: &Spectrum,
        observed: &Spectrum,
        range: Option<&XRange>,
    ) -> Result<FitOutcome> {
        let window = match range {
            Some(range) => range.select(observed.current_table())?,
            None => observed.current_table().clone(),
        };

        let schedule = &self.config.schedule;
        let mut search = Search::new(expected.clone(), &window, &self.config);
        let mut trace = Vec::with_capacity(schedule.rounds * schedule.passes.len());
        let mut rf = f64::NAN;

        for round in 1..=schedule.rounds {
            for pass in &schedule.passes {
                rf = search.line_search(pass.axis, pass.step)?;
                log::debug!(
                    "round {round} {} step {}: shift {:.4}, scale {:.4}, Rf {rf:.4}%",
                    pass.axis,
                    pass.step,
                    search.shift,
                    search.scale
                );
                trace.push(PassRecord {
                    round,
                    axis: pass.axis,
                    step: pass.step,
                    shift: search.shift,
                    scale: search.scale,
                    residual: rf,
                });
            }
        }

        log::info!(
            "fit finished: shift {:.4}, scale {:.4}, Rf {rf:.4}% after {} evaluations",
            search.shift,
            search.scale,
            search.evaluations
        );

        Ok(FitOutcome {
            shift: search.shift,
            scale: search.scale,
            residual: rf,
            evaluations: search.evaluations,
            spectrum: search.spectrum,
            trace,
        })
    }

    /// One shift line search at `step`, applied to `expected` in place.
    /// Returns the Rf at the new position.
    pub fn optimise_shift(&self, expected: &mut Spectrum, observed: &Table, step: f64) -> Result<f64> {
        self.single_pass(expected, observed, Pass::shift(step))
    }

    /// One scale line search at `step`, applied to `expected` in place.
    /// The scale never drops to zero or below.
    pub fn optimise_scale(&self, expected: &mut Spectrum, observed: &Table, step: f64) -> Result<f64> {
        self.single_pass(expected, observed, Pass::scale(step))
    }

    fn single_pass(&self, expected: &mut Spectrum, observed: &Table, pass: Pass) -> Result<f64> {
        if !(pass.step.is_finite() && pass.step > 0.0) {
            return Err(FitError::InvalidSchedule(format!(
                "{} step {} must be positive",
                pass.axis, pass.step
            )));
        }
        let mut search = Search::new(expected.clone(), observed, &self.config);
        let rf = search.line_search(pass.axis, pass.step)?;
        *expected = search.spectrum;
        Ok(rf)
    }
}

// ---------------------------------------------------------------------------
// Search state
// ---------------------------------------------------------------------------

struct Search<'a> {
    spectrum: Spectrum,
    observed: &'a Table,
    matching: MatchOptions,
    max_steps: usize,
    shift: f64,
    scale: f64,
    evaluations: usize,
}

impl<'a> Search<'a> {
    fn new(mut spectrum: Spectrum, observed: &'a Table, config: &FitConfig) -> Self {
        let shift = spectrum.induced_shift();
        let scale = match spectrum.induced_scale() {
            s if s.is_finite() && s > 0.0 => s,
            s => {
                log::warn!("induced scale {s} is unusable, starting the search from 1");
                spectrum.scale_intensity(1.0);
                1.0
            }
        };
        Search {
            spectrum,
            observed,
            matching: config.matching,
            max_steps: config.max_steps,
            shift,
            scale,
            evaluations: 0,
        }
    }

    fn position(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Shift => self.shift,
            Axis::Scale => self.scale,
        }
    }

    fn place(&mut self, axis: Axis, value: f64) {
        match axis {
            Axis::Shift => {
                self.shift = value;
                self.spectrum.shift_to(value);
            }
            Axis::Scale => {
                self.scale = value;
                self.spectrum.scale_intensity(value);
            }
        }
    }

    fn evaluate(&mut self) -> Result<f64> {
        self.evaluations += 1;
        residual_with(self.spectrum.current_table(), self.observed, None, self.matching)
    }

    /// Try `+step`, then `-step`; walk whichever direction improves Rf
    /// for as long as it strictly improves, and settle on the best position.
    fn line_search(&mut self, axis: Axis, step: f64) -> Result<f64> {
        let start = self.position(axis);
        self.place(axis, start);
        let mut best = (start, self.evaluate()?);

        for direction in [1.0, -1.0] {
            if self.walk(axis, step * direction, &mut best)? {
                break;
            }
        }

        self.place(axis, best.0);
        Ok(best.1)
    }

    /// Step by `delta` from `best` while each step beats it. Returns whether
    /// any step was accepted.
    fn walk(&mut self, axis: Axis, delta: f64, best: &mut (f64, f64)) -> Result<bool> {
        let mut moved = false;
        for _ in 0..self.max_steps {
            let candidate = best.0 + delta;
            if axis == Axis::Scale && candidate <= 0.0 {
                return Ok(moved);
            }
            self.place(axis, candidate);
            let rf = self.evaluate()?;
            if rf < best.1 {
                *best = (candidate, rf);
                moved = true;
            } else {
                return Ok(moved);
            }
        }
        log::warn!(
            "{axis} search at step {} hit the {} step limit at {:.4}",
            delta.abs(),
            self.max_steps,
            best.0
        );
        Ok(moved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::residual::residual;
    use crate::fit::schedule::Schedule;

    fn spectrum(rows: &[[f64; 2]]) -> Spectrum {
        Spectrum::new(Table::new(rows.iter().map(|r| r.to_vec()).collect()).unwrap())
    }

    fn triangle() -> Spectrum {
        spectrum(&[[0.0, 10.0], [1.0, 20.0], [2.0, 10.0]])
    }

    #[test]
    fn recovers_shift_and_scale() {
        let expected = triangle();
        let observed = spectrum(&[[1.0, 500.0], [2.0, 1000.0], [3.0, 500.0]]);

        let outcome = Aligner::default().optimise(&expected, &observed, None).unwrap();

        assert!((outcome.shift - 1.0).abs() < 0.01);
        assert!((outcome.scale - 50.0).abs() < 0.01);
        assert!(outcome.residual < 1.0);
        assert!((outcome.spectrum.induced_shift() - 1.0).abs() < 0.01);
        assert!((outcome.spectrum.induced_scale() - 50.0).abs() < 0.01);
        let rf = residual(outcome.spectrum.current_table(), observed.current_table(), None).unwrap();
        assert!(rf < 1.0);
    }

    #[test]
    fn identical_spectra_stay_put() {
        let expected = triangle();
        let observed = triangle();
        let outcome = Aligner::default().optimise(&expected, &observed, None).unwrap();
        assert!(outcome.shift.abs() < 0.01);
        assert!((outcome.scale - 1.0).abs() < 0.01);
        assert!(outcome.residual.abs() < 1e-9);
    }

    #[test]
    fn inputs_are_left_untouched() {
        let expected = triangle();
        let observed = spectrum(&[[1.0, 500.0], [2.0, 1000.0], [3.0, 500.0]]);
        let before = expected.clone();
        Aligner::default().optimise(&expected, &observed, None).unwrap();
        assert_eq!(expected, before);
    }

    #[test]
    fn scale_descends_without_crossing_zero() {
        let expected = triangle();
        let observed = spectrum(&[[0.0, 5.0], [1.0, 10.0], [2.0, 5.0]]);
        let outcome = Aligner::default().optimise(&expected, &observed, None).unwrap();
        assert!((outcome.scale - 0.5).abs() < 0.01);
        assert!(outcome.trace.iter().all(|p| p.scale > 0.0));
    }

    #[test]
    fn trace_has_one_record_per_pass() {
        let outcome = Aligner::default()
            .optimise(&triangle(), &triangle(), None)
            .unwrap();
        let schedule = Schedule::default();
        assert_eq!(outcome.trace.len(), schedule.rounds * schedule.passes.len());
        assert_eq!(outcome.trace[0].round, 1);
        assert_eq!(outcome.trace.last().map(|p| p.round), Some(3));
    }

    #[test]
    fn flat_residual_leaves_shift_unchanged() {
        let mut expected = spectrum(&[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]]);
        let observed = spectrum(&[[0.0, 1.0], [1.0, 1.0], [2.0, 1.0]]);
        let rf = Aligner::default()
            .optimise_shift(&mut expected, observed.current_table(), 1.0)
            .unwrap();
        assert_eq!(rf, 100.0);
        assert_eq!(expected.induced_shift(), 0.0);
    }

    #[test]
    fn unusable_scale_resets_intensities() {
        let mut expected = spectrum(&[[0.0, 0.0], [1.0, 2.0], [2.0, 4.0]]);
        expected.scale_intensity(2.0);
        assert!(expected.induced_scale().is_nan());
        let observed = expected.baseline_table().clone();

        let rf = Aligner::default()
            .optimise_shift(&mut expected, &observed, 1.0)
            .unwrap();
        assert_eq!(rf, 0.0);
        assert_eq!(expected.current_table(), expected.baseline_table());
    }

    #[test]
    fn nan_observed_intensity_fails_the_fit() {
        let expected = spectrum(&[[0.0, 10.0], [1.0, 20.0], [2.0, 10.0]]);
        let mut table = Table::new(vec![vec![1.0, 500.0], vec![2.0, 0.0], vec![3.0, 500.0]]).unwrap();
        table.rows_mut()[1][1] = f64::NAN;
        let observed = Spectrum::new(table);

        let err = Aligner::default()
            .optimise(&expected, &observed, None)
            .unwrap_err();
        assert!(matches!(err, FitError::NonFinite { .. }), "{err}");
    }

    #[test]
    fn single_passes_mutate_in_place() {
        let aligner = Aligner::default();
        let mut expected = triangle();
        let observed = spectrum(&[[1.0, 500.0], [2.0, 1000.0], [3.0, 500.0]]);

        aligner
            .optimise_shift(&mut expected, observed.current_table(), 1.0)
            .unwrap();
        assert_eq!(expected.induced_shift(), 1.0);

        let rf = aligner
            .optimise_scale(&mut expected, observed.current_table(), 10.0)
            .unwrap();
        assert_eq!(expected.induced_scale(), 51.0);
        assert!((rf - 2.0).abs() < 1e-9);

        assert!(matches!(
            aligner.optimise_scale(&mut expected, observed.current_table(), -1.0),
            Err(FitError::InvalidSchedule(_))
        ));
    }

    #[test]
    fn step_limit_stops_the_walk() {
        let config = FitConfig {
            schedule: Schedule {
                rounds: 1,
                passes: vec![Pass::scale(10.0)],
            },
            max_steps: 2,
            ..FitConfig::default()
        };
        let expected = triangle();
        let observed = spectrum(&[[0.0, 500.0], [1.0, 1000.0], [2.0, 500.0]]);
        let outcome = Aligner::new(config)
            .unwrap()
            .optimise(&expected, &observed, None)
            .unwrap();
        assert_eq!(outcome.scale, 21.0);
        assert_eq!(outcome.evaluations, 3);
    }

    #[test]
    fn range_errors_surface() {
        let range = XRange::new(0.0, 9.0).unwrap();
        let err = Aligner::default()
            .optimise(&triangle(), &triangle(), Some(&range))
            .unwrap_err();
        assert!(matches!(err, FitError::NoMatch { x, .. } if x == 9.0));
    }

    #[test]
    fn strict_matching_aborts_when_samples_leave_the_domain() {
        let config = FitConfig {
            matching: MatchOptions::default(),
            ..FitConfig::default()
        };
        let observed = spectrum(&[[1.0, 500.0], [2.0, 1000.0], [3.0, 500.0]]);
        assert!(matches!(
            Aligner::new(config).unwrap().optimise(&triangle(), &observed, None),
            Err(FitError::NoMatch { .. })
        ));
    }
}
