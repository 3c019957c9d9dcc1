use std::fmt;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use super::error::{FitError, Result};
use super::matcher::MatchOptions;

// ---------------------------------------------------------------------------
// Pass / Schedule – the step-size table driving the search
// ---------------------------------------------------------------------------

/// Parameter adjusted by a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Shift,
    Scale,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Shift => write!(f, "shift"),
            Axis::Scale => write!(f, "scale"),
        }
    }
}

/// One line search along `axis` at resolution `step`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pass {
    pub axis: Axis,
    pub step: f64,
}

impl Pass {
    pub fn shift(step: f64) -> Self {
        Pass {
            axis: Axis::Shift,
            step,
        }
    }

    pub fn scale(step: f64) -> Self {
        Pass {
            axis: Axis::Scale,
            step,
        }
    }
}

/// The coarse-to-fine pass sequence, repeated `rounds` times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub rounds: usize,
    pub passes: Vec<Pass>,
}

impl Default for Schedule {
    /// Three rounds of shift at 1, 0.1, 0.01 then scale at 10, 1, 0.1, 0.01.
    fn default() -> Self {
        let shifts = [1.0, 0.1, 0.01].map(Pass::shift);
        let scales = [10.0, 1.0, 0.1, 0.01].map(Pass::scale);
        Schedule {
            rounds: 3,
            passes: shifts.into_iter().chain(scales).collect(),
        }
    }
}

impl Schedule {
    pub fn validate(&self) -> Result<()> {
        if self.rounds == 0 {
            return Err(FitError::InvalidSchedule("rounds must be at least 1".into()));
        }
        if self.passes.is_empty() {
            return Err(FitError::InvalidSchedule("no passes".into()));
        }
        if let Some((i, pass)) = self
            .passes
            .iter()
            .enumerate()
            .find(|(_, p)| !(p.step.is_finite() && p.step > 0.0))
        {
            return Err(FitError::InvalidSchedule(format!(
                "pass {i} ({}) has step {}; steps must be positive",
                pass.axis, pass.step
            )));
        }
        Ok(())
    }

    /// Finest step used on `axis`, if any pass touches it.
    pub fn finest_step(&self, axis: Axis) -> Option<f64> {
        self.passes
            .iter()
            .filter(|p| p.axis == axis)
            .map(|p| p.step)
            .min_by(f64::total_cmp)
    }
}

// ---------------------------------------------------------------------------
// FitConfig – everything the aligner can be tuned with
// ---------------------------------------------------------------------------

/// Tuning for [`crate::fit::aligner::Aligner`]. Every field has a default,
/// so a config file only needs to name what it changes:
///
/// ```json
/// { "schedule": { "rounds": 2, "passes": [{ "axis": "shift", "step": 0.5 }] },
///   "max_steps": 500 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    pub schedule: Schedule,
    /// Matching used while searching.
    pub matching: MatchOptions,
    /// Upper bound on steps taken by a single line search.
    pub max_steps: usize,
}

impl Default for FitConfig {
    fn default() -> Self {
        FitConfig {
            schedule: Schedule::default(),
            matching: MatchOptions::lenient(),
            max_steps: 10_000,
        }
    }
}

impl FitConfig {
    pub fn from_json_str(text: &str) -> anyhow::Result<Self> {
        let config: FitConfig = serde_json::from_str(text).context("parsing fit config")?;
        config.schedule.validate()?;
        if config.max_steps == 0 {
            anyhow::bail!("max_steps must be at least 1");
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading fit config {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("in {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::matcher::Unmatched;

    #[test]
    fn default_schedule_is_coarse_to_fine() {
        let schedule = Schedule::default();
        assert_eq!(schedule.rounds, 3);
        let steps: Vec<(Axis, f64)> = schedule.passes.iter().map(|p| (p.axis, p.step)).collect();
        assert_eq!(
            steps,
            vec![
                (Axis::Shift, 1.0),
                (Axis::Shift, 0.1),
                (Axis::Shift, 0.01),
                (Axis::Scale, 10.0),
                (Axis::Scale, 1.0),
                (Axis::Scale, 0.1),
                (Axis::Scale, 0.01),
            ]
        );
        assert_eq!(schedule.finest_step(Axis::Scale), Some(0.01));
        assert!(schedule.validate().is_ok());
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config = FitConfig::from_json_str(r#"{ "max_steps": 50 }"#).unwrap();
        assert_eq!(config.max_steps, 50);
        assert_eq!(config.schedule, Schedule::default());
        assert_eq!(config.matching.unmatched, Unmatched::ZeroFill);
    }

    #[test]
    fn parses_custom_schedule() {
        let config = FitConfig::from_json_str(
            r#"{
                "schedule": {
                    "rounds": 1,
                    "passes": [
                        { "axis": "scale", "step": 100.0 },
                        { "axis": "shift", "step": 0.5 }
                    ]
                },
                "matching": { "unmatched": "reject", "duplicates": "reject" }
            }"#,
        )
        .unwrap();
        assert_eq!(config.schedule.passes[0], Pass::scale(100.0));
        assert_eq!(config.schedule.finest_step(Axis::Shift), Some(0.5));
        assert_eq!(config.matching.unmatched, Unmatched::Reject);
    }

    #[test]
    fn rejects_degenerate_schedules() {
        let zero_step = Schedule {
            rounds: 1,
            passes: vec![Pass::shift(0.0)],
        };
        assert!(matches!(
            zero_step.validate(),
            Err(FitError::InvalidSchedule(_))
        ));
        assert!(FitConfig::from_json_str(r#"{ "schedule": { "rounds": 0, "passes": [] } }"#).is_err());
        assert!(FitConfig::from_json_str(r#"{ "max_steps": 0 }"#).is_err());
    }
}
