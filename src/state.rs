use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use spectral_fit::data::loader::load_spectrum;
use spectral_fit::{Aligner, FitConfig, FitOutcome, Spectrum, XRange};

use crate::color::SeriesColors;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// A spectrum together with the file it came from.
pub struct LoadedSpectrum {
    pub spectrum: Spectrum,
    pub path: PathBuf,
}

impl LoadedSpectrum {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Theoretical spectrum to be shifted and scaled.
    pub expected: Option<LoadedSpectrum>,

    /// Measured spectrum the fit is scored against.
    pub observed: Option<LoadedSpectrum>,

    /// Search tuning (schedule, matching, step cap).
    pub config: FitConfig,

    /// Whether the fit is restricted to `[range_lower, range_upper]`.
    pub use_range: bool,
    pub range_lower: String,
    pub range_upper: String,

    /// Result of the last successful fit.
    pub outcome: Option<FitOutcome>,

    /// Colours of the plotted curves.
    pub colors: SeriesColors,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            expected: None,
            observed: None,
            config: FitConfig::default(),
            use_range: false,
            range_lower: String::new(),
            range_upper: String::new(),
            outcome: None,
            colors: SeriesColors::default(),
            status_message: None,
        }
    }
}

/// Which slot a loaded file goes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Expected,
    Observed,
}

impl AppState {
    /// Load `path` into the expected or observed slot. Any previous fit is
    /// dropped since it no longer describes the loaded data.
    pub fn load(&mut self, role: Role, path: &Path) -> Result<()> {
        let spectrum = load_spectrum(path)?;
        let loaded = LoadedSpectrum {
            spectrum,
            path: path.to_path_buf(),
        };
        match role {
            Role::Expected => self.expected = Some(loaded),
            Role::Observed => self.observed = Some(loaded),
        }
        self.outcome = None;
        self.status_message = None;
        Ok(())
    }

    pub fn can_fit(&self) -> bool {
        self.expected.is_some() && self.observed.is_some()
    }

    /// Parse the range fields, if the range is enabled.
    pub fn range(&self) -> Result<Option<XRange>> {
        if !self.use_range {
            return Ok(None);
        }
        let lower: f64 = self
            .range_lower
            .trim()
            .parse()
            .with_context(|| format!("lower bound '{}' is not a number", self.range_lower))?;
        let upper: f64 = self
            .range_upper
            .trim()
            .parse()
            .with_context(|| format!("upper bound '{}' is not a number", self.range_upper))?;
        Ok(Some(XRange::new(lower, upper)?))
    }

    /// Run the aligner on the loaded pair and keep the outcome.
    pub fn run_fit(&mut self) -> Result<()> {
        let (Some(expected), Some(observed)) = (&self.expected, &self.observed) else {
            anyhow::bail!("load both an expected and an observed spectrum first");
        };
        let range = self.range()?;
        let aligner = Aligner::new(self.config.clone())?;
        let outcome = aligner
            .optimise(&expected.spectrum, &observed.spectrum, range.as_ref())
            .context("fitting")?;
        self.outcome = Some(outcome);
        self.status_message = None;
        Ok(())
    }

    /// Replace the tuning; the current fit is kept until the next run.
    pub fn set_config(&mut self, config: FitConfig) {
        self.config = config;
    }

    /// Record a failure for the status bar.
    pub fn report_error(&mut self, e: &anyhow::Error) {
        log::error!("{e:#}");
        self.status_message = Some(format!("Error: {e:#}"));
    }
}
