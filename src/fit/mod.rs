/// Fitting layer: matching, residual metric and the shift/scale search.
///
/// Architecture:
/// ```text
///   observed ──► range (optional) ──┐
///                                   ▼
///   expected ──────────────────► matcher  reduce expected onto observed x
///                                   │
///                                   ▼
///                               residual  Rf = 100·Σ||o|-|e|| / Σ|o|
///                                   │
///                                   ▼
///                               aligner   coordinate descent on (shift, scale)
/// ```

pub mod aligner;
pub mod error;
pub mod matcher;
pub mod residual;
pub mod schedule;

pub use error::{FitError, Result};
