//! Spectrum alignment: fits the energy shift and intensity scale that bring
//! a theoretical spectrum onto an observed one.
//!
//! ```text
//!  expected ──┐
//!             ├─► Aligner ──► residual ──► range + matcher
//!  observed ──┘      │
//!                    ▼
//!               FitOutcome (fitted spectrum, shift, scale, Rf)
//! ```

pub mod data;
pub mod fit;

pub use data::model::{Spectrum, Table};
pub use data::range::XRange;
pub use fit::aligner::{Aligner, FitOutcome};
pub use fit::error::FitError;
pub use fit::schedule::{FitConfig, Schedule};
