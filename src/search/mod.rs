//! Search-side glue: candidate generation and the tuning run loop.

pub mod driver;
pub mod technique;

pub use driver::{TuneOpts, TuningOutcome, run_tuning};
pub use technique::SearchTechnique;
