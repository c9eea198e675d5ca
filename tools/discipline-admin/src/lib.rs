//! Discipline admin library: replay scripts and their runner.

#![warn(missing_docs)]

pub mod replay;
pub mod script;

pub use replay::{replay, ReplayError, ReplayOptions, ReplayReport, StepOutcome, StepReport};
pub use script::{Script, Step};
