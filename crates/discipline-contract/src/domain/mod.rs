//! # Domain Module
//!
//! Core domain types for the discipline contract: state records, the
//! commitment state machine, method selection and business rules.

pub mod entities;
pub mod errors;
pub mod invariants;
pub mod method;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use invariants::*;
pub use method::Method;
pub use value_objects::*;
