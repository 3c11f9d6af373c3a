//! Analysis modules.
//!
//! The two folds behind the viewer data: merging per-type records into
//! articles, and separating shared from type-specific instructions.

pub mod aggregator;
pub mod instructions;

pub use aggregator::*;
pub use instructions::*;
