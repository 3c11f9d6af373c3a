//! Output artifacts and digests.

pub mod generator;

pub use generator::*;
