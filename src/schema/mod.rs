//! Canonical field schema
//!
//! This module defines the fixed vocabulary of decoder field names and the
//! declarative mapping from a source's names onto that vocabulary.

mod field;
mod mapping;

pub use field::*;
pub use mapping::*;
