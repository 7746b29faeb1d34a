//! Unified validation framework for engine payloads.
//!
//! Reusable validation rules applied at the boundary, before any read.

pub mod rules;

pub use validator::Validate;
