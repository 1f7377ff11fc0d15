//! CLI command implementations.

pub mod bulk;
pub mod diff;
pub mod seed;
