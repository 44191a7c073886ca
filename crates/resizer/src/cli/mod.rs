//! CLI command implementations.

pub mod resize;
