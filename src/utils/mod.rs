//! # Utilities Module
//!
//! ## Role
//! Cross-cutting helpers that don't belong in domain-specific modules.
//!
//! ## Sub-modules
//! - `stats`: Mean/spread helpers and `statrs` distribution wrappers
//! - `threading`: Worker-count defaults and rayon pool configuration

pub mod stats;
pub mod threading;
