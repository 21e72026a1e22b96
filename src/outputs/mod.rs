//! File outputs.
//!
//! # Submodules
//!
//! - [`json`]: Writes the article table to a JSON file for backup or sharing
//!
//! The keyword report and podcast scripts are terminal output and live with
//! their pipelines.

pub mod json;
