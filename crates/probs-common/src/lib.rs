//! Shared types for the probability engine.
//!
//! This crate provides foundational types used across the workspace:
//! - The error taxonomy for specification, query and statistics failures
//! - Specification formats and their lexical conventions

pub mod error;
pub mod format;

pub use error::{Error, FileFormatError, QueryError, Result, StatsError};
pub use format::Format;
