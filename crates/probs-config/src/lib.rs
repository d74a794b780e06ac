//! Engine configuration loading and validation.
//!
//! This crate provides:
//! - Typed structs for the engine config file
//! - Config resolution (explicit path → env → user config dir → defaults)
//! - Semantic validation

pub mod engine;
pub mod resolve;
pub mod validate;

pub use engine::{EngineConfig, Tolerances};
pub use resolve::{resolve_config, ConfigPaths, ConfigSource, ResolvedConfig};
pub use validate::{FieldError, ValidationError, ValidationResult};
