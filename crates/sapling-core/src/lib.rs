//! Core infrastructure for sapling.
//!
//! This crate provides language-agnostic infrastructure:
//! - Source positions, locations and integrity stamps
//! - The diagnostics model shared by every pass
//! - Project configuration

pub mod config;
pub mod diagnostics;
pub mod types;

pub use config::{ConfigError, Project, ProjectConfig};
pub use diagnostics::{Diagnostic, DiagnosticDescription, DiagnosticOrigin, Diagnostics};
pub use types::{Integrity, Position, SourceLocation, SourceType};
