//! Common types shared between the diagnostics, AST and engine crates.
//!
//! This module contains the positional types that every other layer speaks,
//! avoiding circular dependencies between the AST and the diagnostics model.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ============================================================================
// Position Type
// ============================================================================

/// A point in a source file.
///
/// - `line`: 1-indexed line number
/// - `column`: 0-indexed column, UTF-8 bytes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (0-indexed).
    pub column: u32,
}

impl Position {
    /// Create a new position.
    pub fn new(line: u32, column: u32) -> Self {
        Position { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

// ============================================================================
// SourceLocation Type
// ============================================================================

/// A span of source text inside a named file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    /// File path (project-relative).
    pub path: String,
    /// Start of the span.
    pub start: Position,
    /// End of the span.
    pub end: Position,
}

impl SourceLocation {
    /// Create a new location.
    pub fn new(path: impl Into<String>, start: Position, end: Position) -> Self {
        SourceLocation {
            path: path.into(),
            start,
            end,
        }
    }

    /// Create a location spanning whole lines, columns set to zero.
    pub fn lines(path: impl Into<String>, start_line: u32, end_line: u32) -> Self {
        SourceLocation::new(
            path,
            Position::new(start_line, 0),
            Position::new(end_line, 0),
        )
    }

    /// Whether this location lies entirely inside `[start_line, end_line]`.
    pub fn within_lines(&self, start_line: u32, end_line: u32) -> bool {
        self.start.line >= start_line && self.end.line <= end_line
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.start)
    }
}

// ============================================================================
// SourceType
// ============================================================================

/// How the source was parsed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Script,
    #[default]
    Module,
}

// ============================================================================
// Integrity
// ============================================================================

/// Content stamp of the source a tree was parsed from.
///
/// Stored as the hex-encoded SHA-256 digest of the source text. Diagnostics
/// carry it so consumers can tell whether they still describe the file on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Integrity(String);

impl Integrity {
    /// Compute the integrity stamp of a source text.
    pub fn of_source(source: &str) -> Self {
        let digest = Sha256::digest(source.as_bytes());
        Integrity(hex::encode(digest))
    }

    /// The hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Integrity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sha256-{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
