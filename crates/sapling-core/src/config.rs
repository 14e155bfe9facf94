//! Project configuration.
//!
//! A project is described by a JSON document (usually `sapling.json`):
//!
//! ```json
//! {
//!   "name": "web",
//!   "lint": { "enabled": true },
//!   "suppressions": { "prefix": "sapling-ignore", "requireExplanation": true },
//!   "reduce": { "noScopeCreation": false }
//! }
//! ```
//!
//! Every field is optional. A loaded [`ProjectConfig`] is wrapped in a
//! [`Project`], which also carries the identity integer that pass caches use
//! to tell configurations apart.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default comment prefix that introduces a suppression directive.
pub const DEFAULT_SUPPRESSION_PREFIX: &str = "sapling-ignore";

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while loading a project configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading the configuration file.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration parsed but is not usable.
    #[error("invalid configuration: {reason}")]
    Invalid { reason: String },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

// ============================================================================
// Configuration sections
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct LintConfig {
    pub enabled: bool,
}

impl Default for LintConfig {
    fn default() -> Self {
        LintConfig { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct SuppressionConfig {
    /// Comment prefix, e.g. `sapling-ignore`.
    pub prefix: String,
    /// Emit `suppressions/missingExplanation` when the `: reason` tail is absent.
    pub require_explanation: bool,
}

impl Default for SuppressionConfig {
    fn default() -> Self {
        SuppressionConfig {
            prefix: DEFAULT_SUPPRESSION_PREFIX.to_string(),
            require_explanation: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ReduceConfig {
    /// Skip scope evaluation while building paths.
    pub no_scope_creation: bool,
}

/// The deserialized contents of a project configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectConfig {
    pub name: String,
    pub lint: LintConfig,
    pub suppressions: SuppressionConfig,
    pub reduce: ReduceConfig,
}

impl ProjectConfig {
    /// Parse and validate a configuration from JSON text.
    pub fn from_json(text: &str) -> ConfigResult<Self> {
        let config: ProjectConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    fn validate(&self) -> ConfigResult<()> {
        let prefix = self.suppressions.prefix.trim();
        if prefix.is_empty() {
            return Err(ConfigError::Invalid {
                reason: "suppressions.prefix must not be empty".to_string(),
            });
        }
        if prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid {
                reason: format!("suppressions.prefix '{}' contains whitespace", prefix),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Project
// ============================================================================

static NEXT_PROJECT_ID: AtomicU64 = AtomicU64::new(0);

/// A loaded project configuration with a lazily assigned cache identity.
///
/// The identity is handed out the first time [`Project::cache_id`] is called,
/// from a process-wide counter. `Project` is deliberately not `Clone`: two
/// projects with equal configs are still distinct projects. Share it via `Arc`.
#[derive(Debug)]
pub struct Project {
    config: ProjectConfig,
    cache_id: OnceLock<u64>,
}

impl Project {
    pub fn new(config: ProjectConfig) -> Self {
        Project {
            config,
            cache_id: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Identity integer of this project, assigned on first use.
    pub fn cache_id(&self) -> u64 {
        *self
            .cache_id
            .get_or_init(|| NEXT_PROJECT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for Project {
    fn default() -> Self {
        Project::new(ProjectConfig::default())
    }
}

// ============================================================================
// Tests
// ============================================================================
