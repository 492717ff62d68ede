//! Configuration for the inspector.
//!
//! Provides centralized configuration for buffer loading and tree
//! construction with sensible defaults, loadable from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{InspectError, Result};
use crate::io::{IOLimits, DEFAULT_MAX_FILE_SIZE};

/// Master configuration for an inspection session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectorConfig {
    /// Buffer loading limits.
    pub io: IoConfig,
    /// Structure tree construction.
    pub build: BuildConfig,
    /// Format used when a caller does not name one.
    pub default_format: String,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            io: IoConfig::default(),
            build: BuildConfig::default(),
            default_format: crate::decode::formats::raw::RAW_FORMAT_ID.to_string(),
        }
    }
}

impl InspectorConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| InspectError::Config(e.to_string()))
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| InspectError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| InspectError::Config(e.to_string()))
    }
}

/// Buffer loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    /// Largest file that will be mapped (default: 256MB).
    pub max_file_size: u64,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl From<&IoConfig> for IOLimits {
    fn from(config: &IoConfig) -> Self {
        IOLimits {
            max_file_size: config.max_file_size,
        }
    }
}

/// How far a detected relative-offset artifact spreads among siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelativityPolicy {
    /// Only the offending child and its descendants lose their offsets.
    ChildOnly,
    /// The offending child, every later sibling, and all their descendants
    /// lose their offsets.
    FollowingSiblings,
}

/// Structure tree construction limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Maximum number of nodes in one tree (default: 1,000,000).
    pub max_nodes: usize,
    /// Maximum wall-clock time for one build (default: 60s).
    pub max_time_seconds: u64,
    /// Frames processed between cancellation and time checks (default: 1024).
    pub check_interval: usize,
    /// Sibling handling once relative offsets are detected.
    pub relativity: RelativityPolicy,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            max_nodes: 1_000_000,
            max_time_seconds: 60,
            check_interval: 1024,
            relativity: RelativityPolicy::FollowingSiblings,
        }
    }
}
