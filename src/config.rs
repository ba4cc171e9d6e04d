// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Build configuration: tolerances and limits

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file looked up by [`BuildConfig::load`]
pub const CONFIG_FILE: &str = "brushmesh.toml";

/// Tolerances and limits shared by the builder, partitioner and validator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Squared distance below which two outline points are the same point
    pub distance_epsilon: f64,
    /// Distance below which a partitioned vertex matches an original vertex
    pub equality_epsilon: f64,
    /// Absolute signed area below which an outline is degenerate
    pub area_epsilon: f64,
    /// Max distance of a polygon vertex from its plane
    pub planarity_epsilon: f64,
    /// Upper bound on self-touch splitting recursion
    pub max_partition_depth: usize,
    /// Number of built prisms kept by the kernel cache (0 disables it)
    pub cache_capacity: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            distance_epsilon: 0.0006,
            equality_epsilon: 0.0001,
            area_epsilon: 1e-12,
            planarity_epsilon: 1e-4,
            max_partition_depth: 256,
            cache_capacity: 128,
        }
    }
}

impl BuildConfig {
    /// Squared equality epsilon, used for vertex matching
    pub fn equality_epsilon_sqr(&self) -> f64 {
        self.equality_epsilon * self.equality_epsilon
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: BuildConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var("BRUSHMESH_DISTANCE_EPSILON") {
            self.distance_epsilon = value
                .parse()
                .with_context(|| format!("Invalid BRUSHMESH_DISTANCE_EPSILON: {}", value))?;
        }

        if let Ok(value) = std::env::var("BRUSHMESH_EQUALITY_EPSILON") {
            self.equality_epsilon = value
                .parse()
                .with_context(|| format!("Invalid BRUSHMESH_EQUALITY_EPSILON: {}", value))?;
        }

        if let Ok(value) = std::env::var("BRUSHMESH_MAX_PARTITION_DEPTH") {
            self.max_partition_depth = value
                .parse()
                .with_context(|| format!("Invalid BRUSHMESH_MAX_PARTITION_DEPTH: {}", value))?;
        }

        if let Ok(value) = std::env::var("BRUSHMESH_CACHE_CAPACITY") {
            self.cache_capacity = value
                .parse()
                .with_context(|| format!("Invalid BRUSHMESH_CACHE_CAPACITY: {}", value))?;
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BuildConfig::default();
        assert_eq!(config.max_partition_depth, 256);
        assert!((config.equality_epsilon_sqr() - 1e-8).abs() < 1e-20);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: BuildConfig = toml::from_str("max_partition_depth = 8\n").unwrap();
        assert_eq!(config.max_partition_depth, 8);
        assert_eq!(config.distance_epsilon, BuildConfig::default().distance_epsilon);
    }
}
