//! Configuration Management
//!
//! Handles persistent configuration storage for azdeploy.

use crate::azure::{auth, DEFAULT_ENDPOINT};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Location used when nothing else is configured
pub const DEFAULT_LOCATION: &str = "eastus";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Last used subscription id
    #[serde(default)]
    pub subscription_id: Option<String>,
    /// Default location for new resources
    #[serde(default)]
    pub location: Option<String>,
    /// Default resource group for new resources
    #[serde(default)]
    pub resource_group: Option<String>,
    /// ARM endpoint override (sovereign clouds, test servers)
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("azdeploy").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from a specific file; missing or malformed files yield defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;

        Ok(())
    }

    /// Get effective subscription (config > AZURE_SUBSCRIPTION_ID > Azure CLI default)
    pub fn effective_subscription(&self) -> Option<String> {
        self.subscription_id
            .clone()
            .or_else(auth::get_default_subscription)
    }

    /// Get effective location (config > default)
    pub fn effective_location(&self) -> String {
        self.location
            .clone()
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string())
    }

    /// Get effective ARM endpoint
    pub fn effective_endpoint(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
    }

    /// Remember subscription and location for the next run
    pub fn remember(&mut self, subscription_id: &str, location: &str) -> Result<()> {
        self.subscription_id = Some(subscription_id.to_string());
        self.location = Some(location.to_string());
        self.save()
    }
}
