//! Saved connection profiles (`connections.json`).
//!
//! Profiles hold everything needed to reconnect except the password, which
//! the login screen always asks for.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::config::DatabaseConfig;
use crate::error::Result;

/// One saved connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionProfile {
    pub host: String,
    pub port: String,
    pub database: String,
    pub user: String,
}

impl ConnectionProfile {
    /// Build and validate a database config from this profile and a password typed at login.
    pub fn to_database_config(&self, password: &str) -> Result<DatabaseConfig> {
        let port = self
            .port
            .trim()
            .parse()
            .map_err(|_| crate::AppError::validation(format!("Invalid port '{}'", self.port)))?;
        let config = DatabaseConfig {
            host: self.host.clone(),
            port,
            name: self.database.clone(),
            username: self.user.clone(),
            password: password.to_string(),
        };
        config.validate()?;
        Ok(config)
    }
}

impl From<&DatabaseConfig> for ConnectionProfile {
    fn from(db: &DatabaseConfig) -> Self {
        Self {
            host: db.host.clone(),
            port: db.port.to_string(),
            database: db.name.clone(),
            user: db.username.clone(),
        }
    }
}

/// Named connection profiles persisted as a JSON object.
#[derive(Debug, Clone, Default)]
pub struct ProfileStore {
    path: PathBuf,
    profiles: BTreeMap<String, ConnectionProfile>,
}

impl ProfileStore {
    /// Default store location next to the app config.
    pub fn default_path(config_dir: &Path) -> PathBuf {
        config_dir.join("connections.json")
    }

    /// Load the store; a missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        let profiles = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            profiles,
        })
    }

    /// Load the store, logging and falling back to empty on a corrupt file.
    pub fn load_or_empty(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Could not load saved connections: {}", e);
            Self {
                path: path.to_path_buf(),
                profiles: BTreeMap::new(),
            }
        })
    }

    /// Profile names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&ConnectionProfile> {
        self.profiles.get(name)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Insert or replace a profile and write the store to disk.
    pub fn save_profile(&mut self, name: impl Into<String>, profile: ConnectionProfile) -> Result<()> {
        self.profiles.insert(name.into(), profile);
        self.persist()
    }

    /// Save under a timestamped name unless an identical profile already exists.
    pub fn remember(&mut self, profile: ConnectionProfile) -> Result<String> {
        if let Some((name, _)) = self.profiles.iter().find(|(_, p)| **p == profile) {
            return Ok(name.clone());
        }
        let name = format!("Connection_{}", Local::now().format("%Y%m%d_%H%M%S"));
        self.save_profile(name.clone(), profile)?;
        Ok(name)
    }

    /// Remove a profile and write the store to disk.
    pub fn remove(&mut self, name: &str) -> Result<bool> {
        let removed = self.profiles.remove(name).is_some();
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.profiles)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ConnectionProfile {
        ConnectionProfile {
            host: "db.local".to_string(),
            port: "5433".to_string(),
            database: "streaming".to_string(),
            user: "admin".to_string(),
        }
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = ProfileStore::default_path(dir.path());

        let mut store = ProfileStore::load(&path).unwrap();
        assert!(store.is_empty());
        store.save_profile("Work", sample()).unwrap();

        let reloaded = ProfileStore::load(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get("Work"), Some(&sample()));
    }

    #[test]
    fn test_file_never_contains_password() {
        let dir = tempfile::tempdir().unwrap();
        let path = ProfileStore::default_path(dir.path());
        let mut store = ProfileStore::load(&path).unwrap();

        let mut db = DatabaseConfig::default();
        db.password = "hunter2".to_string();
        store.save_profile("Local", ConnectionProfile::from(&db)).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("hunter2"));
        assert!(raw.contains("\"database\": \"streaming_service\""));
    }

    #[test]
    fn test_remember_deduplicates() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ProfileStore::load(&ProfileStore::default_path(dir.path())).unwrap();
        store.save_profile("Existing", sample()).unwrap();

        let name = store.remember(sample()).unwrap();
        assert_eq!(name, "Existing");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_to_database_config_rejects_bad_port() {
        let mut profile = sample();
        profile.port = "abc".to_string();
        assert!(profile.to_database_config("pw").is_err());

        let mut nameless = sample();
        nameless.database.clear();
        assert!(matches!(
            nameless.to_database_config("pw"),
            Err(crate::AppError::Config(_))
        ));

        let db = sample().to_database_config("pw").unwrap();
        assert_eq!(db.port, 5433);
        assert_eq!(db.password, "pw");
    }

    #[test]
    fn test_corrupt_file_falls_back_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = ProfileStore::default_path(dir.path());
        std::fs::write(&path, "{ not json").unwrap();

        assert!(ProfileStore::load(&path).is_err());
        assert!(ProfileStore::load_or_empty(&path).is_empty());
    }
}
