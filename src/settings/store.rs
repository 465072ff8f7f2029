//! Channel settings file (JSON).
//!
//! The file holds `{ "<channel id>": { "respondToAll": bool } }` and is
//! rewritten wholesale on every change.

use crate::ChannelId;
use crate::error::SettingsError;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Settings for one channel. Absent channels use the default.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelSettings {
    #[serde(rename = "respondToAll", default)]
    pub respond_to_all: bool,
}

/// Reads and writes the channel settings file.
#[derive(Debug)]
pub struct ChannelSettingsStore {
    path: PathBuf,
    /// Serializes writers so two saves never interleave on disk.
    write_lock: tokio::sync::Mutex<()>,
}

impl ChannelSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all channel settings. A missing file is an empty map; an unreadable
    /// or malformed file is logged and treated as empty.
    pub async fn load(&self) -> HashMap<ChannelId, ChannelSettings> {
        match self.try_load().await {
            Ok(settings) => settings,
            Err(error) => {
                tracing::warn!(%error, path = %self.path.display(), "ignoring channel settings file");
                HashMap::new()
            }
        }
    }

    async fn try_load(&self) -> Result<HashMap<ChannelId, ChannelSettings>, SettingsError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(HashMap::new());
            }
            Err(source) => {
                return Err(SettingsError::Read {
                    path: self.path.display().to_string(),
                    source,
                });
            }
        };

        let parsed: BTreeMap<String, ChannelSettings> = serde_json::from_str(&raw)?;
        Ok(parsed
            .into_iter()
            .map(|(channel_id, settings)| (ChannelId::from(channel_id), settings))
            .collect())
    }

    /// Overwrite the file with `settings`.
    pub async fn save(
        &self,
        settings: &HashMap<ChannelId, ChannelSettings>,
    ) -> Result<(), SettingsError> {
        let ordered: BTreeMap<&str, &ChannelSettings> = settings
            .iter()
            .map(|(channel_id, settings)| (channel_id.as_ref(), settings))
            .collect();
        let json = serde_json::to_string_pretty(&ordered)?;

        let write_error = |source| SettingsError::Write {
            path: self.path.display().to_string(),
            source,
        };

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
        }
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json).await.map_err(write_error)?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(write_error)?;

        tracing::debug!(path = %self.path.display(), channels = settings.len(), "channel settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ChannelSettingsStore::new(dir.path().join("channel.json"));
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_round_trips_file_format() {
        let dir = tempfile::tempdir().unwrap();
        let store = ChannelSettingsStore::new(dir.path().join("channel.json"));

        let mut settings = HashMap::new();
        settings.insert(ChannelId::from("123"), ChannelSettings { respond_to_all: true });
        settings.insert(ChannelId::from("456"), ChannelSettings { respond_to_all: false });
        store.save(&settings).await.unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["123"]["respondToAll"], serde_json::json!(true));
        assert_eq!(json["456"]["respondToAll"], serde_json::json!(false));

        assert_eq!(store.load().await, settings);
    }

    #[tokio::test]
    async fn malformed_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("channel.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = ChannelSettingsStore::new(path);
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn entries_without_flag_default_to_false() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("channel.json");
        std::fs::write(&path, r#"{"789": {}}"#).unwrap();

        let store = ChannelSettingsStore::new(path);
        let settings = store.load().await;
        assert_eq!(settings.get("789"), Some(&ChannelSettings::default()));
    }
}
