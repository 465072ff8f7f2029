//! Shared bot state: AI toggles, per-channel policy, provider selection.

use crate::ChannelId;
use crate::error::SettingsError;
use crate::llm::LlmManager;
use crate::settings::{ChannelSettings, ChannelSettingsStore};

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory response policy.
///
/// Channel overrides live for the process only, while respond-to-all flags
/// are mirrored to the settings file by [`BotState`].
#[derive(Debug, Clone)]
pub struct ChannelPolicy {
    global_ai_enabled: bool,
    channel_overrides: HashMap<ChannelId, bool>,
    channel_settings: HashMap<ChannelId, ChannelSettings>,
}

impl Default for ChannelPolicy {
    fn default() -> Self {
        Self::new(HashMap::new())
    }
}

impl ChannelPolicy {
    /// AI starts enabled globally with no overrides.
    pub fn new(channel_settings: HashMap<ChannelId, ChannelSettings>) -> Self {
        Self {
            global_ai_enabled: true,
            channel_overrides: HashMap::new(),
            channel_settings,
        }
    }

    /// The channel override when present, else the global flag.
    pub fn is_ai_enabled_for(&self, channel_id: &str) -> bool {
        self.channel_overrides
            .get(channel_id)
            .copied()
            .unwrap_or(self.global_ai_enabled)
    }

    pub fn should_respond_to_all(&self, channel_id: &str) -> bool {
        self.channel_settings
            .get(channel_id)
            .map(|settings| settings.respond_to_all)
            .unwrap_or(false)
    }

    pub fn global_ai_enabled(&self) -> bool {
        self.global_ai_enabled
    }

    pub fn channel_override(&self, channel_id: &str) -> Option<bool> {
        self.channel_overrides.get(channel_id).copied()
    }

    pub fn set_global_ai(&mut self, enabled: bool) {
        self.global_ai_enabled = enabled;
    }

    pub fn set_channel_override(&mut self, channel_id: ChannelId, enabled: bool) {
        self.channel_overrides.insert(channel_id, enabled);
    }

    pub fn set_respond_to_all(&mut self, channel_id: ChannelId, respond_to_all: bool) {
        self.channel_settings
            .insert(channel_id, ChannelSettings { respond_to_all });
    }

    pub fn channel_settings(&self) -> &HashMap<ChannelId, ChannelSettings> {
        &self.channel_settings
    }
}

/// Everything commands and the responder read or mutate, passed by reference
/// instead of living in globals.
///
/// Each accessor takes the policy lock briefly. Two commands toggling the same
/// flag concurrently race with last-writer-wins semantics.
pub struct BotState {
    policy: RwLock<ChannelPolicy>,
    settings_store: ChannelSettingsStore,
    llm: Arc<LlmManager>,
    started_at: chrono::DateTime<chrono::Utc>,
}

impl BotState {
    /// Build state, loading persisted respond-to-all settings once.
    pub async fn load(settings_store: ChannelSettingsStore, llm: Arc<LlmManager>) -> Self {
        let channel_settings = settings_store.load().await;
        tracing::info!(
            channels = channel_settings.len(),
            path = %settings_store.path().display(),
            "channel settings loaded"
        );
        Self {
            policy: RwLock::new(ChannelPolicy::new(channel_settings)),
            settings_store,
            llm,
            started_at: chrono::Utc::now(),
        }
    }

    pub fn llm(&self) -> &Arc<LlmManager> {
        &self.llm
    }

    pub fn started_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.started_at
    }

    pub async fn is_ai_enabled_for(&self, channel_id: &str) -> bool {
        self.policy.read().await.is_ai_enabled_for(channel_id)
    }

    pub async fn should_respond_to_all(&self, channel_id: &str) -> bool {
        self.policy.read().await.should_respond_to_all(channel_id)
    }

    pub async fn global_ai_enabled(&self) -> bool {
        self.policy.read().await.global_ai_enabled()
    }

    pub async fn channel_override(&self, channel_id: &str) -> Option<bool> {
        self.policy.read().await.channel_override(channel_id)
    }

    pub async fn set_global_ai(&self, enabled: bool) {
        self.policy.write().await.set_global_ai(enabled);
        tracing::info!(enabled, "global AI toggled");
    }

    pub async fn set_channel_override(&self, channel_id: ChannelId, enabled: bool) {
        tracing::info!(%channel_id, enabled, "channel AI override set");
        self.policy
            .write()
            .await
            .set_channel_override(channel_id, enabled);
    }

    /// Set respond-to-all for a channel and persist all settings. The file is
    /// rewritten on every call, even when the value did not change.
    ///
    /// The policy write guard is held until the file is written, so saves
    /// land in the same order as the changes they snapshot.
    pub async fn set_respond_to_all(
        &self,
        channel_id: ChannelId,
        respond_to_all: bool,
    ) -> Result<(), SettingsError> {
        let mut policy = self.policy.write().await;
        policy.set_respond_to_all(channel_id.clone(), respond_to_all);
        tracing::info!(%channel_id, respond_to_all, "respond-to-all set");
        self.settings_store.save(policy.channel_settings()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_llm_manager;

    #[test]
    fn override_takes_precedence_over_global() {
        let mut policy = ChannelPolicy::default();
        assert!(policy.is_ai_enabled_for("a"));

        policy.set_global_ai(false);
        assert!(!policy.is_ai_enabled_for("a"));

        policy.set_channel_override("a".into(), true);
        assert!(policy.is_ai_enabled_for("a"));
        assert!(!policy.is_ai_enabled_for("b"));

        policy.set_global_ai(true);
        policy.set_channel_override("b".into(), false);
        assert!(policy.is_ai_enabled_for("a"));
        assert!(!policy.is_ai_enabled_for("b"));
        assert!(policy.is_ai_enabled_for("c"));
    }

    #[test]
    fn override_holds_across_interleaved_toggles() {
        let mut policy = ChannelPolicy::default();
        let toggles = [true, false, false, true, true, false];
        for (i, value) in toggles.iter().enumerate() {
            if i % 2 == 0 {
                policy.set_global_ai(*value);
            } else {
                policy.set_channel_override("x".into(), *value);
            }
            let expected = policy
                .channel_override("x")
                .unwrap_or(policy.global_ai_enabled());
            assert_eq!(policy.is_ai_enabled_for("x"), expected);
            assert_eq!(policy.is_ai_enabled_for("y"), policy.global_ai_enabled());
        }
    }

    #[test]
    fn respond_to_all_defaults_to_false() {
        let policy = ChannelPolicy::default();
        assert!(!policy.should_respond_to_all("unknown"));
    }

    #[tokio::test]
    async fn respond_to_all_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("channel.json");
        let llm = Arc::new(test_llm_manager(Vec::new()));

        let state = BotState::load(ChannelSettingsStore::new(&path), llm.clone()).await;
        state.set_respond_to_all("on-channel".into(), true).await.unwrap();
        state.set_respond_to_all("off-channel".into(), true).await.unwrap();
        state.set_respond_to_all("off-channel".into(), false).await.unwrap();

        let reloaded = BotState::load(ChannelSettingsStore::new(&path), llm).await;
        assert!(reloaded.should_respond_to_all("on-channel").await);
        assert!(!reloaded.should_respond_to_all("off-channel").await);
        assert!(!reloaded.should_respond_to_all("never-set").await);
    }

    #[tokio::test]
    async fn unchanged_respond_to_all_still_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("channel.json");
        let state = BotState::load(
            ChannelSettingsStore::new(&path),
            Arc::new(test_llm_manager(Vec::new())),
        )
        .await;

        state.set_respond_to_all("c".into(), false).await.unwrap();
        assert!(path.exists());
        std::fs::remove_file(&path).unwrap();

        state.set_respond_to_all("c".into(), false).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_saves_keep_every_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("channel.json");
        let llm = Arc::new(test_llm_manager(Vec::new()));
        let state = Arc::new(BotState::load(ChannelSettingsStore::new(&path), llm.clone()).await);

        let handles: Vec<_> = (0..16)
            .map(|index| {
                let state = state.clone();
                tokio::spawn(async move {
                    state
                        .set_respond_to_all(format!("channel-{index}").into(), true)
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let reloaded = BotState::load(ChannelSettingsStore::new(&path), llm).await;
        for index in 0..16 {
            assert!(
                reloaded
                    .should_respond_to_all(&format!("channel-{index}"))
                    .await,
                "channel-{index} missing from saved settings"
            );
        }
    }

    /// Channel overrides are process-local: a reload forgets them while
    /// respond-to-all survives. This mirrors current behavior and may be
    /// revisited.
    #[tokio::test]
    async fn channel_override_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("channel.json");
        let llm = Arc::new(test_llm_manager(Vec::new()));

        let state = BotState::load(ChannelSettingsStore::new(&path), llm.clone()).await;
        state.set_channel_override("c".into(), false).await;
        state.set_respond_to_all("c".into(), true).await.unwrap();
        assert!(!state.is_ai_enabled_for("c").await);

        let reloaded = BotState::load(ChannelSettingsStore::new(&path), llm).await;
        assert_eq!(reloaded.channel_override("c").await, None);
        assert!(reloaded.is_ai_enabled_for("c").await);
        assert!(reloaded.should_respond_to_all("c").await);
    }
}
