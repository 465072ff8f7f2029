//! Persisted per-channel settings.

pub mod store;

pub use store::{ChannelSettings, ChannelSettingsStore};
