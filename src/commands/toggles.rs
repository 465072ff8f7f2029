//! AI on/off toggles and respond-to-all.

use crate::commands::{Command, CommandContext, CommandOutcome};
use crate::error::Result;

fn parse_switch(value: Option<&str>) -> Option<bool> {
    match value {
        Some("on") => Some(true),
        Some("off") => Some(false),
        _ => None,
    }
}

/// `ai on|off`: global AI flag.
pub struct AiCommand;

#[async_trait::async_trait]
impl Command for AiCommand {
    fn name(&self) -> &'static str {
        "ai"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<CommandOutcome> {
        let enabled = parse_switch(ctx.arg(0)).ok_or_else(|| ctx.usage("ai on/off"))?;
        let confirmation = if enabled {
            "AI responses enabled globally."
        } else {
            "AI responses disabled globally."
        };
        ctx.confirm(confirmation).await;
        Ok(CommandOutcome::SetGlobalAi(enabled))
    }
}

/// `channel on|off`: AI override for the current channel.
pub struct ChannelCommand;

#[async_trait::async_trait]
impl Command for ChannelCommand {
    fn name(&self) -> &'static str {
        "channel"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<CommandOutcome> {
        let enabled = parse_switch(ctx.arg(0)).ok_or_else(|| ctx.usage("channel on/off"))?;
        let confirmation = if enabled {
            "AI responses enabled in this channel."
        } else {
            "AI responses disabled in this channel."
        };
        ctx.confirm(confirmation).await;
        Ok(CommandOutcome::SetChannelOverride {
            channel_id: ctx.message.channel_id.clone(),
            value: enabled,
        })
    }
}

/// `respondtoall on|off`: persisted per-channel reply mode.
pub struct RespondToAllCommand;

#[async_trait::async_trait]
impl Command for RespondToAllCommand {
    fn name(&self) -> &'static str {
        "respondtoall"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<CommandOutcome> {
        let respond_to_all =
            parse_switch(ctx.arg(0)).ok_or_else(|| ctx.usage("respondtoall on/off"))?;

        // The in-memory flag is already set when the write fails; the next
        // successful write persists it.
        if let Err(error) = ctx
            .state
            .set_respond_to_all(ctx.message.channel_id.clone(), respond_to_all)
            .await
        {
            tracing::warn!(%error, channel_id = %ctx.message.channel_id, "failed to persist channel settings");
        }

        let confirmation = if respond_to_all {
            "Responding to all messages in this channel."
        } else {
            "Responding only to mentions or replies in this channel."
        };
        ctx.confirm(confirmation).await;
        Ok(CommandOutcome::NoChange)
    }
}

#[cfg(test)]
mod tests {
    use crate::commands::Dispatch;
    use crate::testing::{CHANNEL_ID, CommandHarness, OWNER_ID, inbound_from};

    #[tokio::test]
    async fn owner_ai_off_disables_globally_and_confirms() {
        let harness = CommandHarness::new().await;
        let dispatch = harness.run(inbound_from(OWNER_ID, "!ai off")).await;

        assert_eq!(dispatch, Dispatch::Completed);
        assert!(!harness.state.global_ai_enabled().await);
        assert_eq!(
            harness.messaging.sent(),
            vec![(CHANNEL_ID.to_string(), "AI responses disabled globally.".to_string())]
        );
    }

    #[tokio::test]
    async fn bad_toggle_argument_keeps_current_value() {
        let harness = CommandHarness::new().await;
        harness.state.set_global_ai(false).await;

        let dispatch = harness.run(inbound_from(OWNER_ID, "!ai maybe")).await;

        assert_eq!(dispatch, Dispatch::Rejected);
        assert!(!harness.state.global_ai_enabled().await);
        assert_eq!(harness.messaging.sent()[0].1, "Usage: !ai on/off");
    }

    #[tokio::test]
    async fn channel_toggle_sets_override_for_that_channel_only() {
        let harness = CommandHarness::new().await;
        harness.run(inbound_from(OWNER_ID, "!channel off")).await;

        assert_eq!(harness.state.channel_override(CHANNEL_ID).await, Some(false));
        assert!(!harness.state.is_ai_enabled_for(CHANNEL_ID).await);
        assert!(harness.state.is_ai_enabled_for("elsewhere").await);
        assert!(harness.state.global_ai_enabled().await);
        assert_eq!(
            harness.messaging.sent()[0].1,
            "AI responses disabled in this channel."
        );
    }

    #[tokio::test]
    async fn channel_usage_leaves_override_unset() {
        let harness = CommandHarness::new().await;
        harness.run(inbound_from(OWNER_ID, "!channel")).await;

        assert_eq!(harness.state.channel_override(CHANNEL_ID).await, None);
        assert_eq!(harness.messaging.sent()[0].1, "Usage: !channel on/off");
    }

    #[tokio::test]
    async fn respondtoall_persists_and_confirms() {
        let harness = CommandHarness::new().await;
        harness.run(inbound_from(OWNER_ID, "!respondtoall on")).await;

        assert!(harness.state.should_respond_to_all(CHANNEL_ID).await);
        let raw = std::fs::read_to_string(harness.settings_path()).unwrap();
        assert!(raw.contains("respondToAll"));
        assert_eq!(
            harness.messaging.sent()[0].1,
            "Responding to all messages in this channel."
        );

        harness.run(inbound_from(OWNER_ID, "!respondtoall off")).await;
        assert!(!harness.state.should_respond_to_all(CHANNEL_ID).await);
        assert_eq!(
            harness.messaging.sent()[1].1,
            "Responding only to mentions or replies in this channel."
        );
    }
}
