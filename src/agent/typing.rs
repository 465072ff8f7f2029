//! Human-like typing pause before replies.

use crate::config::TypingConfig;
use crate::messaging::MessagingDyn;

use rand::Rng as _;
use std::time::Duration;

/// Show the typing indicator, then wait a random time within `config`.
///
/// Best-effort: if the indicator cannot be sent the failure is logged and the
/// pause is skipped.
pub async fn simulate_typing(messaging: &dyn MessagingDyn, channel_id: &str, config: TypingConfig) {
    if let Err(error) = messaging.send_typing(channel_id).await {
        tracing::warn!(%error, %channel_id, "typing indicator failed");
        return;
    }

    let delay = typing_delay(config);
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

fn typing_delay(config: TypingConfig) -> Duration {
    if config.max_ms <= config.min_ms {
        return Duration::from_millis(config.min_ms);
    }
    Duration::from_millis(rand::rng().random_range(config.min_ms..=config.max_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockMessaging;

    #[test]
    fn delay_stays_within_bounds() {
        let config = TypingConfig::default();
        for _ in 0..200 {
            let delay = typing_delay(config);
            assert!(delay >= Duration::from_millis(6_000));
            assert!(delay <= Duration::from_millis(10_000));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn waits_after_indicator() {
        let messaging = MockMessaging::new();
        let started = tokio::time::Instant::now();

        simulate_typing(&messaging, "c", TypingConfig { min_ms: 500, max_ms: 700 }).await;

        assert_eq!(messaging.typing_count(), 1);
        assert!(started.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn indicator_failure_is_swallowed() {
        let messaging = MockMessaging::new();
        messaging.fail_typing();
        let started = tokio::time::Instant::now();

        simulate_typing(&messaging, "c", TypingConfig::default()).await;

        assert_eq!(messaging.typing_count(), 1);
        assert!(started.elapsed() < Duration::from_millis(6_000));
    }
}
