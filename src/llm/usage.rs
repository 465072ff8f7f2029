//! Per-provider call and token counters.

use crate::llm::ProviderKind;

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
struct Counter {
    calls: AtomicU64,
    tokens: AtomicU64,
}

/// Point-in-time copy of one provider's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageSnapshot {
    pub calls: u64,
    pub tokens: u64,
}

/// Monotonic usage counters, one pair per provider. Never reset while the
/// process lives.
#[derive(Debug, Default)]
pub struct UsageCounters {
    groq: Counter,
    gemini: Counter,
    shapes: Counter,
}

impl UsageCounters {
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&self, kind: ProviderKind) -> &Counter {
        match kind {
            ProviderKind::Groq => &self.groq,
            ProviderKind::Gemini => &self.gemini,
            ProviderKind::Shapes => &self.shapes,
        }
    }

    /// Record one successful generation.
    pub fn record(&self, kind: ProviderKind, tokens: u64) {
        let counter = self.counter(kind);
        counter.calls.fetch_add(1, Ordering::Relaxed);
        counter.tokens.fetch_add(tokens, Ordering::Relaxed);
    }

    pub fn snapshot(&self, kind: ProviderKind) -> UsageSnapshot {
        let counter = self.counter(kind);
        UsageSnapshot {
            calls: counter.calls.load(Ordering::Relaxed),
            tokens: counter.tokens.load(Ordering::Relaxed),
        }
    }
}
