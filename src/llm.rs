//! LLM provider management and routing.

pub mod gemini;
pub mod image;
pub mod manager;
pub mod openai;
pub mod provider;
pub mod usage;

pub use image::ImageGenerator;
pub use manager::LlmManager;
pub use provider::{
    ChatMessage, CompletionRequest, CompletionResponse, ProviderKind, TextProvider, Usage,
};
pub use usage::UsageCounters;
