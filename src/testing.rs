//! Test doubles shared by module tests.

use crate::commands::{CommandDispatcher, Dispatch, FunEndpoints, parse_command};
use crate::config::{LlmConfig, TypingConfig};
use crate::error::{LlmError, MessagingError, Result};
use crate::llm::{
    CompletionRequest, CompletionResponse, ImageGenerator, LlmManager, ProviderKind, TextProvider,
    Usage,
};
use crate::messaging::{InboundStream, Messaging};
use crate::settings::ChannelSettingsStore;
use crate::state::BotState;
use crate::{
    ChannelMessage, GuildInfo, InboundMessage, MessageId, OutboundResponse, SentMessage, UserId,
    UserProfile,
};

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const OWNER_ID: &str = "1000";
pub const BOT_ID: &str = "2000";
pub const CHANNEL_ID: &str = "3000";

/// LLM settings with every provider keyed and the stock model names.
pub fn llm_config() -> LlmConfig {
    LlmConfig {
        default_provider: ProviderKind::Groq,
        groq_api_key: Some("groq-key".into()),
        gemini_api_key: Some("gemini-key".into()),
        shapes_api_key: Some("shapes-key".into()),
        groq_model: "llama3-8b-8192".into(),
        shapes_model: "shapesinc/dalle3-r1ja".into(),
        gemini_model: "gemini-1.5-flash".into(),
        shapes_image_model: None,
        max_output_tokens: 1000,
    }
}

pub fn test_llm_manager(providers: Vec<Arc<ScriptedProvider>>) -> LlmManager {
    LlmManager::with_providers(
        &llm_config(),
        providers
            .into_iter()
            .map(|provider| provider as Arc<dyn TextProvider>),
        reqwest::Client::new(),
    )
}

/// No typing pause.
pub fn instant_typing() -> TypingConfig {
    TypingConfig { min_ms: 0, max_ms: 0 }
}

/// Bot state backed by a settings file in a fresh temp dir.
pub async fn test_state(
    providers: Vec<Arc<ScriptedProvider>>,
) -> (Arc<BotState>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = ChannelSettingsStore::new(dir.path().join("channel.json"));
    let state = BotState::load(store, Arc::new(test_llm_manager(providers))).await;
    (Arc::new(state), dir)
}

/// Owner commands run against a recording platform.
pub struct CommandHarness {
    pub messaging: Arc<MockMessaging>,
    pub state: Arc<BotState>,
    pub dispatcher: CommandDispatcher,
    settings_dir: tempfile::TempDir,
}

impl CommandHarness {
    pub async fn new() -> Self {
        Self::build(MockMessaging::new(), FunEndpoints::default()).await
    }

    pub async fn with_messaging(messaging: MockMessaging) -> Self {
        Self::build(messaging, FunEndpoints::default()).await
    }

    pub async fn with_endpoints(endpoints: FunEndpoints) -> Self {
        Self::build(MockMessaging::new(), endpoints).await
    }

    async fn build(messaging: MockMessaging, endpoints: FunEndpoints) -> Self {
        let (state, settings_dir) = test_state(Vec::new()).await;
        let dispatcher = CommandDispatcher::new(OWNER_ID.into(), "!", reqwest::Client::new())
            .with_endpoints(endpoints)
            .with_typing(instant_typing());
        Self {
            messaging: Arc::new(messaging),
            state,
            dispatcher,
            settings_dir,
        }
    }

    pub fn with_image_generator(mut self, generator: ImageGenerator) -> Self {
        self.dispatcher = self.dispatcher.with_image_generator(generator);
        self
    }

    pub fn settings_path(&self) -> PathBuf {
        self.settings_dir.path().join("channel.json")
    }

    pub async fn run(&self, message: InboundMessage) -> Dispatch {
        let command = parse_command(&message.content, self.dispatcher.prefix())
            .expect("harness messages must be commands");
        self.dispatcher
            .dispatch(&message, command, self.messaging.as_ref(), &self.state)
            .await
    }
}

/// A message from `author_id` in the test channel.
pub fn inbound_from(author_id: &str, content: &str) -> InboundMessage {
    static NEXT_ID: AtomicU64 = AtomicU64::new(1);
    InboundMessage {
        id: NEXT_ID.fetch_add(1, Ordering::Relaxed).to_string().into(),
        channel_id: CHANNEL_ID.into(),
        author_id: author_id.into(),
        author_tag: format!("user{author_id}"),
        content: content.to_string(),
        timestamp: chrono::Utc::now(),
        mentions: Vec::new(),
        referenced_message_id: None,
        guild_id: None,
    }
}

/// Text provider that returns a fixed answer and records requests.
pub struct ScriptedProvider {
    kind: ProviderKind,
    outcome: std::result::Result<(String, Option<u64>), String>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn replying(kind: ProviderKind, text: impl Into<String>, tokens: Option<u64>) -> Arc<Self> {
        Arc::new(Self {
            kind,
            outcome: Ok((text.into(), tokens)),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(kind: ProviderKind, message: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            kind,
            outcome: Err(message.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl TextProvider for ScriptedProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request);
        match &self.outcome {
            Ok((text, tokens)) => Ok(CompletionResponse {
                text: text.clone(),
                usage: tokens.map(|total_tokens| Usage { total_tokens }),
            }),
            Err(message) => Err(LlmError::ProviderRequest {
                provider: self.kind,
                message: message.clone(),
            }),
        }
    }
}

/// In-memory platform that records everything the bot does.
#[derive(Default)]
pub struct MockMessaging {
    next_id: AtomicU64,
    sent: Mutex<Vec<(String, String)>>,
    replies: Mutex<Vec<OutboundResponse>>,
    edits: Mutex<Vec<(MessageId, String)>>,
    deleted: Mutex<Vec<MessageId>>,
    typing: AtomicUsize,
    referenced_authors: HashMap<String, UserId>,
    users: HashMap<String, UserProfile>,
    guilds: HashMap<String, GuildInfo>,
    history: Vec<ChannelMessage>,
    latency: Option<Duration>,
    fail_sends: AtomicBool,
    fail_deletes: AtomicBool,
    fail_typing: AtomicBool,
}

impl MockMessaging {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_referenced_author(mut self, message_id: &str, author_id: &str) -> Self {
        self.referenced_authors
            .insert(message_id.to_string(), author_id.into());
        self
    }

    pub fn with_user(mut self, id: &str, tag: &str, avatar_url: Option<&str>) -> Self {
        self.users.insert(
            id.to_string(),
            UserProfile {
                id: id.into(),
                tag: tag.to_string(),
                avatar_url: avatar_url.map(str::to_string),
            },
        );
        self
    }

    pub fn with_guild(mut self, id: &str, name: &str, icon_url: Option<&str>) -> Self {
        self.guilds.insert(
            id.to_string(),
            GuildInfo {
                id: id.into(),
                name: name.to_string(),
                icon_url: icon_url.map(str::to_string),
            },
        );
        self
    }

    pub fn with_history(mut self, messages: &[(&str, &str)]) -> Self {
        self.history = messages
            .iter()
            .map(|(id, author_id)| ChannelMessage {
                id: (*id).into(),
                author_id: (*author_id).into(),
            })
            .collect();
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn fail_sends(&self) {
        self.fail_sends.store(true, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self) {
        self.fail_deletes.store(true, Ordering::SeqCst);
    }

    pub fn fail_typing(&self) {
        self.fail_typing.store(true, Ordering::SeqCst);
    }

    /// Plain sends as `(channel_id, content)`.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn replies(&self) -> Vec<OutboundResponse> {
        self.replies.lock().unwrap().clone()
    }

    /// Text of every reply, attachments ignored.
    pub fn reply_texts(&self) -> Vec<String> {
        self.replies()
            .into_iter()
            .map(|response| match response {
                OutboundResponse::Text(text) => text,
                OutboundResponse::File { content, .. } => content,
            })
            .collect()
    }

    pub fn edits(&self) -> Vec<(MessageId, String)> {
        self.edits.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<MessageId> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn typing_count(&self) -> usize {
        self.typing.load(Ordering::SeqCst)
    }

    fn sent_message(&self, channel_id: &str) -> SentMessage {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 9_000;
        SentMessage {
            id: id.to_string().into(),
            channel_id: channel_id.into(),
            timestamp: chrono::Utc::now(),
        }
    }

    fn check_send(&self) -> Result<()> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(MessagingError::Request("rate limited".into()).into());
        }
        Ok(())
    }
}

impl Messaging for MockMessaging {
    fn name(&self) -> &str {
        "mock"
    }

    async fn start(&self) -> Result<InboundStream> {
        Ok(Box::pin(futures::stream::empty::<InboundMessage>()))
    }

    fn bot_user_id(&self) -> Option<UserId> {
        Some(BOT_ID.into())
    }

    async fn send(&self, channel_id: &str, content: &str) -> Result<SentMessage> {
        self.check_send()?;
        self.sent
            .lock()
            .unwrap()
            .push((channel_id.to_string(), content.to_string()));
        Ok(self.sent_message(channel_id))
    }

    async fn reply(
        &self,
        message: &InboundMessage,
        response: OutboundResponse,
    ) -> Result<SentMessage> {
        self.check_send()?;
        self.replies.lock().unwrap().push(response);
        Ok(self.sent_message(&message.channel_id))
    }

    async fn edit(&self, sent: &SentMessage, content: &str) -> Result<()> {
        self.edits
            .lock()
            .unwrap()
            .push((sent.id.clone(), content.to_string()));
        Ok(())
    }

    async fn send_typing(&self, _channel_id: &str) -> Result<()> {
        self.typing.fetch_add(1, Ordering::SeqCst);
        if self.fail_typing.load(Ordering::SeqCst) {
            return Err(MessagingError::Request("typing unavailable".into()).into());
        }
        Ok(())
    }

    async fn fetch_message_author(&self, _channel_id: &str, message_id: &str) -> Result<UserId> {
        self.referenced_authors
            .get(message_id)
            .cloned()
            .ok_or_else(|| MessagingError::Request(format!("unknown message {message_id}")).into())
    }

    async fn fetch_user(&self, user_id: &str) -> Result<Option<UserProfile>> {
        Ok(self.users.get(user_id).cloned())
    }

    async fn fetch_guild(&self, guild_id: &str) -> Result<GuildInfo> {
        self.guilds
            .get(guild_id)
            .cloned()
            .ok_or_else(|| MessagingError::Request(format!("unknown guild {guild_id}")).into())
    }

    async fn recent_messages(&self, _channel_id: &str, limit: u8) -> Result<Vec<ChannelMessage>> {
        Ok(self.history.iter().take(limit as usize).cloned().collect())
    }

    async fn delete_message(&self, _channel_id: &str, message_id: &str) -> Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(MessagingError::Request("missing permissions".into()).into());
        }
        self.deleted.lock().unwrap().push(message_id.into());
        Ok(())
    }

    async fn gateway_latency(&self) -> Option<Duration> {
        self.latency
    }
}
