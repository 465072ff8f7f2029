//! Inbound boundary: sends each message down the command or conversation path.

use crate::agent::responder::{Responder, ResponseOutcome};
use crate::commands::{CommandDispatcher, Dispatch, parse_command};
use crate::messaging::MessagingDyn;
use crate::state::BotState;
use crate::InboundMessage;

use std::sync::Arc;

/// Where a message ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The bot's own message.
    OwnMessage,
    Command(Dispatch),
    Conversation(ResponseOutcome),
}

/// Routes inbound messages. One call handles one message; calls for
/// different messages may run concurrently.
pub struct Router {
    dispatcher: CommandDispatcher,
    responder: Responder,
    state: Arc<BotState>,
    messaging: Arc<dyn MessagingDyn>,
}

impl Router {
    pub fn new(
        dispatcher: CommandDispatcher,
        responder: Responder,
        state: Arc<BotState>,
        messaging: Arc<dyn MessagingDyn>,
    ) -> Self {
        Self {
            dispatcher,
            responder,
            state,
            messaging,
        }
    }

    pub async fn handle(&self, message: InboundMessage) -> Route {
        if self
            .messaging
            .bot_user_id()
            .is_some_and(|bot_id| bot_id == message.author_id)
        {
            return Route::OwnMessage;
        }

        if let Some(command) = parse_command(&message.content, self.dispatcher.prefix()) {
            let dispatch = self
                .dispatcher
                .dispatch(&message, command, self.messaging.as_ref(), &self.state)
                .await;
            return Route::Command(dispatch);
        }

        let outcome = self
            .responder
            .respond(&message, self.messaging.as_ref(), &self.state)
            .await;
        Route::Conversation(outcome)
    }
}
