//! Chat screen model.
//!
//! Messages are append-only and kept in conversation order. A failed send
//! appends a synthetic error message instead of dropping the exchange, and only
//! one send may be outstanding at a time.

use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::chat::{self, ChatRequest};
use crate::api::validation::validate_conversation_id;
use crate::busy::BusyFlag;
use crate::gateway::{Gateway, GatewayError};

pub const WELCOME_MESSAGE: &str = "👋 Hello! I'm MediAI, your medical AI assistant. I'm here to help answer your health questions and provide medical information.\n\n⚠️ Important: I provide educational information only and am not a replacement for professional medical advice. For emergencies, please call 911 or your local emergency services.\n\nHow can I help you today?";

pub const ERROR_MESSAGE: &str =
    "❌ Sorry, I encountered an error. Please try again or check your connection.";

pub const QUICK_QUESTIONS: [&str; 4] = [
    "What are symptoms of flu?",
    "How to prevent common cold?",
    "When should I see a doctor?",
    "What is a healthy diet?",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    Error,
}

impl Role {
    /// Map a role label from stored history. Anything but `user` was said by
    /// the assistant.
    fn from_stored(label: &str) -> Self {
        if label.eq_ignore_ascii_case("user") {
            Role::User
        } else {
            Role::Assistant
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    fn welcome() -> Self {
        Self::new(Role::Assistant, WELCOME_MESSAGE)
    }
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("A message is already being sent")]
    Busy,

    #[error("Invalid conversation id: {0}")]
    InvalidConversation(String),

    #[error("Failed to load conversation: {0}")]
    Load(#[from] GatewayError),
}

pub struct ChatScreen {
    gateway: Arc<Gateway>,
    messages: Mutex<Vec<ChatMessage>>,
    conversation_id: Mutex<Option<String>>,
    busy: BusyFlag,
}

impl ChatScreen {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self {
            gateway,
            messages: Mutex::new(vec![ChatMessage::welcome()]),
            conversation_id: Mutex::new(None),
            busy: BusyFlag::new(),
        }
    }

    /// Open a screen on a past conversation. New messages continue it.
    pub async fn resume(gateway: Arc<Gateway>, id: &str) -> Result<Self, ChatError> {
        let id = id.trim();
        validate_conversation_id(id).map_err(ChatError::InvalidConversation)?;

        let history = chat::conversation(&gateway, id).await?;
        debug!(conversation = %history.conversation.id, count = history.messages.len(), "Conversation loaded");

        let mut messages = vec![ChatMessage::welcome()];
        messages.extend(
            history
                .messages
                .into_iter()
                .map(|m| ChatMessage::new(Role::from_stored(&m.role), m.content)),
        );

        Ok(Self {
            gateway,
            messages: Mutex::new(messages),
            conversation_id: Mutex::new(Some(history.conversation.id)),
            busy: BusyFlag::new(),
        })
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.messages.lock().clone()
    }

    pub fn quick_questions(&self) -> &'static [&'static str] {
        &QUICK_QUESTIONS
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    pub fn conversation_id(&self) -> Option<String> {
        self.conversation_id.lock().clone()
    }

    /// Send `text` and append the outcome. Returns the appended assistant or
    /// error message.
    ///
    /// If the returned future is dropped before completion the request is
    /// abandoned: the busy flag is released and no reply is appended.
    pub async fn send_message(&self, text: &str) -> Result<ChatMessage, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let _busy = self.busy.try_acquire().ok_or(ChatError::Busy)?;

        self.push(ChatMessage::new(Role::User, text));

        let conversation_id = self.conversation_id();
        let request = ChatRequest {
            message: text,
            conversation_id: conversation_id.as_deref(),
        };

        let reply = match chat::send(&self.gateway, &request).await {
            Ok(reply) => {
                if let Some(id) = reply.conversation_id.filter(|id| !id.is_empty()) {
                    *self.conversation_id.lock() = Some(id);
                }
                ChatMessage::new(Role::Assistant, reply.response)
            }
            Err(e) => {
                warn!(error = %e, "Chat request failed");
                ChatMessage::new(Role::Error, ERROR_MESSAGE)
            }
        };

        self.push(reply.clone());
        Ok(reply)
    }

    fn push(&self, message: ChatMessage) {
        self.messages.lock().push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, MockBackend};
    use axum::{
        http::StatusCode,
        response::IntoResponse,
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::time::Duration;

    async fn chat_backend(bodies: Arc<Mutex<Vec<Value>>>) -> MockBackend {
        let router = Router::new()
            .route(
                "/api/chat",
                post(move |Json(body): Json<Value>| {
                    let bodies = bodies.clone();
                    async move {
                        bodies.lock().push(body.clone());
                        match body["message"].as_str() {
                            Some("slow") => {
                                tokio::time::sleep(Duration::from_millis(300)).await;
                                Json(json!({"response": "finally"})).into_response()
                            }
                            Some("fail") => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
                            Some(text) => Json(json!({
                                "response": format!("echo: {}", text),
                                "conversation_id": "c1",
                                "provider": "mock"
                            }))
                            .into_response(),
                            None => StatusCode::UNPROCESSABLE_ENTITY.into_response(),
                        }
                    }
                }),
            )
            .route(
                "/api/conversations/c-42",
                get(|| async {
                    Json(json!({
                        "conversation": {"id": "c-42", "title": "Flu"},
                        "messages": [
                            {"id": "m1", "role": "user", "content": "Flu?"},
                            {"id": "m2", "role": "assistant", "content": "Rest."}
                        ]
                    }))
                }),
            );
        testing::spawn(router).await
    }

    fn screen_for(backend: &MockBackend) -> ChatScreen {
        let (gateway, _authority) = testing::gateway_for(backend);
        ChatScreen::new(gateway)
    }

    #[tokio::test]
    async fn test_starts_with_welcome() {
        let backend = chat_backend(Arc::default()).await;
        let screen = screen_for(&backend);

        let messages = screen.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::Assistant);
        assert!(messages[0].content.contains("MediAI"));
        assert_eq!(screen.quick_questions().len(), 4);
        assert!(!screen.is_busy());
    }

    #[tokio::test]
    async fn test_send_appends_in_order() {
        let bodies = Arc::new(Mutex::new(Vec::new()));
        let backend = chat_backend(bodies.clone()).await;
        let screen = screen_for(&backend);

        let reply = screen.send_message("  hello  ").await.unwrap();
        assert_eq!(reply.content, "echo: hello");

        let messages = screen.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1], ChatMessage::new(Role::User, "hello"));
        assert_eq!(messages[2], ChatMessage::new(Role::Assistant, "echo: hello"));
        assert_eq!(bodies.lock()[0], json!({"message": "hello"}));
    }

    #[tokio::test]
    async fn test_conversation_id_carried_forward() {
        let bodies = Arc::new(Mutex::new(Vec::new()));
        let backend = chat_backend(bodies.clone()).await;
        let screen = screen_for(&backend);

        screen.send_message("one").await.unwrap();
        assert_eq!(screen.conversation_id().as_deref(), Some("c1"));
        screen.send_message("two").await.unwrap();

        let bodies = bodies.lock();
        assert!(bodies[0].get("conversation_id").is_none());
        assert_eq!(bodies[1]["conversation_id"], "c1");
    }

    #[tokio::test]
    async fn test_empty_message_not_sent() {
        let backend = chat_backend(Arc::default()).await;
        let screen = screen_for(&backend);

        assert!(matches!(
            screen.send_message("   ").await,
            Err(ChatError::EmptyMessage)
        ));
        assert_eq!(screen.messages().len(), 1);
        assert_eq!(backend.log.total(), 0);
    }

    #[tokio::test]
    async fn test_failure_appends_error_message() {
        let backend = chat_backend(Arc::default()).await;
        let screen = screen_for(&backend);

        let reply = screen.send_message("fail").await.unwrap();
        assert_eq!(reply.role, Role::Error);
        assert_eq!(reply.content, ERROR_MESSAGE);

        let messages = screen.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].content, "fail");
        assert!(!screen.is_busy());

        // Still usable after the failure.
        let reply = screen.send_message("again").await.unwrap();
        assert_eq!(reply.role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_second_send_rejected_while_in_flight() {
        let backend = chat_backend(Arc::default()).await;
        let screen = screen_for(&backend);

        let (first, second) = tokio::join!(screen.send_message("slow"), screen.send_message("quick"));

        assert_eq!(first.unwrap().content, "finally");
        assert!(matches!(second, Err(ChatError::Busy)));
        assert_eq!(backend.log.count("/api/chat"), 1);
        assert_eq!(screen.messages().len(), 3);
        assert!(!screen.is_busy());
    }

    #[tokio::test]
    async fn test_abandoned_send_releases_busy() {
        let backend = chat_backend(Arc::default()).await;
        let screen = screen_for(&backend);

        let outcome =
            tokio::time::timeout(Duration::from_millis(50), screen.send_message("slow")).await;
        assert!(outcome.is_err());

        assert!(!screen.is_busy());
        // Welcome plus the user message; no reply was appended.
        assert_eq!(screen.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_resume_conversation() {
        let bodies = Arc::new(Mutex::new(Vec::new()));
        let backend = chat_backend(bodies.clone()).await;
        let (gateway, _authority) = testing::gateway_for(&backend);

        let screen = ChatScreen::resume(gateway, "c-42").await.unwrap();
        let messages = screen.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1], ChatMessage::new(Role::User, "Flu?"));
        assert_eq!(messages[2], ChatMessage::new(Role::Assistant, "Rest."));

        screen.send_message("more").await.unwrap();
        assert_eq!(bodies.lock()[0]["conversation_id"], "c-42");
    }

    #[tokio::test]
    async fn test_resume_rejects_bad_id() {
        let backend = chat_backend(Arc::default()).await;
        let (gateway, _authority) = testing::gateway_for(&backend);

        let result = ChatScreen::resume(gateway.clone(), "../etc").await;
        assert!(matches!(result, Err(ChatError::InvalidConversation(_))));

        let result = ChatScreen::resume(gateway, "missing").await;
        assert!(matches!(result, Err(ChatError::Load(_))));
        assert_eq!(backend.log.count("/api/conversations/missing"), 1);
    }
}
