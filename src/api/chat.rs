//! Chat and conversation history endpoints.

use serde::{Deserialize, Serialize};

use crate::gateway::{Gateway, GatewayError};

pub const CHAT_PATH: &str = "/api/chat";
pub const CONVERSATIONS_PATH: &str = "/api/conversations";

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
    /// Continue an existing server-side conversation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Which model produced the reply
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationSummary {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub message_count: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationHeader {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoredMessage {
    #[serde(default)]
    pub id: String,
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationHistory {
    pub conversation: ConversationHeader,
    #[serde(default)]
    pub messages: Vec<StoredMessage>,
}

pub async fn send(gateway: &Gateway, request: &ChatRequest<'_>) -> Result<ChatReply, GatewayError> {
    gateway.post_json(CHAT_PATH, request).await
}

pub async fn list_conversations(gateway: &Gateway) -> Result<Vec<ConversationSummary>, GatewayError> {
    gateway.get(CONVERSATIONS_PATH).await
}

/// Fetch one conversation. `id` must already have passed
/// [`validate_conversation_id`](crate::api::validation::validate_conversation_id).
pub async fn conversation(gateway: &Gateway, id: &str) -> Result<ConversationHistory, GatewayError> {
    gateway
        .get(&format!("{}/{}", CONVERSATIONS_PATH, id))
        .await
}
