//! Shared types for the inbound conversion pipeline.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Identifiers ─────────────────────────────────────────────────────

/// Separator between the portal id and the remote message id.
const MESSAGE_ID_SEPARATOR: char = '|';

/// Bridge-side identifier of a remote user (their DID).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bridge-side identifier of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortalId(pub String);

impl PortalId {
    pub fn from_convo(convo_id: &str) -> Self {
        Self(convo_id.to_string())
    }
}

impl fmt::Display for PortalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable key of the portal a message belongs to.
///
/// `receiver` scopes the portal to one bridged login; DMs are per-user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortalKey {
    pub id: PortalId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<UserId>,
}

impl PortalKey {
    pub fn new(convo_id: &str, receiver: Option<UserId>) -> Self {
        Self {
            id: PortalId::from_convo(convo_id),
            receiver,
        }
    }
}

/// Deterministic message id used by the delivery layer for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(portal: &PortalId, remote_id: &str) -> Self {
        Self(format!("{}{MESSAGE_ID_SEPARATOR}{remote_id}", portal.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolved sender of a remote event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderRef {
    pub sender: UserId,
    /// The event was sent by the bridged login itself.
    #[serde(default)]
    pub is_from_me: bool,
}

// ── Content ─────────────────────────────────────────────────────────

/// How a part is rendered on the receiving side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderKind {
    Text,
    Notice,
}

/// Markup of `formatted_body`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyFormat {
    #[serde(rename = "org.matrix.custom.html")]
    Html,
}

/// One renderable piece of a converted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPart {
    pub render_kind: RenderKind,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<BodyFormat>,
}

impl ContentPart {
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            render_kind: RenderKind::Text,
            body: body.into(),
            formatted_body: None,
            format: None,
        }
    }

    pub fn notice(body: impl Into<String>) -> Self {
        Self {
            render_kind: RenderKind::Notice,
            body: body.into(),
            formatted_body: None,
            format: None,
        }
    }

    /// Attach an HTML alternate body.
    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.formatted_body = Some(html.into());
        self.format = Some(BodyFormat::Html);
        self
    }
}

// ── Output ──────────────────────────────────────────────────────────

/// Protocol-agnostic message handed to the delivery queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMessage {
    pub id: MessageId,
    pub portal_key: PortalKey,
    pub sender: SenderRef,
    /// The portal must be created if it does not exist yet. Always true.
    pub create_portal: bool,
    pub timestamp: DateTime<Utc>,
    /// Millisecond epoch of `timestamp`, used for delivery ordering.
    pub stream_order: i64,
    /// Possibly empty. Zero parts means nothing to deliver.
    pub parts: Vec<ContentPart>,
}

impl NormalizedMessage {
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// Fields attached to every log line about a queued event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogContext {
    pub chat_id: String,
    pub rev: String,
    pub message_id: String,
    pub sender_id: String,
}

impl LogContext {
    /// Span carrying the context fields, for the delivery side to enter.
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "remote_event",
            chat_id = %self.chat_id,
            rev = %self.rev,
            message_id = %self.message_id,
            sender_id = %self.sender_id,
        )
    }
}
