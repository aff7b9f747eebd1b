//! `chat.bsky.convo.*` types: log entries and message views.

use serde::{Deserialize, Serialize};

use super::embed::{MessageEmbed, lenient_embed};

// ── Log entries ─────────────────────────────────────────────────────

/// One page of `chat.bsky.convo.getLog` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogPage {
    /// Cursor to pass on the next poll.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    /// Raw entries, decoded one at a time so a malformed entry only costs
    /// itself.
    #[serde(default)]
    pub logs: Vec<serde_json::Value>,
}

/// A single entry from the conversation log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "$type")]
pub enum LogEntry {
    #[serde(rename = "chat.bsky.convo.defs#logBeginConvo")]
    BeginConvo(LogMeta),
    #[serde(rename = "chat.bsky.convo.defs#logAcceptConvo")]
    AcceptConvo(LogMeta),
    #[serde(rename = "chat.bsky.convo.defs#logLeaveConvo")]
    LeaveConvo(LogMeta),
    #[serde(rename = "chat.bsky.convo.defs#logMuteConvo")]
    MuteConvo(LogMeta),
    #[serde(rename = "chat.bsky.convo.defs#logUnmuteConvo")]
    UnmuteConvo(LogMeta),
    #[serde(rename = "chat.bsky.convo.defs#logCreateMessage")]
    CreateMessage(LogCreateMessage),
    #[serde(rename = "chat.bsky.convo.defs#logDeleteMessage")]
    DeleteMessage(LogMeta),
    #[serde(rename = "chat.bsky.convo.defs#logReadMessage")]
    ReadMessage(LogMeta),
    #[serde(rename = "chat.bsky.convo.defs#logAddReaction")]
    AddReaction(LogMeta),
    #[serde(rename = "chat.bsky.convo.defs#logRemoveReaction")]
    RemoveReaction(LogMeta),
    #[serde(other)]
    Unknown,
}

impl LogEntry {
    /// Decode one raw entry from a [`LogPage`].
    pub fn from_raw(raw: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(raw)
    }

    /// Short label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BeginConvo(_) => "begin_convo",
            Self::AcceptConvo(_) => "accept_convo",
            Self::LeaveConvo(_) => "leave_convo",
            Self::MuteConvo(_) => "mute_convo",
            Self::UnmuteConvo(_) => "unmute_convo",
            Self::CreateMessage(_) => "create_message",
            Self::DeleteMessage(_) => "delete_message",
            Self::ReadMessage(_) => "read_message",
            Self::AddReaction(_) => "add_reaction",
            Self::RemoveReaction(_) => "remove_reaction",
            Self::Unknown => "unknown",
        }
    }
}

/// Fields shared by every log entry. Entry-specific payloads of kinds the
/// bridge does not handle yet are ignored during deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogMeta {
    #[serde(default)]
    pub rev: String,
    #[serde(default)]
    pub convo_id: String,
}

/// `#logCreateMessage`: a message was sent in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogCreateMessage {
    pub rev: String,
    pub convo_id: String,
    /// Missing or unrecognized views land in [`MessageUnion::Unknown`].
    #[serde(default)]
    pub message: MessageUnion,
}

// ── Message views ───────────────────────────────────────────────────

/// The message carried by a log entry: exactly one view kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "$type")]
pub enum MessageUnion {
    #[serde(rename = "chat.bsky.convo.defs#messageView")]
    Active(MessageView),
    #[serde(rename = "chat.bsky.convo.defs#deletedMessageView")]
    Deleted(DeletedMessageView),
    /// Neither view was populated (or the view type is newer than this crate).
    #[default]
    #[serde(other)]
    Unknown,
}

impl MessageUnion {
    /// Borrow the fields both view kinds carry.
    ///
    /// Returns `None` for [`MessageUnion::Unknown`].
    pub fn envelope(&self) -> Option<MessageEnvelope<'_>> {
        match self {
            Self::Active(view) => Some(MessageEnvelope {
                id: &view.id,
                sender_did: &view.sender.did,
                sent_at: &view.sent_at,
            }),
            Self::Deleted(view) => Some(MessageEnvelope {
                id: &view.id,
                sender_did: &view.sender.did,
                sent_at: &view.sent_at,
            }),
            Self::Unknown => None,
        }
    }
}

/// Identity and timing fields common to active and deleted views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageEnvelope<'a> {
    pub id: &'a str,
    pub sender_did: &'a str,
    pub sent_at: &'a str,
}

/// `#messageView`: a live message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub rev: String,
    #[serde(default)]
    pub text: String,
    /// A malformed embed degrades to [`MessageEmbed::Unknown`].
    #[serde(
        default,
        deserialize_with = "lenient_embed",
        skip_serializing_if = "Option::is_none"
    )]
    pub embed: Option<MessageEmbed>,
    #[serde(default)]
    pub sender: SenderView,
    #[serde(default)]
    pub sent_at: String,
}

/// `#deletedMessageView`: a message that has been deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedMessageView {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub rev: String,
    #[serde(default)]
    pub sender: SenderView,
    #[serde(default)]
    pub sent_at: String,
}

/// `#messageViewSender`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderView {
    #[serde(default)]
    pub did: String,
}
