//! `app.bsky.embed.record` views and the record values they wrap.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

/// Embed attached to a chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "$type")]
pub enum MessageEmbed {
    #[serde(rename = "app.bsky.embed.record#view")]
    Record(EmbedRecordView),
    #[serde(other)]
    Unknown,
}

impl MessageEmbed {
    /// Lexicon type name, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Record(_) => "app.bsky.embed.record#view",
            Self::Unknown => "unknown",
        }
    }
}

/// `app.bsky.embed.record#view`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedRecordView {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<EmbeddedRecord>,
}

/// The record referenced by an embed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "$type")]
pub enum EmbeddedRecord {
    #[serde(rename = "app.bsky.embed.record#viewRecord")]
    ReferencedPost(ViewRecord),
    #[serde(rename = "app.bsky.embed.record#viewNotFound")]
    NotFound(RecordRef),
    #[serde(rename = "app.bsky.embed.record#viewBlocked")]
    Blocked(RecordRef),
    #[serde(rename = "app.bsky.embed.record#viewDetached")]
    Detached(RecordRef),
    #[serde(rename = "app.bsky.feed.defs#generatorView")]
    FeedGenerator(RecordRef),
    #[serde(rename = "app.bsky.graph.defs#listView")]
    List(RecordRef),
    #[serde(rename = "app.bsky.labeler.defs#labelerView")]
    Labeler(RecordRef),
    #[serde(rename = "app.bsky.graph.defs#starterPackViewBasic")]
    StarterPack(RecordRef),
    #[serde(other)]
    Unknown,
}

impl EmbeddedRecord {
    /// Lexicon type name, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ReferencedPost(_) => "app.bsky.embed.record#viewRecord",
            Self::NotFound(_) => "app.bsky.embed.record#viewNotFound",
            Self::Blocked(_) => "app.bsky.embed.record#viewBlocked",
            Self::Detached(_) => "app.bsky.embed.record#viewDetached",
            Self::FeedGenerator(_) => "app.bsky.feed.defs#generatorView",
            Self::List(_) => "app.bsky.graph.defs#listView",
            Self::Labeler(_) => "app.bsky.labeler.defs#labelerView",
            Self::StarterPack(_) => "app.bsky.graph.defs#starterPackViewBasic",
            Self::Unknown => "unknown",
        }
    }
}

/// Minimal shape of record kinds the bridge does not render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    #[serde(default)]
    pub uri: String,
}

/// `app.bsky.embed.record#viewRecord`: a hydrated referenced post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewRecord {
    pub uri: String,
    #[serde(default)]
    pub cid: String,
    pub author: ProfileViewBasic,
    /// A malformed value degrades to [`RecordValue::Unknown`].
    #[serde(default, deserialize_with = "lenient_record_value")]
    pub value: RecordValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub like_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repost_count: Option<i64>,
    #[serde(default)]
    pub indexed_at: String,
}

/// `app.bsky.actor.defs#profileViewBasic`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileViewBasic {
    pub did: String,
    #[serde(default)]
    pub handle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// The record stored at the referenced URI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "$type")]
pub enum RecordValue {
    #[serde(rename = "app.bsky.feed.post")]
    FeedPost(FeedPost),
    #[default]
    #[serde(other)]
    Unknown,
}

/// `app.bsky.feed.post`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPost {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub created_at: String,
}

// ── Lenient decoding ────────────────────────────────────────────────

/// Decode an optional embed, mapping a malformed one to
/// [`MessageEmbed::Unknown`] instead of failing the whole message view.
pub(crate) fn lenient_embed<'de, D>(deserializer: D) -> Result<Option<MessageEmbed>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    if raw.is_null() {
        return Ok(None);
    }
    let embed = serde_json::from_value(raw).unwrap_or_else(|error| {
        debug!(%error, "Malformed embed, treating as unknown");
        MessageEmbed::Unknown
    });
    Ok(Some(embed))
}

/// Decode a record value, mapping a malformed one to [`RecordValue::Unknown`].
fn lenient_record_value<'de, D>(deserializer: D) -> Result<RecordValue, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(raw).unwrap_or_else(|error| {
        debug!(%error, "Malformed record value, treating as unknown");
        RecordValue::Unknown
    }))
}
