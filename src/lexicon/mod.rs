//! Typed views of the Bluesky chat and embed lexicons.
//!
//! Every union is a closed serde enum keyed on the lexicon `$type` field,
//! with an `Unknown` catch-all so unrecognized shapes deserialize instead of
//! failing the whole log page.

pub mod convo;
pub mod embed;
pub mod syntax;

pub use convo::{
    DeletedMessageView, LogCreateMessage, LogEntry, LogMeta, LogPage, MessageEnvelope,
    MessageUnion, MessageView, SenderView,
};
pub use embed::{
    EmbedRecordView, EmbeddedRecord, FeedPost, MessageEmbed, ProfileViewBasic, RecordRef,
    RecordValue, ViewRecord,
};
pub use syntax::{Did, parse_datetime};
