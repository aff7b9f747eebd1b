//! Message conversion: a message view becomes an ordered list of parts.
//!
//! Conversion never fails. Problems that cost content (an embed that could
//! not be rendered) come back as [`Diagnostic`]s for the caller to log.

use crate::error::EmbedError;
use crate::lexicon::{EmbeddedRecord, MessageEmbed, MessageUnion, MessageView, RecordValue};
use crate::pipeline::embed::resolve_embed;
use crate::pipeline::types::ContentPart;

pub const DELETED_MESSAGE_TEXT: &str = "Deleted message";
pub const UNSUPPORTED_MESSAGE_TEXT: &str = "Unsupported message";

/// Non-fatal findings from a conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The embed was dropped; the rest of the message was kept.
    EmbedOmitted(EmbedError),
    /// A referenced record is not a feed post; the placeholder text was used.
    RecordValueUnparsed { uri: String },
}

impl Diagnostic {
    /// Whether the caller should surface this at warn level.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::EmbedOmitted(_))
    }
}

/// Output of [`convert_message`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversion {
    pub parts: Vec<ContentPart>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Convert a message payload into content parts.
///
/// - Active: optional embed part first, then the text part if the body is
///   non-empty. May yield zero parts.
/// - Deleted: a single "Deleted message" notice.
/// - Unknown: a single "Unsupported message" notice.
pub fn convert_message(payload: &MessageUnion) -> Conversion {
    match payload {
        MessageUnion::Active(view) => convert_active(view),
        MessageUnion::Deleted(_) => Conversion {
            parts: vec![ContentPart::notice(DELETED_MESSAGE_TEXT)],
            diagnostics: Vec::new(),
        },
        MessageUnion::Unknown => Conversion {
            parts: vec![ContentPart::notice(UNSUPPORTED_MESSAGE_TEXT)],
            diagnostics: Vec::new(),
        },
    }
}

fn convert_active(view: &MessageView) -> Conversion {
    let mut conversion = Conversion::default();

    if let Some(embed) = &view.embed {
        match resolve_embed(embed) {
            Ok(part) => {
                if let Some(uri) = unparsed_record_uri(embed) {
                    conversion
                        .diagnostics
                        .push(Diagnostic::RecordValueUnparsed { uri });
                }
                conversion.parts.push(part);
            }
            Err(e) => conversion.diagnostics.push(Diagnostic::EmbedOmitted(e)),
        }
    }

    if !view.text.is_empty() {
        conversion.parts.push(ContentPart::text(view.text.as_str()));
    }

    conversion
}

fn unparsed_record_uri(embed: &MessageEmbed) -> Option<String> {
    let MessageEmbed::Record(view) = embed else {
        return None;
    };
    match view.record.as_ref()? {
        EmbeddedRecord::ReferencedPost(post) if post.value == RecordValue::Unknown => {
            Some(post.uri.clone())
        }
        _ => None,
    }
}
