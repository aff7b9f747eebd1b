//! Message detail extraction: sender, timestamp and id from a message view.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::ExtractionError;
use crate::identity::SenderResolver;
use crate::lexicon::{MessageUnion, parse_datetime};
use crate::pipeline::types::SenderRef;

/// Everything the dispatcher needs from a message view.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageDetails {
    pub sender: SenderRef,
    pub timestamp: DateTime<Utc>,
    /// Remote message id.
    pub id: String,
    /// The view itself, passed through untouched for conversion.
    pub payload: MessageUnion,
}

/// Pulls details out of a message view, resolving the sender through a
/// [`SenderResolver`].
pub struct MessageDetailExtractor {
    resolver: Arc<dyn SenderResolver>,
}

impl MessageDetailExtractor {
    pub fn new(resolver: Arc<dyn SenderResolver>) -> Self {
        Self { resolver }
    }

    /// Extract sender, timestamp and id.
    ///
    /// Fails when no view is populated, when the sender cannot be resolved,
    /// or when `sentAt` is not a strict datetime. The sender is resolved
    /// before the timestamp is parsed.
    pub async fn extract(&self, view: MessageUnion) -> Result<MessageDetails, ExtractionError> {
        let envelope = view.envelope().ok_or(ExtractionError::NoViewPopulated)?;

        let sender = self
            .resolver
            .resolve(envelope.sender_did)
            .await
            .map_err(|source| ExtractionError::SenderResolution {
                did: envelope.sender_did.to_string(),
                source,
            })?;

        let timestamp =
            parse_datetime(envelope.sent_at).map_err(|source| ExtractionError::TimestampParse {
                raw: envelope.sent_at.to_string(),
                source,
            })?;

        let id = envelope.id.to_string();

        Ok(MessageDetails {
            sender,
            timestamp,
            id,
            payload: view,
        })
    }
}
