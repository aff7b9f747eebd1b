//! Sender resolution: raw sender identifiers to bridge sender references.

use async_trait::async_trait;

use crate::error::SenderError;
use crate::lexicon::Did;
use crate::pipeline::types::{SenderRef, UserId};

/// Resolves the raw sender id on a message view.
///
/// Implementations may perform network lookups; timeouts and retries are
/// theirs to handle. Dropping the returned future cancels the lookup.
#[async_trait]
pub trait SenderResolver: Send + Sync {
    async fn resolve(&self, raw_sender_id: &str) -> Result<SenderRef, SenderError>;
}

/// Offline resolver: validates DID syntax and marks the bridged user's own
/// messages.
#[derive(Debug, Clone, Default)]
pub struct DidSenderResolver {
    own_did: Option<Did>,
}

impl DidSenderResolver {
    pub fn new(own_did: Option<Did>) -> Self {
        Self { own_did }
    }
}

#[async_trait]
impl SenderResolver for DidSenderResolver {
    async fn resolve(&self, raw_sender_id: &str) -> Result<SenderRef, SenderError> {
        let did = Did::parse(raw_sender_id)?;
        let is_from_me = self.own_did.as_ref() == Some(&did);
        Ok(SenderRef {
            sender: UserId(did.into()),
            is_from_me,
        })
    }
}
