//! Event dispatcher: entry point for conversation log entries.
//!
//! Flow for a created message:
//! 1. `MessageDetailExtractor::extract()`: sender, timestamp, id
//! 2. `convert_message()`: ordered content parts plus diagnostics
//! 3. `DeliveryQueue::enqueue()`: hand off, tagged with a `LogContext`
//!
//! Extraction failures drop the event. Nothing is retried here; the log
//! source re-delivers on its next poll if it wants to.

use std::sync::Arc;

use tracing::{debug, error, trace, warn};

use crate::delivery::DeliveryQueue;
use crate::lexicon::{LogCreateMessage, LogEntry, LogPage};
use crate::pipeline::convert::{Diagnostic, convert_message};
use crate::pipeline::extract::MessageDetailExtractor;
use crate::pipeline::types::{LogContext, MessageId, NormalizedMessage, PortalKey, UserId};

/// What happened to a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A normalized message was enqueued.
    Queued,
    /// The entry kind is not handled.
    Ignored,
    /// Extraction failed; the entry was logged and dropped.
    Dropped,
}

/// Routes log entries through extraction and conversion into the queue.
pub struct EventDispatcher {
    extractor: MessageDetailExtractor,
    queue: Arc<dyn DeliveryQueue>,
    receiver: Option<UserId>,
}

impl EventDispatcher {
    pub fn new(extractor: MessageDetailExtractor, queue: Arc<dyn DeliveryQueue>) -> Self {
        Self {
            extractor,
            queue,
            receiver: None,
        }
    }

    /// Scope every portal key to the given bridged login.
    pub fn with_receiver(mut self, receiver: Option<UserId>) -> Self {
        self.receiver = receiver;
        self
    }

    /// Handle one log entry.
    pub async fn handle(&self, entry: LogEntry) -> DispatchOutcome {
        trace!(kind = entry.kind(), "Received log entry");
        match entry {
            LogEntry::CreateMessage(evt) => self.handle_new_message(evt).await,
            LogEntry::BeginConvo(_)
            | LogEntry::AcceptConvo(_)
            | LogEntry::LeaveConvo(_)
            | LogEntry::MuteConvo(_)
            | LogEntry::UnmuteConvo(_)
            | LogEntry::DeleteMessage(_)
            | LogEntry::ReadMessage(_)
            | LogEntry::AddReaction(_)
            | LogEntry::RemoveReaction(_)
            | LogEntry::Unknown => DispatchOutcome::Ignored,
        }
    }

    /// Handle every entry of a `getLog` page in log order.
    ///
    /// Entries that fail to decode are logged and skipped; the rest of the
    /// page is still handled. Returns the page cursor for the next poll.
    pub async fn handle_page(&self, page: LogPage) -> Option<String> {
        let LogPage { cursor, logs } = page;
        let total = logs.len();
        let mut queued = 0;
        let mut skipped = 0;
        for (index, raw) in logs.into_iter().enumerate() {
            let entry = match LogEntry::from_raw(raw) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(index, error = %e, "Skipping malformed log entry");
                    skipped += 1;
                    continue;
                }
            };
            if self.handle(entry).await == DispatchOutcome::Queued {
                queued += 1;
            }
        }
        debug!(total, queued, skipped, cursor = ?cursor, "Processed log page");
        cursor
    }

    async fn handle_new_message(&self, evt: LogCreateMessage) -> DispatchOutcome {
        let LogCreateMessage {
            rev,
            convo_id,
            message,
        } = evt;

        let details = match self.extractor.extract(message).await {
            Ok(details) => details,
            Err(e) => {
                error!(
                    chat_id = %convo_id,
                    rev = %rev,
                    error = %e,
                    "Failed to parse message details"
                );
                return DispatchOutcome::Dropped;
            }
        };

        let conversion = convert_message(&details.payload);
        for diagnostic in &conversion.diagnostics {
            log_diagnostic(&convo_id, &details.id, diagnostic);
        }

        let portal_key = PortalKey::new(&convo_id, self.receiver.clone());
        let id = MessageId::new(&portal_key.id, &details.id);
        let context = LogContext {
            chat_id: convo_id,
            rev,
            message_id: details.id,
            sender_id: details.sender.sender.to_string(),
        };

        let message = NormalizedMessage {
            id,
            portal_key,
            sender: details.sender,
            create_portal: true,
            timestamp: details.timestamp,
            stream_order: details.timestamp.timestamp_millis(),
            parts: conversion.parts,
        };

        debug!(
            chat_id = %context.chat_id,
            message_id = %context.message_id,
            parts = message.parts.len(),
            "Queueing remote message"
        );
        self.queue.enqueue(message, context);
        DispatchOutcome::Queued
    }
}

fn log_diagnostic(chat_id: &str, message_id: &str, diagnostic: &Diagnostic) {
    match diagnostic {
        Diagnostic::EmbedOmitted(e) => warn!(
            chat_id = %chat_id,
            message_id = %message_id,
            error = %e,
            "Dropping unsupported embed"
        ),
        Diagnostic::RecordValueUnparsed { uri } => debug!(
            chat_id = %chat_id,
            message_id = %message_id,
            uri = %uri,
            "Embedded record is not a post"
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::identity::DidSenderResolver;
    use crate::lexicon::Did;
    use crate::pipeline::types::ContentPart;

    /// Queue that records what it was given.
    #[derive(Default)]
    struct RecordingQueue {
        items: Mutex<Vec<(NormalizedMessage, LogContext)>>,
    }

    impl DeliveryQueue for RecordingQueue {
        fn enqueue(&self, message: NormalizedMessage, context: LogContext) {
            self.items.lock().unwrap().push((message, context));
        }
    }

    fn dispatcher(queue: Arc<RecordingQueue>) -> EventDispatcher {
        let extractor = MessageDetailExtractor::new(Arc::new(DidSenderResolver::default()));
        EventDispatcher::new(extractor, queue)
    }

    fn entry(value: serde_json::Value) -> LogEntry {
        serde_json::from_value(value).unwrap()
    }

    fn create_entry(message: serde_json::Value) -> LogEntry {
        entry(serde_json::json!({
            "$type": "chat.bsky.convo.defs#logCreateMessage",
            "rev": "rev-7",
            "convoId": "convo-1",
            "message": message
        }))
    }

    fn hello_view() -> serde_json::Value {
        serde_json::json!({
            "$type": "chat.bsky.convo.defs#messageView",
            "id": "msg1",
            "rev": "rev-7",
            "text": "hello",
            "sender": { "did": "did:plc:abc" },
            "sentAt": "2024-01-01T00:00:00.000Z"
        })
    }

    #[tokio::test]
    async fn created_message_is_queued() {
        let queue = Arc::new(RecordingQueue::default());
        let outcome = dispatcher(queue.clone()).handle(create_entry(hello_view())).await;
        assert_eq!(outcome, DispatchOutcome::Queued);

        let items = queue.items.lock().unwrap();
        assert_eq!(items.len(), 1);
        let (msg, ctx) = &items[0];
        assert_eq!(msg.id.as_str(), "convo-1|msg1");
        assert_eq!(msg.portal_key, PortalKey::new("convo-1", None));
        assert_eq!(msg.sender.sender, UserId("did:plc:abc".into()));
        assert!(msg.create_portal);
        assert_eq!(msg.stream_order, 1_704_067_200_000);
        assert_eq!(msg.stream_order, msg.timestamp.timestamp_millis());
        assert_eq!(msg.parts, vec![ContentPart::text("hello")]);
        assert_eq!(
            ctx,
            &LogContext {
                chat_id: "convo-1".into(),
                rev: "rev-7".into(),
                message_id: "msg1".into(),
                sender_id: "did:plc:abc".into(),
            }
        );
    }

    #[tokio::test]
    async fn other_kinds_are_ignored() {
        let queue = Arc::new(RecordingQueue::default());
        let dispatcher = dispatcher(queue.clone());
        for ty in [
            "chat.bsky.convo.defs#logBeginConvo",
            "chat.bsky.convo.defs#logAcceptConvo",
            "chat.bsky.convo.defs#logLeaveConvo",
            "chat.bsky.convo.defs#logMuteConvo",
            "chat.bsky.convo.defs#logUnmuteConvo",
            "chat.bsky.convo.defs#logDeleteMessage",
            "chat.bsky.convo.defs#logReadMessage",
            "chat.bsky.convo.defs#logAddReaction",
            "chat.bsky.convo.defs#logRemoveReaction",
            "chat.bsky.convo.defs#logFromTheFuture",
        ] {
            let e = entry(serde_json::json!({ "$type": ty, "rev": "1", "convoId": "c" }));
            assert_eq!(dispatcher.handle(e).await, DispatchOutcome::Ignored, "{ty}");
        }
        assert!(queue.items.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_view_is_dropped() {
        let queue = Arc::new(RecordingQueue::default());
        let outcome = dispatcher(queue.clone())
            .handle(create_entry(serde_json::json!({ "$type": "chat.bsky.convo.defs#systemMessageView" })))
            .await;
        assert_eq!(outcome, DispatchOutcome::Dropped);
        assert!(queue.items.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn bad_timestamp_is_dropped() {
        let queue = Arc::new(RecordingQueue::default());
        let mut view = hello_view();
        view["sentAt"] = serde_json::json!("yesterday");
        let outcome = dispatcher(queue.clone()).handle(create_entry(view)).await;
        assert_eq!(outcome, DispatchOutcome::Dropped);
        assert!(queue.items.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn bad_sender_is_dropped() {
        let queue = Arc::new(RecordingQueue::default());
        let mut view = hello_view();
        view["sender"]["did"] = serde_json::json!("@alice");
        let outcome = dispatcher(queue.clone()).handle(create_entry(view)).await;
        assert_eq!(outcome, DispatchOutcome::Dropped);
        assert!(queue.items.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_message_is_still_queued() {
        let queue = Arc::new(RecordingQueue::default());
        let mut view = hello_view();
        view["text"] = serde_json::json!("");
        let outcome = dispatcher(queue.clone()).handle(create_entry(view)).await;
        assert_eq!(outcome, DispatchOutcome::Queued);
        let items = queue.items.lock().unwrap();
        assert!(items[0].0.is_empty());
    }

    #[tokio::test]
    async fn deleted_view_is_queued_as_notice() {
        let queue = Arc::new(RecordingQueue::default());
        let view = serde_json::json!({
            "$type": "chat.bsky.convo.defs#deletedMessageView",
            "id": "msg9",
            "rev": "rev-7",
            "sender": { "did": "did:plc:abc" },
            "sentAt": "2024-01-01T00:00:00Z"
        });
        dispatcher(queue.clone()).handle(create_entry(view)).await;
        let items = queue.items.lock().unwrap();
        assert_eq!(items[0].0.parts, vec![ContentPart::notice("Deleted message")]);
    }

    #[tokio::test]
    async fn receiver_scopes_portal_key() {
        let queue = Arc::new(RecordingQueue::default());
        let me = Did::parse("did:plc:me").unwrap();
        let extractor =
            MessageDetailExtractor::new(Arc::new(DidSenderResolver::new(Some(me.clone()))));
        let dispatcher = EventDispatcher::new(extractor, queue.clone())
            .with_receiver(Some(UserId(me.to_string())));

        let mut view = hello_view();
        view["sender"]["did"] = serde_json::json!("did:plc:me");
        dispatcher.handle(create_entry(view)).await;

        let items = queue.items.lock().unwrap();
        let msg = &items[0].0;
        assert_eq!(msg.portal_key.receiver, Some(UserId("did:plc:me".into())));
        assert!(msg.sender.is_from_me);
        // The receiver does not leak into the message id.
        assert_eq!(msg.id.as_str(), "convo-1|msg1");
    }

    #[tokio::test]
    async fn page_is_processed_in_order() {
        let queue = Arc::new(RecordingQueue::default());
        let mut second = hello_view();
        second["id"] = serde_json::json!("msg2");
        second["sentAt"] = serde_json::json!("2023-12-31T23:59:59Z");
        let page: LogPage = serde_json::from_value(serde_json::json!({
            "cursor": "next",
            "logs": [
                { "$type": "chat.bsky.convo.defs#logCreateMessage", "rev": "1", "convoId": "c", "message": hello_view() },
                { "$type": "chat.bsky.convo.defs#logReadMessage", "rev": "2", "convoId": "c" },
                { "$type": "chat.bsky.convo.defs#logCreateMessage", "rev": "3", "convoId": "c", "message": second }
            ]
        }))
        .unwrap();

        let cursor = dispatcher(queue.clone()).handle_page(page).await;
        assert_eq!(cursor.as_deref(), Some("next"));

        let items = queue.items.lock().unwrap();
        let ids: Vec<_> = items.iter().map(|(m, _)| m.id.as_str().to_string()).collect();
        assert_eq!(ids, vec!["c|msg1", "c|msg2"]);
        // Stream order follows timestamps, not arrival order.
        assert!(items[1].0.stream_order < items[0].0.stream_order);
    }

    #[tokio::test]
    async fn malformed_entry_does_not_sink_the_page() {
        let queue = Arc::new(RecordingQueue::default());
        let page: LogPage = serde_json::from_value(serde_json::json!({
            "cursor": "next",
            "logs": [
                { "$type": "chat.bsky.convo.defs#logCreateMessage", "rev": 5, "convoId": "c", "message": hello_view() },
                { "$type": "chat.bsky.convo.defs#logCreateMessage", "rev": "2", "convoId": "c", "message": hello_view() }
            ]
        }))
        .unwrap();

        let cursor = dispatcher(queue.clone()).handle_page(page).await;
        assert_eq!(cursor.as_deref(), Some("next"));

        let items = queue.items.lock().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].1.rev, "2");
    }

    #[tokio::test]
    async fn missing_sent_at_drops_only_that_message() {
        let queue = Arc::new(RecordingQueue::default());
        let mut undated = hello_view();
        undated["id"] = serde_json::json!("undated");
        undated.as_object_mut().unwrap().remove("sentAt");
        let page: LogPage = serde_json::from_value(serde_json::json!({
            "logs": [
                { "$type": "chat.bsky.convo.defs#logCreateMessage", "rev": "1", "convoId": "c", "message": undated },
                { "$type": "chat.bsky.convo.defs#logCreateMessage", "rev": "2", "convoId": "c", "message": hello_view() }
            ]
        }))
        .unwrap();

        let cursor = dispatcher(queue.clone()).handle_page(page).await;
        assert!(cursor.is_none());

        let items = queue.items.lock().unwrap();
        let ids: Vec<_> = items.iter().map(|(m, _)| m.id.as_str().to_string()).collect();
        assert_eq!(ids, vec!["c|msg1"]);
    }

    #[tokio::test]
    async fn malformed_quoted_post_keeps_message() {
        let queue = Arc::new(RecordingQueue::default());
        let mut view = hello_view();
        view["embed"] = serde_json::json!({
            "$type": "app.bsky.embed.record#view",
            "record": {
                "$type": "app.bsky.embed.record#viewRecord",
                "uri": "at://did:plc:author/app.bsky.feed.post/3kabc",
                "author": { "did": "did:plc:author", "handle": "alice.test" },
                "value": { "$type": "app.bsky.feed.post", "text": 42 }
            }
        });
        let outcome = dispatcher(queue.clone()).handle(create_entry(view)).await;
        assert_eq!(outcome, DispatchOutcome::Queued);

        let items = queue.items.lock().unwrap();
        let parts = &items[0].0.parts;
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].body, "not parsed");
        assert_eq!(parts[1], ContentPart::text("hello"));
    }
}
