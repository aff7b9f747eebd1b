//! Inbound conversion pipeline.
//!
//! Every conversation log entry flows through:
//! 1. `EventDispatcher::handle()`: classify the entry
//! 2. `MessageDetailExtractor::extract()`: sender, timestamp, id
//! 3. `convert_message()`: ordered content parts
//! 4. `resolve_embed()`: the embedded record, if any
//!
//! Results flow back up and the dispatcher enqueues them for delivery.

pub mod convert;
pub mod dispatcher;
pub mod embed;
pub mod extract;
pub mod types;

pub use convert::{Conversion, Diagnostic, convert_message};
pub use dispatcher::{DispatchOutcome, EventDispatcher};
pub use embed::{decode_record_value, resolve_embed, resolve_record};
pub use extract::{MessageDetailExtractor, MessageDetails};
pub use types::{
    BodyFormat, ContentPart, LogContext, MessageId, NormalizedMessage, PortalId, PortalKey,
    RenderKind, SenderRef, UserId,
};
