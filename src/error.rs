//! Error types for the bridge core.

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Lexical errors for AT Protocol identifiers and datetimes.
#[derive(Debug, thiserror::Error)]
pub enum SyntaxError {
    #[error("DID is too long: {0} characters")]
    DidTooLong(usize),

    #[error("Invalid DID syntax: {0:?}")]
    InvalidDid(String),

    #[error("Datetime is too long: {0} characters")]
    DatetimeTooLong(usize),

    #[error("Invalid datetime syntax: {0:?}")]
    InvalidDatetime(String),

    #[error("Datetime uses the -00:00 offset: {0:?}")]
    NegativeZeroOffset(String),

    #[error("Datetime is not a valid instant: {0}")]
    Datetime(#[from] chrono::ParseError),
}

/// Failures reported by a sender-resolution collaborator.
#[derive(Debug, thiserror::Error)]
pub enum SenderError {
    #[error("Invalid sender DID: {0}")]
    InvalidDid(#[from] SyntaxError),

    #[error("Sender lookup failed for {did}: {reason}")]
    Lookup { did: String, reason: String },
}

/// Errors that abort extraction of a message view. The event is dropped.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("no message view or deleted message view")]
    NoViewPopulated,

    #[error("failed to parse sender DID {did:?}: {source}")]
    SenderResolution {
        did: String,
        #[source]
        source: SenderError,
    },

    #[error("failed to parse sentAt {raw:?}: {source}")]
    TimestampParse {
        raw: String,
        #[source]
        source: SyntaxError,
    },
}

/// Reasons an embed could not be turned into a content part.
///
/// Never fatal for the message: the converter omits the embed and keeps
/// the text part.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmbedError {
    #[error("unhandled embed type: {0}")]
    UnhandledEmbedKind(&'static str),

    #[error("record is nil")]
    MissingRecord,

    #[error("unhandled record type: {0}")]
    UnhandledRecordKind(&'static str),
}
