//! AT Protocol lexical rules for DIDs and datetimes.
//!
//! Both parsers are strict: anything outside the protocol grammar is
//! rejected rather than coerced.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::SyntaxError;

const MAX_DID_LEN: usize = 2048;
const MAX_DATETIME_LEN: usize = 64;

static DID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^did:[a-z]+:[a-zA-Z0-9._:%-]*[a-zA-Z0-9._-]$").unwrap());

static DATETIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[0-9]{4}-[01][0-9]-[0-3][0-9]T[0-2][0-9]:[0-6][0-9]:[0-6][0-9](\.[0-9]{1,20})?(Z|([+-][0-2][0-9]:[0-5][0-9]))$",
    )
    .unwrap()
});

/// A syntactically valid decentralized identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did(String);

impl Did {
    pub fn parse(raw: &str) -> Result<Self, SyntaxError> {
        if raw.len() > MAX_DID_LEN {
            return Err(SyntaxError::DidTooLong(raw.len()));
        }
        if !DID_RE.is_match(raw) {
            return Err(SyntaxError::InvalidDid(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Did {
    type Error = SyntaxError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.0
    }
}

/// Parse an AT Protocol `datetime` string into a UTC instant.
///
/// Requires an uppercase `T`, an explicit timezone (`Z` or `±HH:MM`, but
/// never `-00:00`), and a real calendar date.
pub fn parse_datetime(raw: &str) -> Result<DateTime<Utc>, SyntaxError> {
    if raw.len() > MAX_DATETIME_LEN {
        return Err(SyntaxError::DatetimeTooLong(raw.len()));
    }
    if !DATETIME_RE.is_match(raw) {
        return Err(SyntaxError::InvalidDatetime(raw.to_string()));
    }
    if raw.ends_with("-00:00") {
        return Err(SyntaxError::NegativeZeroOffset(raw.to_string()));
    }
    let parsed = DateTime::parse_from_rfc3339(raw)?;
    Ok(parsed.with_timezone(&Utc))
}
