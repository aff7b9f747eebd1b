//! Configuration types.

use std::path::PathBuf;

use crate::error::ConfigError;
use crate::lexicon::Did;

/// Log line format for the driver binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Bridge configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// DID of the bridged login. Marks own messages and scopes portal keys.
    pub user_did: Option<Did>,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
    pub log_format: LogFormat,
    /// NDJSON file of `getLog` pages. Reads stdin when unset.
    pub input: Option<PathBuf>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            user_did: None,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            input: None,
        }
    }
}

impl BridgeConfig {
    /// Build config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let user_did = get("BRIDGE_USER_DID")
            .map(|raw| {
                Did::parse(&raw).map_err(|e| ConfigError::InvalidValue {
                    key: "BRIDGE_USER_DID".into(),
                    message: e.to_string(),
                })
            })
            .transpose()?;

        let log_level = get("BRIDGE_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let log_format = match get("BRIDGE_LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "BRIDGE_LOG_FORMAT".into(),
                    message: format!("expected \"text\" or \"json\", got {other:?}"),
                });
            }
        };

        let input = get("BRIDGE_INPUT").map(PathBuf::from);

        Ok(Self {
            user_did,
            log_level,
            log_format,
            input,
        })
    }
}
