//! Rendering of log events into the text lines the router classifies,
//! throttles and ships.
//!
//! The host normally supplies its own [`Formatter`]; [`TemplateFormatter`]
//! covers the common `$time $metadata[$level] $message` style templates.

use crate::domain::LogLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TEMPLATE: &str = "$time $metadata[$level] $message";

pub trait Formatter: Send + Sync {
    fn format(
        &self,
        template: &str,
        level: LogLevel,
        message: &str,
        timestamp: &DateTime<Utc>,
        metadata: &[(String, String)],
    ) -> String;
}

/// Which metadata entries are handed to the formatter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MetadataKeysRepr", into = "MetadataKeysRepr")]
pub enum MetadataKeys {
    All,
    List(Vec<String>),
}

impl Default for MetadataKeys {
    fn default() -> Self {
        MetadataKeys::List(Vec::new())
    }
}

impl MetadataKeys {
    /// Pick metadata for rendering. `All` keeps the host's order; a list
    /// keeps the list's order and skips keys the event does not carry.
    pub fn select(&self, metadata: &[(String, String)]) -> Vec<(String, String)> {
        match self {
            MetadataKeys::All => metadata.to_vec(),
            MetadataKeys::List(keys) => keys
                .iter()
                .filter_map(|key| metadata.iter().find(|(k, _)| k == key).cloned())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum MetadataKeysRepr {
    Keyword(String),
    List(Vec<String>),
}

impl TryFrom<MetadataKeysRepr> for MetadataKeys {
    type Error = String;

    fn try_from(repr: MetadataKeysRepr) -> Result<Self, Self::Error> {
        match repr {
            MetadataKeysRepr::Keyword(word) if word == "all" => Ok(MetadataKeys::All),
            MetadataKeysRepr::Keyword(word) => Err(format!(
                "metadata_keys must be \"all\" or a list of keys, got \"{word}\""
            )),
            MetadataKeysRepr::List(keys) => Ok(MetadataKeys::List(keys)),
        }
    }
}

impl From<MetadataKeys> for MetadataKeysRepr {
    fn from(keys: MetadataKeys) -> Self {
        match keys {
            MetadataKeys::All => MetadataKeysRepr::Keyword("all".to_string()),
            MetadataKeys::List(keys) => MetadataKeysRepr::List(keys),
        }
    }
}

/// `$`-token template renderer.
///
/// Known tokens: `$time`, `$date`, `$level`, `$message`, `$metadata`,
/// `$node`. Anything else after a `$` is copied through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateFormatter;

const TOKENS: [&str; 6] = ["metadata", "message", "level", "time", "date", "node"];

impl Formatter for TemplateFormatter {
    fn format(
        &self,
        template: &str,
        level: LogLevel,
        message: &str,
        timestamp: &DateTime<Utc>,
        metadata: &[(String, String)],
    ) -> String {
        let mut out = String::with_capacity(template.len() + message.len() + 32);
        let mut rest = template;

        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];
            let Some(token) = TOKENS.iter().find(|t| after.starts_with(**t)) else {
                out.push('$');
                rest = after;
                continue;
            };

            match *token {
                "time" => out.push_str(&timestamp.format("%H:%M:%S%.3f").to_string()),
                "date" => out.push_str(&timestamp.format("%Y-%m-%d").to_string()),
                "level" => out.push_str(level.as_str()),
                "message" => out.push_str(message),
                "metadata" => {
                    for (key, value) in metadata {
                        out.push_str(key);
                        out.push('=');
                        out.push_str(value);
                        out.push(' ');
                    }
                }
                // Single-node device; there is no node name to print.
                _ => {}
            }
            rest = &after[token.len()..];
        }
        out.push_str(rest);
        out
    }
}
