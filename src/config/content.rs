//! `[content]` section configuration.

use super::{defaults, error::ConfigError};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[content]` section in contentbot.toml - where pages and the base schema live.
///
/// # Example
/// ```toml
/// [content]
/// root = "content"
/// schema = "site.graphql"
/// # inline = "type Film { role: String }"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ContentConfig {
    /// Content directory (relative to project root).
    #[serde(default = "defaults::content::root")]
    #[educe(Default = defaults::content::root())]
    pub root: PathBuf,

    /// Base schema file (relative to project root).
    /// Falls back to `site.graphql` when `inline` is not set either.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<PathBuf>,

    /// Base schema given directly in the config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline: Option<String>,
}

/// Where the base schema comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    File(PathBuf),
    Inline(String),
}

impl ContentConfig {
    pub fn schema_source(&self) -> Result<SchemaSource, ConfigError> {
        match (&self.schema, &self.inline) {
            (Some(_), Some(_)) => Err(ConfigError::Validation(
                "[content.schema] and [content.inline] are mutually exclusive".into(),
            )),
            (None, Some(inline)) => Ok(SchemaSource::Inline(inline.clone())),
            (Some(path), None) => Ok(SchemaSource::File(path.clone())),
            (None, None) => Ok(SchemaSource::File(defaults::content::schema())),
        }
    }
}
