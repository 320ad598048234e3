//! Project configuration management for `contentbot.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                   |
//! |-------------|-------------------------------------------|
//! | `[content]` | Content directory and base schema         |
//! | `[serve]`   | GraphQL endpoint (interface, port, path)  |
//!
//! # Example
//!
//! ```toml
//! [content]
//! root = "content"
//! schema = "site.graphql"
//!
//! [serve]
//! port = 5280
//! path = "/graphql"
//! ```
//!
//! CLI flags override file values, then every path is resolved against the
//! project root.

mod content;
pub mod defaults;
mod error;
mod serve;

use content::{ContentConfig, SchemaSource};
use error::ConfigError;
use serve::ServeConfig;

use crate::cli::{Cli, Commands};
use anyhow::{Result, bail};
use contentbot::ContentbotBuilder;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing contentbot.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Project root (set after loading)
    #[serde(skip)]
    pub root: PathBuf,

    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Content settings
    #[serde(default)]
    pub content: ContentConfig,

    /// GraphQL endpoint settings
    #[serde(default)]
    pub serve: ServeConfig,
}

impl BotConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: BotConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let base = cli.root.clone().unwrap_or_else(|| PathBuf::from("./"));
        let root = match &cli.command {
            Commands::Init { name: Some(name) } => base.join(name),
            _ => base,
        };

        Self::update_option(&mut self.content.root, cli.content.as_ref());
        if cli.schema.is_some() {
            // A schema file on the command line wins over an inline schema
            self.content.schema = cli.schema.clone();
            self.content.inline = None;
        }

        if let Commands::Serve { interface, port } = &cli.command {
            Self::update_option(&mut self.serve.interface, interface.as_ref());
            Self::update_option(&mut self.serve.port, port.as_ref());
        }

        self.update_path_with_root(&root, &cli.config);
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Resolve every path against the root and normalize to absolute paths
    fn update_path_with_root(&mut self, root: &Path, config: &Path) {
        let root = Self::normalize_path(&Self::expand_tilde(root));

        self.config_path = Self::normalize_path(&root.join(config));
        self.content.root = Self::normalize_path(&root.join(Self::expand_tilde(&self.content.root)));
        if let Some(schema) = &self.content.schema {
            self.content.schema = Some(Self::normalize_path(&root.join(Self::expand_tilde(schema))));
        } else if self.content.inline.is_none() {
            self.content.schema = Some(Self::normalize_path(&root.join(defaults::content::schema())));
        }

        self.root = root;
    }

    /// Expand a leading `~` to the home directory
    fn expand_tilde(path: &Path) -> PathBuf {
        match path.to_str() {
            Some(raw) => PathBuf::from(shellexpand::tilde(raw).into_owned()),
            None => path.to_path_buf(),
        }
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            // For non-existent paths, manually make them absolute
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration for commands that open the site
    pub fn validate(&self) -> Result<()> {
        if !self.content.root.is_dir() {
            bail!(ConfigError::Validation(format!(
                "[content.root] `{}` is not a directory",
                self.content.root.display()
            )));
        }

        if let SchemaSource::File(path) = self.content.schema_source()?
            && !path.is_file()
        {
            bail!(ConfigError::Validation(format!(
                "[content.schema] `{}` not found",
                path.display()
            )));
        }

        if !self.serve.path.starts_with('/') {
            bail!(ConfigError::Validation(
                "[serve.path] must start with `/`".into()
            ));
        }

        Ok(())
    }

    /// Library builder for the configured schema and content root.
    pub fn bot_builder(&self) -> Result<ContentbotBuilder> {
        let builder = match self.content.schema_source()? {
            SchemaSource::File(path) => contentbot::Contentbot::builder().schema_path(path),
            SchemaSource::Inline(source) => contentbot::Contentbot::builder().schema(source),
        };
        Ok(builder.content_path(&self.content.root))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("contentbot").chain(args.iter().copied()))
    }

    #[test]
    fn test_from_str_empty_uses_defaults() {
        let config = BotConfig::from_str("").unwrap();
        assert_eq!(config.content.root, PathBuf::from("content"));
        assert_eq!(config.serve.port, 5280);
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert!(BotConfig::from_str("[build]\nminify = true").is_err());
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = BotConfig::from_path(Path::new("/definitely/missing.toml")).unwrap_err();
        assert!(matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::Io(..))));
    }

    #[test]
    fn test_update_with_cli_resolves_paths() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_str().unwrap();
        let mut config = BotConfig::default();
        config.update_with_cli(&cli(&["--root", root, "-c", "pages", "schema"]));

        let root = dir.path().canonicalize().unwrap();
        assert_eq!(config.root, root);
        assert_eq!(config.config_path, root.join("contentbot.toml"));
        assert_eq!(config.content.root, root.join("pages"));
        assert_eq!(config.content.schema, Some(root.join("site.graphql")));
    }

    #[test]
    fn test_cli_schema_replaces_inline() {
        let mut config = BotConfig::from_str("[content]\ninline = \"type A { a: String }\"").unwrap();
        config.update_with_cli(&cli(&["--root", "/tmp", "-s", "other.graphql", "schema"]));

        assert_eq!(config.content.inline, None);
        assert!(config.content.schema.as_ref().unwrap().ends_with("other.graphql"));
    }

    #[test]
    fn test_inline_schema_kept_without_cli_override() {
        let mut config = BotConfig::from_str("[content]\ninline = \"type A { a: String }\"").unwrap();
        config.update_with_cli(&cli(&["--root", "/tmp", "schema"]));

        assert_eq!(config.content.schema, None);
        assert!(matches!(
            config.content.schema_source().unwrap(),
            SchemaSource::Inline(_)
        ));
    }

    #[test]
    fn test_serve_overrides() {
        let mut config = BotConfig::default();
        config.update_with_cli(&cli(&["serve", "-i", "0.0.0.0", "-p", "9000"]));
        assert_eq!(config.serve.interface, "0.0.0.0");
        assert_eq!(config.serve.port, 9000);
    }

    #[test]
    fn test_init_name_joins_root() {
        let mut config = BotConfig::default();
        config.update_with_cli(&cli(&["--root", "/tmp", "init", "blog"]));
        assert!(config.root.ends_with("blog"));
        assert_eq!(config.content.root, config.root.join("content"));
    }

    #[test]
    fn test_validate() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_str().unwrap();
        let mut config = BotConfig::default();
        config.update_with_cli(&cli(&["--root", root, "schema"]));

        // Neither content nor schema exist yet
        assert!(config.validate().is_err());

        fs::create_dir_all(dir.path().join("content")).unwrap();
        assert!(config.validate().is_err());

        fs::write(dir.path().join("site.graphql"), "type A { a: String }").unwrap();
        assert!(config.validate().is_ok());

        config.serve.path = "graphql".into();
        assert!(config.validate().is_err());
    }
}
