//! Project initialization module.
//!
//! Creates a starter project: config, base schema and a home page.

use crate::config::BotConfig;
use anyhow::{Context, Result, bail};
use contentbot::{
    content::{CONTENT_FILE, Fields, codec},
    log,
};
use std::{fs, path::Path};

/// Starter base schema
const SCHEMA_TEMPLATE: &str = r#"directive @field(type: String) on FIELD_DEFINITION

"The home page"
type Home {
  "Introduction shown below the title"
  intro: String @field(type: "long-text")
}

"A post with a publication date"
type Post {
  date: String
  body: String @field(type: "long-text")
  "Canonical link, if the post was published elsewhere"
  link: String @field(type: "url")
}
"#;

/// Create a new project with default structure
pub fn new_project(config: &BotConfig) -> Result<()> {
    let root = &config.root;

    for path in [&config.config_path, &config.content.root] {
        if path.exists() {
            bail!(
                "Path `{}` already exists. Try `contentbot init <NAME>` instead.",
                path.display()
            );
        }
    }
    if let Some(schema) = &config.content.schema
        && schema.exists()
    {
        bail!("Path `{}` already exists.", schema.display());
    }

    fs::create_dir_all(root).with_context(|| format!("Failed to create {}", root.display()))?;
    init_default_config(&config.config_path)?;
    if let Some(schema) = &config.content.schema {
        write_file(schema, SCHEMA_TEMPLATE)?;
    }
    init_home_page(&config.content.root)?;

    log!("init"; "created project at {}", root.display());
    Ok(())
}

/// Write default configuration file
fn init_default_config(path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&BotConfig::default())?;
    write_file(path, &content)
}

/// Create the content root with a home page
fn init_home_page(content: &Path) -> Result<()> {
    let fields: Fields = [
        ("type", "Home"),
        ("title", "Home"),
        ("intro", "Welcome! Edit this page through the GraphQL endpoint."),
    ]
    .into_iter()
    .collect();
    write_file(&content.join(CONTENT_FILE), &codec::stringify(&fields))
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
