//! Mutation engine: create, edit, write, rename and delete pages.
//!
//! Every operation normalizes its URLs first, checks existence on disk,
//! performs the filesystem change and then reloads the whole store, so a read
//! that follows a mutation always observes it. There is no locking between
//! concurrent mutations and no rollback: after a partial failure the next
//! reload reflects whatever the filesystem holds.

use super::{ContentStore, Fields, Page, TYPE_FIELD, codec};
use crate::{
    error::{Error, Result},
    log,
    utils::url::PageLocation,
};
use std::path::Path;

/// Field values supplied to a mutation, in input order.
///
/// `None` marks an explicit `null`: it clears the field on edit and is left
/// out of newly written files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Content(Vec<(String, Option<String>)>);

impl Content {
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.push((key.into(), Some(value.into())));
        self
    }

    pub fn clear(mut self, key: impl Into<String>) -> Self {
        self.0.push((key.into(), None));
        self
    }

    /// Entries that belong in the file body. `url` is an argument, never content,
    /// and `type` always comes from the mutated page type.
    fn entries(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_deref()))
            .filter(|(key, _)| {
                !key.eq_ignore_ascii_case("url") && !key.eq_ignore_ascii_case(TYPE_FIELD)
            })
    }
}

impl<K: Into<String>> FromIterator<(K, Option<String>)> for Content {
    fn from_iter<I: IntoIterator<Item = (K, Option<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// `{type: kind, ...content}` with nulls dropped.
fn compose(kind: &str, content: &Content) -> Fields {
    let mut fields = Fields::new();
    fields.set(TYPE_FIELD, kind);
    for (key, value) in content.entries() {
        if let Some(value) = value {
            fields.set(key, value);
        }
    }
    fields
}

/// Apply `content` onto existing fields: values overwrite, nulls remove,
/// absent keys are kept.
fn merge(mut fields: Fields, kind: &str, content: &Content) -> Fields {
    fields.set(TYPE_FIELD, kind);
    for (key, value) in content.entries() {
        match value {
            Some(value) => fields.set(key, value),
            None => {
                fields.remove(key);
            }
        }
    }
    fields
}

impl ContentStore {
    /// Create a new page of type `kind`. Fails if the page already exists.
    pub async fn create(&self, url: &str, kind: &str, content: &Content) -> Result<Option<Page>> {
        let location = self.locate(url)?;
        if self.path_exists(&location.file()).await? {
            return Err(Error::AlreadyExists(location.url));
        }

        self.create_dir(&location.dir).await?;
        self.write_fields(&location, &compose(kind, content)).await?;
        self.reload().await?;

        log!("mutation"; "created {} ({kind})", location.url);
        Ok(self.expect_page(&location.url))
    }

    /// Merge `content` onto an existing page and set its type to `kind`.
    pub async fn edit(&self, url: &str, kind: &str, content: &Content) -> Result<Option<Page>> {
        let location = self.locate(url)?;
        let file = location.file();
        if !self.path_exists(&file).await? {
            return Err(Error::NotFound(location.url));
        }

        let current = self
            .fs()
            .read_to_string(&file)
            .await
            .map_err(Error::io(&file))?;
        let fields = merge(codec::parse(&current), kind, content);
        self.write_fields(&location, &fields).await?;
        self.reload().await?;

        log!("mutation"; "edited {} ({kind})", location.url);
        Ok(self.expect_page(&location.url))
    }

    /// Create or overwrite a page with exactly `{type: kind, ...content}`.
    pub async fn write(&self, url: &str, kind: &str, content: &Content) -> Result<Option<Page>> {
        let location = self.locate(url)?;

        self.create_dir(&location.dir).await?;
        self.write_fields(&location, &compose(kind, content)).await?;
        self.reload().await?;

        log!("mutation"; "wrote {} ({kind})", location.url);
        Ok(self.expect_page(&location.url))
    }

    /// Move a page, including the pages below it, to a new URL.
    ///
    /// Directories left empty by the move are removed, walking up from the
    /// old location until the first non-empty directory or the content root.
    pub async fn rename(&self, from: &str, to: &str) -> Result<Option<Page>> {
        let from = self.locate(from)?;
        let to = self.locate(to)?;

        if from.is_root() {
            return Err(Error::invalid("cannot move the content root"));
        }
        if to.is_root() {
            return Err(Error::invalid("cannot move a page onto the content root"));
        }
        if to.dir.starts_with(&from.dir) && to.url != from.url {
            return Err(Error::invalid(format!(
                "cannot move `{}` into itself (`{}`)",
                from.url, to.url
            )));
        }
        if !self.path_exists(&from.dir).await? {
            return Err(Error::NotFound(from.url));
        }
        if from.url == to.url {
            return Ok(self.snapshot().get(&to.url).cloned());
        }
        if self.path_exists(&to.file()).await? {
            return Err(Error::AlreadyExists(to.url));
        }

        if let Some(parent) = to.dir.parent() {
            self.create_dir(parent).await?;
        }
        self.fs()
            .rename(&from.dir, &to.dir)
            .await
            .map_err(Error::io(&from.dir))?;
        self.prune_empty_parents(&from.dir).await?;
        self.reload().await?;

        log!("mutation"; "moved {} -> {}", from.url, to.url);
        Ok(self.expect_page(&to.url))
    }

    /// Remove a page and everything below it, returning the removed record.
    pub async fn delete(&self, url: &str) -> Result<Option<Page>> {
        let location = self.locate(url)?;
        if location.is_root() {
            return Err(Error::invalid("cannot delete the content root"));
        }
        if !self.path_exists(&location.dir).await? {
            return Err(Error::NotFound(location.url));
        }

        let removed = self.snapshot().get(&location.url).cloned();
        self.fs()
            .remove_dir_all(&location.dir)
            .await
            .map_err(Error::io(&location.dir))?;
        self.reload().await?;

        log!("mutation"; "deleted {}", location.url);
        Ok(removed)
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    async fn path_exists(&self, path: &Path) -> Result<bool> {
        self.fs().exists(path).await.map_err(Error::io(path))
    }

    async fn create_dir(&self, dir: &Path) -> Result<()> {
        self.fs().create_dir_all(dir).await.map_err(Error::io(dir))
    }

    async fn write_fields(&self, location: &PageLocation, fields: &Fields) -> Result<()> {
        let file = location.file();
        self.fs()
            .write(&file, &codec::stringify(fields))
            .await
            .map_err(Error::io(&file))
    }

    async fn prune_empty_parents(&self, moved: &Path) -> Result<()> {
        let mut current = moved.parent();
        while let Some(dir) = current {
            if dir == self.root() || !dir.starts_with(self.root()) {
                break;
            }
            let entries = self.fs().read_dir(dir).await.map_err(Error::io(dir))?;
            if !entries.is_empty() {
                break;
            }
            self.fs().remove_dir(dir).await.map_err(Error::io(dir))?;
            current = dir.parent();
        }
        Ok(())
    }

    /// Page at `url` after a reload. A miss means the written location and
    /// the reloaded key disagree, which is reported rather than hidden.
    fn expect_page(&self, url: &str) -> Option<Page> {
        let page = self.snapshot().get(url).cloned();
        if page.is_none() {
            log!("error"; "page {url} missing from the store after reload");
        }
        page
    }
}
