//! Pluggable filesystem capability used by the content store.
//!
//! Everything the store and the mutation engine touch on disk goes through
//! [`ContentFs`], so a site can be served from the real filesystem ([`OsFs`])
//! or from memory ([`MemoryFs`]).

mod memory;
mod os;

pub use memory::MemoryFs;
pub use os::OsFs;

use async_trait::async_trait;
use std::{
    io,
    path::{Path, PathBuf},
};

/// A single directory listing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Whether a directory entry is hidden (dot-prefixed) and skipped by walks.
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

#[async_trait]
pub trait ContentFs: Send + Sync {
    /// Create a directory and all missing parents. Existing directories are fine.
    async fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// List the direct children of a directory.
    async fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    async fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Create or truncate a file. The parent directory must exist.
    async fn write(&self, path: &Path, contents: &str) -> io::Result<()>;

    async fn exists(&self, path: &Path) -> io::Result<bool>;

    /// Move a file or a whole directory subtree.
    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Remove an empty directory.
    async fn remove_dir(&self, path: &Path) -> io::Result<()>;

    /// Remove a directory and everything below it.
    async fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Collect `root` and every non-hidden directory below it, sorted.
    async fn walk_dirs(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        let mut dirs = Vec::new();
        let mut pending = vec![root.to_path_buf()];

        while let Some(dir) = pending.pop() {
            for entry in self.read_dir(&dir).await? {
                if entry.is_dir && !is_hidden(&entry.name) {
                    pending.push(dir.join(&entry.name));
                }
            }
            dirs.push(dir);
        }

        dirs.sort();
        Ok(dirs)
    }
}
