//! Real filesystem backed by `tokio::fs`.

use super::{ContentFs, DirEntry, is_hidden};
use async_trait::async_trait;
use std::{
    io,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// [`ContentFs`] over the operating system filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFs;

#[async_trait]
impl ContentFs for OsFs {
    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        tokio::fs::create_dir_all(path).await
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(path).await?;
        while let Some(entry) = dir.next_entry().await? {
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: entry.file_type().await?.is_dir(),
            });
        }
        Ok(entries)
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }

    async fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        tokio::fs::write(path, contents).await
    }

    async fn exists(&self, path: &Path) -> io::Result<bool> {
        tokio::fs::try_exists(path).await
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        tokio::fs::rename(from, to).await
    }

    async fn remove_dir(&self, path: &Path) -> io::Result<()> {
        tokio::fs::remove_dir(path).await
    }

    async fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        tokio::fs::remove_dir_all(path).await
    }

    async fn walk_dirs(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        let root = root.to_path_buf();
        tokio::task::spawn_blocking(move || walk_dirs_blocking(&root))
            .await
            .map_err(io::Error::other)?
    }
}

/// Walk with `walkdir`, skipping hidden directories and everything below them.
fn walk_dirs_blocking(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(&e.file_name().to_string_lossy()));

    for entry in walker {
        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_dir() {
            dirs.push(entry.into_path());
        }
    }

    dirs.sort();
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_walk_dirs_on_disk() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("films/x")).unwrap();
        fs::create_dir_all(root.join(".git/objects")).unwrap();
        fs::write(root.join("films/x/index.txt"), "title: X").unwrap();

        let dirs = OsFs.walk_dirs(root).await.unwrap();
        assert_eq!(
            dirs,
            vec![root.to_path_buf(), root.join("films"), root.join("films/x")]
        );
    }

    #[tokio::test]
    async fn test_walk_matches_default_walk() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::create_dir_all(root.join("c")).unwrap();

        // The trait's read_dir-based walk must agree with the walkdir one.
        let mut stack = vec![root.to_path_buf()];
        let mut manual = Vec::new();
        while let Some(dir) = stack.pop() {
            for entry in OsFs.read_dir(&dir).await.unwrap() {
                if entry.is_dir {
                    stack.push(dir.join(entry.name));
                }
            }
            manual.push(dir);
        }
        manual.sort();

        assert_eq!(OsFs.walk_dirs(root).await.unwrap(), manual);
    }

    #[tokio::test]
    async fn test_rename_and_remove() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        OsFs.create_dir_all(&root.join("a")).await.unwrap();
        OsFs.write(&root.join("a/index.txt"), "title: A").await.unwrap();

        OsFs.rename(&root.join("a"), &root.join("b")).await.unwrap();
        assert!(!OsFs.exists(&root.join("a")).await.unwrap());
        assert_eq!(
            OsFs.read_to_string(&root.join("b/index.txt")).await.unwrap(),
            "title: A"
        );

        OsFs.remove_dir_all(&root.join("b")).await.unwrap();
        assert!(!OsFs.exists(&root.join("b")).await.unwrap());
    }
}
