//! In-memory filesystem.
//!
//! Keeps a flat map from absolute path to node. Directories are explicit
//! entries; every file and directory must have a directory parent, except
//! for top-level roots created through [`ContentFs::create_dir_all`].

use super::{ContentFs, DirEntry};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::{
    collections::BTreeMap,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Dir,
    File(String),
}

/// Thread-safe in-memory [`ContentFs`], used for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryFs {
    nodes: Mutex<BTreeMap<PathBuf, Node>>,
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(ErrorKind::NotFound, format!("{} does not exist", path.display()))
}

fn already_exists(path: &Path) -> io::Error {
    io::Error::new(ErrorKind::AlreadyExists, format!("{} already exists", path.display()))
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file, creating missing parent directories.
    pub fn insert_file(&self, path: impl AsRef<Path>, contents: &str) {
        let path = path.as_ref();
        let mut nodes = self.nodes.lock();
        if let Some(parent) = path.parent() {
            for dir in parent.ancestors() {
                if dir.as_os_str().is_empty() {
                    continue;
                }
                nodes.entry(dir.to_path_buf()).or_insert(Node::Dir);
            }
        }
        nodes.insert(path.to_path_buf(), Node::File(contents.to_owned()));
    }

    /// Snapshot of every stored file path, sorted.
    pub fn files(&self) -> Vec<PathBuf> {
        self.nodes
            .lock()
            .iter()
            .filter(|(_, node)| matches!(node, Node::File(_)))
            .map(|(path, _)| path.clone())
            .collect()
    }

    fn has_children(nodes: &BTreeMap<PathBuf, Node>, path: &Path) -> bool {
        nodes.keys().any(|p| p.parent() == Some(path))
    }

    fn require_dir(nodes: &BTreeMap<PathBuf, Node>, path: &Path) -> io::Result<()> {
        match nodes.get(path) {
            Some(Node::Dir) => Ok(()),
            Some(Node::File(_)) => Err(io::Error::new(
                ErrorKind::NotADirectory,
                format!("{} is not a directory", path.display()),
            )),
            None => Err(not_found(path)),
        }
    }

    fn require_parent(nodes: &BTreeMap<PathBuf, Node>, path: &Path) -> io::Result<()> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => Self::require_dir(nodes, parent),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl ContentFs for MemoryFs {
    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut nodes = self.nodes.lock();
        let missing: Vec<_> = path
            .ancestors()
            .filter(|dir| !dir.as_os_str().is_empty())
            .take_while(|dir| !nodes.contains_key(*dir))
            .map(Path::to_path_buf)
            .collect();

        if let Some(existing) = path.ancestors().nth(missing.len())
            && !existing.as_os_str().is_empty()
        {
            Self::require_dir(&nodes, existing)?;
        }

        for dir in missing {
            nodes.insert(dir, Node::Dir);
        }
        Ok(())
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let nodes = self.nodes.lock();
        Self::require_dir(&nodes, path)?;

        Ok(nodes
            .iter()
            .filter(|(p, _)| p.parent() == Some(path))
            .filter_map(|(p, node)| {
                let name = p.file_name()?.to_string_lossy().into_owned();
                Some(DirEntry {
                    name,
                    is_dir: matches!(node, Node::Dir),
                })
            })
            .collect())
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        match self.nodes.lock().get(path) {
            Some(Node::File(contents)) => Ok(contents.clone()),
            Some(Node::Dir) => Err(io::Error::new(
                ErrorKind::IsADirectory,
                format!("{} is a directory", path.display()),
            )),
            None => Err(not_found(path)),
        }
    }

    async fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        let mut nodes = self.nodes.lock();
        Self::require_parent(&nodes, path)?;
        if matches!(nodes.get(path), Some(Node::Dir)) {
            return Err(io::Error::new(
                ErrorKind::IsADirectory,
                format!("{} is a directory", path.display()),
            ));
        }
        nodes.insert(path.to_path_buf(), Node::File(contents.to_owned()));
        Ok(())
    }

    async fn exists(&self, path: &Path) -> io::Result<bool> {
        Ok(self.nodes.lock().contains_key(path))
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut nodes = self.nodes.lock();
        if !nodes.contains_key(from) {
            return Err(not_found(from));
        }
        Self::require_parent(&nodes, to)?;
        if to.starts_with(from) && to != from {
            return Err(io::Error::new(
                ErrorKind::InvalidInput,
                format!("cannot move {} into itself", from.display()),
            ));
        }
        match nodes.get(to) {
            Some(Node::Dir) if Self::has_children(&nodes, to) => {
                return Err(io::Error::new(
                    ErrorKind::DirectoryNotEmpty,
                    format!("{} is not empty", to.display()),
                ));
            }
            Some(Node::File(_)) if matches!(nodes.get(from), Some(Node::Dir)) => {
                return Err(already_exists(to));
            }
            _ => {}
        }

        let moved: Vec<_> = nodes
            .keys()
            .filter(|p| p.starts_with(from))
            .cloned()
            .collect();
        for old in moved {
            if let Some(node) = nodes.remove(&old) {
                let suffix = old.strip_prefix(from).unwrap_or(Path::new(""));
                let new = if suffix.as_os_str().is_empty() {
                    to.to_path_buf()
                } else {
                    to.join(suffix)
                };
                nodes.insert(new, node);
            }
        }
        Ok(())
    }

    async fn remove_dir(&self, path: &Path) -> io::Result<()> {
        let mut nodes = self.nodes.lock();
        Self::require_dir(&nodes, path)?;
        if Self::has_children(&nodes, path) {
            return Err(io::Error::new(
                ErrorKind::DirectoryNotEmpty,
                format!("{} is not empty", path.display()),
            ));
        }
        nodes.remove(path);
        Ok(())
    }

    async fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut nodes = self.nodes.lock();
        Self::require_dir(&nodes, path)?;
        nodes.retain(|p, _| !p.starts_with(path));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_dir_all_and_read_dir() {
        let fs = MemoryFs::new();
        fs.create_dir_all(Path::new("/site/films/x")).await.unwrap();
        fs.write(Path::new("/site/films/x/index.txt"), "title: X")
            .await
            .unwrap();

        let entries = fs.read_dir(Path::new("/site/films/x")).await.unwrap();
        assert_eq!(
            entries,
            vec![DirEntry {
                name: "index.txt".into(),
                is_dir: false
            }]
        );
        assert!(fs.exists(Path::new("/site/films")).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_dir_all_is_idempotent() {
        let fs = MemoryFs::new();
        fs.create_dir_all(Path::new("/site/a")).await.unwrap();
        fs.create_dir_all(Path::new("/site/a")).await.unwrap();
        fs.create_dir_all(Path::new("/site")).await.unwrap();
        assert_eq!(fs.read_dir(Path::new("/site")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_dir_all_through_file_fails() {
        let fs = MemoryFs::new();
        fs.insert_file("/site/a", "not a dir");
        let err = fs.create_dir_all(Path::new("/site/a/b")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotADirectory);
    }

    #[tokio::test]
    async fn test_write_requires_parent() {
        let fs = MemoryFs::new();
        fs.create_dir_all(Path::new("/site")).await.unwrap();
        let err = fs
            .write(Path::new("/site/missing/index.txt"), "x")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let fs = MemoryFs::new();
        let err = fs.read_to_string(Path::new("/nope")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_rename_moves_subtree() {
        let fs = MemoryFs::new();
        fs.insert_file("/site/a/index.txt", "title: A");
        fs.insert_file("/site/a/child/index.txt", "title: Child");
        fs.create_dir_all(Path::new("/site/b")).await.unwrap();

        fs.rename(Path::new("/site/a"), Path::new("/site/b/a"))
            .await
            .unwrap();

        assert_eq!(
            fs.files(),
            vec![
                PathBuf::from("/site/b/a/child/index.txt"),
                PathBuf::from("/site/b/a/index.txt"),
            ]
        );
        assert!(!fs.exists(Path::new("/site/a")).await.unwrap());
    }

    #[tokio::test]
    async fn test_rename_onto_empty_dir() {
        let fs = MemoryFs::new();
        fs.insert_file("/site/a/index.txt", "title: A");
        fs.create_dir_all(Path::new("/site/b")).await.unwrap();
        fs.rename(Path::new("/site/a"), Path::new("/site/b"))
            .await
            .unwrap();
        assert_eq!(fs.files(), vec![PathBuf::from("/site/b/index.txt")]);
    }

    #[tokio::test]
    async fn test_rename_onto_non_empty_dir_fails() {
        let fs = MemoryFs::new();
        fs.insert_file("/site/a/index.txt", "title: A");
        fs.insert_file("/site/b/index.txt", "title: B");
        let err = fs
            .rename(Path::new("/site/a"), Path::new("/site/b"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DirectoryNotEmpty);
    }

    #[tokio::test]
    async fn test_rename_into_itself_fails() {
        let fs = MemoryFs::new();
        fs.insert_file("/site/a/index.txt", "title: A");
        let err = fs
            .rename(Path::new("/site/a"), Path::new("/site/a/b"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_remove_dir_requires_empty() {
        let fs = MemoryFs::new();
        fs.insert_file("/site/a/index.txt", "title: A");
        let err = fs.remove_dir(Path::new("/site/a")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DirectoryNotEmpty);

        fs.create_dir_all(Path::new("/site/empty")).await.unwrap();
        fs.remove_dir(Path::new("/site/empty")).await.unwrap();
        assert!(!fs.exists(Path::new("/site/empty")).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_dir_all() {
        let fs = MemoryFs::new();
        fs.insert_file("/site/a/index.txt", "title: A");
        fs.insert_file("/site/a/b/index.txt", "title: B");
        fs.insert_file("/site/ab/index.txt", "title: AB");

        fs.remove_dir_all(Path::new("/site/a")).await.unwrap();
        assert_eq!(fs.files(), vec![PathBuf::from("/site/ab/index.txt")]);
    }
}
