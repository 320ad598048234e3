//! Page URL normalization.
//!
//! Turns user-supplied URLs into canonical URL keys and page directories
//! that never leave the content root.

use crate::content::CONTENT_FILE;
use crate::error::{Error, Result};
use crate::fs::is_hidden;
use std::path::{Path, PathBuf};

/// Canonical URL plus the matching directory under the content root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    /// Canonical URL, e.g. `/films/x`. The root page is `/`.
    pub url: String,

    /// Page directory, e.g. `<root>/films/x`.
    pub dir: PathBuf,
}

impl PageLocation {
    /// Path of the page's content file.
    pub fn file(&self) -> PathBuf {
        self.dir.join(CONTENT_FILE)
    }

    pub fn is_root(&self) -> bool {
        self.url == "/"
    }
}

/// Resolve a raw URL into its path segments.
///
/// Both `/` and `\` separate segments. Empty and `.` segments are dropped,
/// `..` pops the previous segment and stops at the root. Other dot-prefixed
/// segments are rejected: content walks skip hidden directories.
fn segments(raw: &str) -> Result<Vec<&str>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::invalid("url must not be empty"));
    }

    let mut segments = Vec::new();
    for segment in raw.split(['/', '\\']).map(str::trim) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment if is_hidden(segment) => {
                return Err(Error::invalid(format!(
                    "url segment `{segment}` must not start with `.`"
                )));
            }
            segment => segments.push(segment),
        }
    }
    Ok(segments)
}

/// Canonical URL for a raw URL.
///
/// # Examples
///
/// | Input | Output |
/// |-------|--------|
/// | `films/x` | `/films/x` |
/// | ` /films//x/ ` | `/films/x` |
/// | `/../../etc` | `/etc` |
/// | `/` | `/` |
pub fn normalize_url(raw: &str) -> Result<String> {
    Ok(format!("/{}", segments(raw)?.join("/")))
}

/// Canonical URL and directory for a raw URL under `root`.
pub fn locate(root: &Path, raw: &str) -> Result<PageLocation> {
    let segments = segments(raw)?;
    let dir = segments
        .iter()
        .fold(root.to_path_buf(), |dir, segment| dir.join(segment));

    Ok(PageLocation {
        url: format!("/{}", segments.join("/")),
        dir,
    })
}

/// Canonical URL of a page directory found while walking `root`.
pub fn url_for_dir(root: &Path, dir: &Path) -> Option<String> {
    let relative = dir.strip_prefix(root).ok()?;
    let segments: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    Some(format!("/{}", segments.join("/")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_adds_leading_slash() {
        assert_eq!(normalize_url("films/x").unwrap(), "/films/x");
    }

    #[test]
    fn test_normalize_trims_and_collapses() {
        assert_eq!(normalize_url("  /films//x/  ").unwrap(), "/films/x");
        assert_eq!(normalize_url("/films/ x /").unwrap(), "/films/x");
    }

    #[test]
    fn test_normalize_root() {
        assert_eq!(normalize_url("/").unwrap(), "/");
        assert_eq!(normalize_url("  /  ").unwrap(), "/");
        assert_eq!(normalize_url(".").unwrap(), "/");
    }

    #[test]
    fn test_normalize_resolves_dots() {
        assert_eq!(normalize_url("/films/./x/../y").unwrap(), "/films/y");
    }

    #[test]
    fn test_normalize_cannot_escape_root() {
        assert_eq!(normalize_url("/../../etc/passwd").unwrap(), "/etc/passwd");
        assert_eq!(normalize_url("..").unwrap(), "/");
        assert_eq!(normalize_url("..\\..\\windows").unwrap(), "/windows");
    }

    #[test]
    fn test_normalize_rejects_empty() {
        assert!(matches!(normalize_url(""), Err(Error::InvalidInput(_))));
        assert!(matches!(normalize_url(" \t\n"), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_normalize_rejects_hidden_segments() {
        for raw in ["/.drafts/x", "films/.x", "/a/.../b", "\\.git"] {
            assert!(
                matches!(normalize_url(raw), Err(Error::InvalidInput(_))),
                "input: {raw:?}"
            );
        }
        assert!(locate(Path::new("/srv/content"), "/.drafts").is_err());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["films/x", " /a/../b/ ", "/", "..", "/a//b/./c", "/a\\b"] {
            let once = normalize_url(raw).unwrap();
            assert_eq!(normalize_url(&once).unwrap(), once, "input: {raw:?}");
        }
    }

    #[test]
    fn test_locate_stays_under_root() {
        let root = Path::new("/srv/content");
        let location = locate(root, "/../../../etc/passwd").unwrap();
        assert_eq!(location.url, "/etc/passwd");
        assert_eq!(location.dir, PathBuf::from("/srv/content/etc/passwd"));
        assert!(location.dir.starts_with(root));
    }

    #[test]
    fn test_locate_root_page() {
        let root = Path::new("/srv/content");
        let location = locate(root, "/").unwrap();
        assert!(location.is_root());
        assert_eq!(location.dir, root);
        assert_eq!(location.file(), root.join("index.txt"));
    }

    #[test]
    fn test_url_for_dir() {
        let root = Path::new("/srv/content");
        assert_eq!(url_for_dir(root, root).as_deref(), Some("/"));
        assert_eq!(
            url_for_dir(root, &root.join("films/x")).as_deref(),
            Some("/films/x")
        );
        assert_eq!(url_for_dir(root, Path::new("/elsewhere")), None);
    }
}
