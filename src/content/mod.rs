//! Flat-file content: page records, the `index.txt` codec, the in-memory
//! store and the mutation engine.
//!
//! # On-disk layout
//!
//! ```text
//! content/
//! ├── index.txt              → "/"
//! ├── about/
//! │   └── index.txt          → "/about"
//! └── films/
//!     └── national-youth-orchestra/
//!         └── index.txt      → "/films/national-youth-orchestra"
//! ```
//!
//! Any directory holding an `index.txt` is a page; `films/` above is not.

pub mod codec;
mod mutation;
mod store;

pub use mutation::Content;
pub use store::{ContentStore, Snapshot};

/// Fixed name of the content file inside a page directory.
pub const CONTENT_FILE: &str = "index.txt";

/// Stored discriminator naming the page type.
pub const TYPE_FIELD: &str = "type";

// ============================================================================
// Fields
// ============================================================================

/// Ordered raw key/value fields of a content file.
///
/// Lookups try the exact key first and then an ASCII case-insensitive match,
/// so files written by tools that fold key case still resolve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields(Vec<(String, String)>);

impl Fields {
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.0
            .iter()
            .position(|(k, _)| k == key)
            .or_else(|| self.0.iter().position(|(k, _)| k.eq_ignore_ascii_case(key)))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.position(key).map(|i| self.0[i].1.as_str())
    }

    /// Insert or replace a field. A case-insensitive match is replaced and
    /// takes the new key spelling.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(i) => self.0[i] = (key, value),
            None => self.0.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.position(key).map(|i| self.0.remove(i).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Self::new();
        for (key, value) in iter {
            fields.set(key, value);
        }
        fields
    }
}

// ============================================================================
// Page
// ============================================================================

/// A content instance, keyed by its canonical URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    url: String,
    fields: Fields,
}

impl Page {
    pub fn new(url: impl Into<String>, fields: Fields) -> Self {
        Self {
            url: url.into(),
            fields,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Stored page type, `None` when absent or blank.
    pub fn kind(&self) -> Option<&str> {
        self.fields
            .get(TYPE_FIELD)
            .map(str::trim)
            .filter(|kind| !kind.is_empty())
    }

    pub fn title(&self) -> Option<&str> {
        self.fields.get("title")
    }

    /// Sort order; values that are not integers count as absent.
    pub fn order(&self) -> Option<i32> {
        self.fields.get("order")?.trim().parse().ok()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }
}
