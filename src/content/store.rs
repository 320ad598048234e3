//! In-memory content store.
//!
//! Holds an immutable [`Snapshot`] of every page under the content root.
//! Mutations never patch a snapshot: they rebuild one from disk and swap it
//! in with `arc-swap`, so readers always see a complete tree.
//!
//! ```text
//!   resolver ──► snapshot() ──► Arc<Snapshot>   (lock-free load)
//!   mutation ──► reload()   ──► walk + parse ──► store(Arc::new(..))
//! ```

use super::{CONTENT_FILE, Page, codec};
use crate::{
    error::{Error, Result},
    fs::ContentFs,
    utils::url::{self, PageLocation},
};
use arc_swap::ArcSwap;
use std::{
    cmp::Ordering,
    collections::BTreeMap,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Order pages ascending by `order`; pages without one go last.
pub fn compare_by_order(a: &Page, b: &Page) -> Ordering {
    match (a.order(), b.order()) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// All pages keyed by canonical URL.
#[derive(Debug, Default, Clone)]
pub struct Snapshot {
    pages: BTreeMap<String, Page>,
}

impl Snapshot {
    pub fn get(&self, url: &str) -> Option<&Page> {
        self.pages.get(url)
    }

    /// Every page, in URL order.
    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.values()
    }

    /// Pages whose stored type is `kind`, sorted by [`compare_by_order`].
    ///
    /// The sort is stable, ties keep URL order.
    pub fn of_kind(&self, kind: &str) -> Vec<&Page> {
        let mut pages: Vec<_> = self
            .pages
            .values()
            .filter(|page| page.kind() == Some(kind))
            .collect();
        pages.sort_by(|a, b| compare_by_order(a, b));
        pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl FromIterator<Page> for Snapshot {
    fn from_iter<I: IntoIterator<Item = Page>>(iter: I) -> Self {
        Self {
            pages: iter
                .into_iter()
                .map(|page| (page.url().to_owned(), page))
                .collect(),
        }
    }
}

// ============================================================================
// Store
// ============================================================================

/// Content root, filesystem capability and the current snapshot.
pub struct ContentStore {
    root: PathBuf,
    fs: Arc<dyn ContentFs>,
    snapshot: ArcSwap<Snapshot>,
}

impl std::fmt::Debug for ContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentStore")
            .field("root", &self.root)
            .field("pages", &self.snapshot.load().len())
            .finish_non_exhaustive()
    }
}

impl ContentStore {
    /// Load every page under `root`.
    pub async fn open(root: impl Into<PathBuf>, fs: Arc<dyn ContentFs>) -> Result<Self> {
        let root = root.into();
        let snapshot = read_site(&root, fs.as_ref()).await?;

        Ok(Self {
            root,
            fs,
            snapshot: ArcSwap::from_pointee(snapshot),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) fn fs(&self) -> &dyn ContentFs {
        self.fs.as_ref()
    }

    /// Current snapshot. Cheap; hold it for a consistent view across reads.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.load_full()
    }

    /// Normalize `raw` and resolve its location under the content root.
    pub fn locate(&self, raw: &str) -> Result<PageLocation> {
        url::locate(&self.root, raw)
    }

    /// Look up a page by a raw (not yet normalized) URL.
    pub fn get(&self, raw: &str) -> Result<Option<Page>> {
        let url = url::normalize_url(raw)?;
        Ok(self.snapshot.load().get(&url).cloned())
    }

    /// Re-read the whole tree and replace the snapshot.
    pub async fn reload(&self) -> Result<()> {
        let snapshot = read_site(&self.root, self.fs.as_ref()).await?;
        self.snapshot.store(Arc::new(snapshot));
        Ok(())
    }
}

/// Walk `root` and parse every `index.txt` found.
async fn read_site(root: &Path, fs: &dyn ContentFs) -> Result<Snapshot> {
    let dirs = fs.walk_dirs(root).await.map_err(Error::io(root))?;
    let mut pages = Vec::with_capacity(dirs.len());

    for dir in dirs {
        let file = dir.join(CONTENT_FILE);
        let text = match fs.read_to_string(&file).await {
            Ok(text) => text,
            Err(err) if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::IsADirectory) => {
                continue;
            }
            Err(err) => return Err(Error::Io(file, err)),
        };

        if let Some(url) = url::url_for_dir(root, &dir) {
            pages.push(Page::new(url, codec::parse(&text)));
        }
    }

    Ok(pages.into_iter().collect())
}
