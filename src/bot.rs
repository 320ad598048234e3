//! Entry point tying the schema model, the content store and the executable
//! schema together.

use crate::{
    content::ContentStore,
    error::{Error, Result},
    fs::{ContentFs, OsFs},
    log,
    schema::{self, PageTypes},
};
use async_graphql::{Response, dynamic::{DynamicRequest, Schema}};
use std::{path::PathBuf, sync::Arc};

/// A loaded site with its executable GraphQL schema.
pub struct Contentbot {
    types: Arc<PageTypes>,
    store: Arc<ContentStore>,
    schema: Schema,
}

impl std::fmt::Debug for Contentbot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Contentbot")
            .field("types", &self.types.len())
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl Contentbot {
    pub fn builder() -> ContentbotBuilder {
        ContentbotBuilder::default()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Generated schema in SDL.
    pub fn sdl(&self) -> String {
        self.schema.sdl()
    }

    pub fn types(&self) -> &PageTypes {
        &self.types
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    /// Execute a single GraphQL request.
    pub async fn execute(&self, request: impl Into<DynamicRequest>) -> Response {
        self.schema.execute(request).await
    }
}

/// Options for [`Contentbot`].
///
/// Exactly one of [`schema`](Self::schema) and [`schema_path`](Self::schema_path)
/// must be set, and [`content_path`](Self::content_path) is required.
#[derive(Default)]
pub struct ContentbotBuilder {
    schema: Option<String>,
    schema_path: Option<PathBuf>,
    content_path: Option<PathBuf>,
    fs: Option<Arc<dyn ContentFs>>,
}

impl ContentbotBuilder {
    /// Base schema source.
    pub fn schema(mut self, sdl: impl Into<String>) -> Self {
        self.schema = Some(sdl.into());
        self
    }

    /// File holding the base schema, read through the configured filesystem.
    pub fn schema_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_path = Some(path.into());
        self
    }

    /// Content root.
    pub fn content_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.content_path = Some(path.into());
        self
    }

    /// Filesystem backing the content root. Defaults to [`OsFs`].
    pub fn fs(mut self, fs: Arc<dyn ContentFs>) -> Self {
        self.fs = Some(fs);
        self
    }

    /// Validate the options, derive the schema and load every page.
    pub async fn build(self) -> Result<Contentbot> {
        let fs = self.fs.unwrap_or_else(|| Arc::new(OsFs));

        let source = match (self.schema, self.schema_path) {
            (Some(source), None) => source,
            (None, Some(path)) => fs.read_to_string(&path).await.map_err(Error::io(&path))?,
            (Some(_), Some(_)) => {
                return Err(Error::invalid(
                    "`schema` and `schema_path` are mutually exclusive",
                ));
            }
            (None, None) => {
                return Err(Error::invalid("one of `schema` or `schema_path` is required"));
            }
        };
        let content_path = self
            .content_path
            .ok_or_else(|| Error::invalid("`content_path` is required"))?;

        let types = Arc::new(PageTypes::parse(&source)?);
        log!("schema"; "derived {} page types", types.len());

        let store = Arc::new(ContentStore::open(content_path, fs).await?);
        log!("store"; "loaded {} pages from {}", store.snapshot().len(), store.root().display());

        let schema = schema::build(types.clone(), store.clone())?;

        Ok(Contentbot {
            types,
            store,
            schema,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFs;
    use tempfile::TempDir;

    fn memory_fs() -> Arc<MemoryFs> {
        let fs = MemoryFs::new();
        fs.insert_file("/site/site.graphql", "type About { bio: String }");
        fs.insert_file("/site/content/index.txt", "title: Home");
        fs.insert_file("/site/content/about/index.txt", "type: About\n----\nbio: Hi");
        Arc::new(fs)
    }

    #[tokio::test]
    async fn test_build_from_inline_schema() {
        let bot = Contentbot::builder()
            .schema("type About { bio: String }")
            .content_path("/site/content")
            .fs(memory_fs())
            .build()
            .await
            .unwrap();

        assert_eq!(bot.types().len(), 1);
        assert_eq!(bot.store().snapshot().len(), 2);
        assert!(bot.sdl().contains("allAbouts"));

        let response = bot.execute("{ allAbouts { url bio } }").await;
        assert!(response.errors.is_empty());
        let data = response.data.into_json().unwrap();
        assert_eq!(data["allAbouts"][0]["bio"], "Hi");
    }

    #[tokio::test]
    async fn test_build_from_schema_path() {
        let bot = Contentbot::builder()
            .schema_path("/site/site.graphql")
            .content_path("/site/content")
            .fs(memory_fs())
            .build()
            .await
            .unwrap();
        assert!(bot.types().contains("About"));
    }

    #[tokio::test]
    async fn test_build_rejects_conflicting_schema_sources() {
        let err = Contentbot::builder()
            .schema("type A { a: String }")
            .schema_path("/site/site.graphql")
            .content_path("/site/content")
            .fs(memory_fs())
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_build_requires_schema_and_content() {
        let err = Contentbot::builder()
            .content_path("/site/content")
            .fs(memory_fs())
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = Contentbot::builder()
            .schema("type A { a: String }")
            .fs(memory_fs())
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_build_missing_schema_file() {
        let err = Contentbot::builder()
            .schema_path("/site/missing.graphql")
            .content_path("/site/content")
            .fs(memory_fs())
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(..)));
    }

    #[tokio::test]
    async fn test_build_on_disk() {
        let dir = TempDir::new().unwrap();
        let content = dir.path().join("content");
        std::fs::create_dir_all(&content).unwrap();
        std::fs::write(content.join("index.txt"), "title: Home").unwrap();

        let bot = Contentbot::builder()
            .schema("type Film { role: String }")
            .content_path(&content)
            .build()
            .await
            .unwrap();

        let response = bot
            .execute(r#"mutation { createFilm(url: "films/x", content: { title: "X" }) { url } }"#)
            .await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        assert!(content.join("films/x/index.txt").is_file());
    }
}
