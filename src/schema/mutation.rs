//! Mutation root.
//!
//! | Field | Arguments | Behavior |
//! |-------|-----------|----------|
//! | `create<T>` | `url`, `content: <T>Input` | new page, fails if it exists |
//! | `edit<T>` | `url`, `content: <T>Input!` | merge into an existing page |
//! | `write<T>` | `url`, `content: <T>Input` | replace or create |
//! | `rename` | `from`, `to` | move a page directory |
//! | `delete` | `url` | remove a page directory |

use super::{
    model::{PageType, PageTypes},
    types::{self, PAGE},
};
use crate::content::{Content, ContentStore, Page};
use async_graphql::{
    ErrorExtensions,
    dynamic::{Field, FieldFuture, FieldValue, InputValue, Object, TypeRef},
};
use std::sync::Arc;

pub const MUTATION: &str = "Mutation";

pub fn root(types: &Arc<PageTypes>, store: &Arc<ContentStore>) -> Object {
    let mutation = types.iter().fold(Object::new(MUTATION), |mutation, ty| {
        [WriteMode::Create, WriteMode::Edit, WriteMode::Write]
            .into_iter()
            .fold(mutation, |mutation, mode| {
                mutation.field(page_write(mode, ty, store))
            })
    });

    mutation.field(rename(types, store)).field(delete(types, store))
}

// ============================================================================
// Typed page mutations
// ============================================================================

/// Which store operation a typed page mutation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    Create,
    Edit,
    Write,
}

impl WriteMode {
    fn field_name(self, ty: &PageType) -> String {
        match self {
            Self::Create => ty.create_field(),
            Self::Edit => ty.edit_field(),
            Self::Write => ty.write_field(),
        }
    }

    /// `content` is only required when editing.
    fn input(self, ty: &PageType) -> TypeRef {
        match self {
            Self::Edit => TypeRef::named_nn(ty.input_name()),
            Self::Create | Self::Write => TypeRef::named(ty.input_name()),
        }
    }

    fn description(self, ty: &PageType) -> String {
        let name = &ty.name;
        match self {
            Self::Create => {
                format!("Create a `{name}` page. Fails if a page already exists at `url`.")
            }
            Self::Edit => format!(
                "Update an existing page and set its type to `{name}`. Omitted fields are kept, null clears a field."
            ),
            Self::Write => {
                format!("Replace the page at `url` with a `{name}` page, creating it if needed.")
            }
        }
    }

    async fn apply(
        self,
        store: &ContentStore,
        url: &str,
        kind: &str,
        content: &Content,
    ) -> crate::Result<Option<Page>> {
        match self {
            Self::Create => store.create(url, kind, content).await,
            Self::Edit => store.edit(url, kind, content).await,
            Self::Write => store.write(url, kind, content).await,
        }
    }
}

/// `create<T>`, `edit<T>` or `write<T>`, returning the page as `T`.
fn page_write(mode: WriteMode, ty: &PageType, store: &Arc<ContentStore>) -> Field {
    let store = store.clone();
    let kind = ty.name.clone();

    Field::new(mode.field_name(ty), TypeRef::named(&ty.name), move |ctx| {
        let store = store.clone();
        let kind = kind.clone();
        FieldFuture::new(async move {
            let url = ctx.args.try_get("url")?.string()?;
            let content = types::content_arg(&ctx)?;
            let page = mode
                .apply(&store, url, &kind, &content)
                .await
                .map_err(|err| err.extend())?;
            Ok(page.map(FieldValue::owned_any))
        })
    })
    .argument(InputValue::new("url", TypeRef::named_nn(TypeRef::STRING)))
    .argument(InputValue::new("content", mode.input(ty)))
    .description(mode.description(ty))
}

// ============================================================================
// Untyped mutations
// ============================================================================

/// `rename(from: String!, to: String!): Page`
fn rename(types: &Arc<PageTypes>, store: &Arc<ContentStore>) -> Field {
    let types = types.clone();
    let store = store.clone();

    Field::new("rename", TypeRef::named(PAGE), move |ctx| {
        let types = types.clone();
        let store = store.clone();
        FieldFuture::new(async move {
            let from = ctx.args.try_get("from")?.string()?;
            let to = ctx.args.try_get("to")?.string()?;
            let page = store.rename(from, to).await.map_err(|err| err.extend())?;
            Ok(page.map(|page| types::page_value(page, &types)))
        })
    })
    .argument(InputValue::new("from", TypeRef::named_nn(TypeRef::STRING)))
    .argument(InputValue::new("to", TypeRef::named_nn(TypeRef::STRING)))
    .description("Move a page, and every page below it, to a new URL.")
}

/// `delete(url: String!): Page`
fn delete(types: &Arc<PageTypes>, store: &Arc<ContentStore>) -> Field {
    let types = types.clone();
    let store = store.clone();

    Field::new("delete", TypeRef::named(PAGE), move |ctx| {
        let types = types.clone();
        let store = store.clone();
        FieldFuture::new(async move {
            let url = ctx.args.try_get("url")?.string()?;
            let page = store.delete(url).await.map_err(|err| err.extend())?;
            Ok(page.map(|page| types::page_value(page, &types)))
        })
    })
    .argument(InputValue::new("url", TypeRef::named_nn(TypeRef::STRING)))
    .description("Delete a page and every page below it. Returns the deleted page.")
}
