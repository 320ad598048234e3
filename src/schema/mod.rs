//! GraphQL schema derived from a base schema of page types.
//!
//! Every object type `T` of the base schema becomes a page type:
//!
//! ```text
//! type Film { role: String }
//!     │
//!     ├─► type Film implements Page { url, title, order, role }
//!     ├─► input FilmInput { title, order, role }
//!     ├─► Query.allFilms: [Film]
//!     └─► Mutation.createFilm / editFilm / writeFilm
//! ```
//!
//! plus the fixed `Page`, `GenericPage` and `Field` types, the `fields`,
//! `page` and `pages` queries and the `rename` and `delete` mutations.

pub mod model;
mod mutation;
mod query;
mod types;

pub use model::{FieldDescriptor, PageType, PageTypes};
pub use types::{GENERIC_PAGE, PAGE};

use crate::{
    content::ContentStore,
    error::{Error, Result},
};
use async_graphql::dynamic::Schema;
use std::sync::Arc;

/// Build the executable schema over `store`.
pub fn build(types: Arc<PageTypes>, store: Arc<ContentStore>) -> Result<Schema> {
    let builder = Schema::build(query::QUERY, Some(mutation::MUTATION), None)
        .register(types::page_interface())
        .register(types::generic_page())
        .register(types::field_descriptor());

    let builder = types.iter().fold(builder, |builder, ty| {
        builder
            .register(types::page_object(ty))
            .register(types::page_input(ty))
    });

    builder
        .register(query::root(&types, &store))
        .register(mutation::root(&types, &store))
        .finish()
        .map_err(|err| Error::Schema(err.to_string()))
}
