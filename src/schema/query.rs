//! Query root: `all<T>s`, `fields`, `page` and `pages`.

use super::{
    model::PageTypes,
    types::{self, FIELD, PAGE},
};
use crate::{content::ContentStore, error::Error};
use async_graphql::{
    ErrorExtensions,
    dynamic::{Field, FieldFuture, FieldValue, InputValue, Object, TypeRef},
};
use std::sync::Arc;

pub const QUERY: &str = "Query";

pub fn root(types: &Arc<PageTypes>, store: &Arc<ContentStore>) -> Object {
    let query = types.iter().fold(Object::new(QUERY), |query, ty| {
        query.field(all_pages_of(&ty.name, store))
    });

    query
        .field(fields(types))
        .field(page(types, store))
        .field(pages(types, store))
}

/// `all<T>s: [T]`, sorted by `order` with unordered pages last.
fn all_pages_of(type_name: &str, store: &Arc<ContentStore>) -> Field {
    let store = store.clone();
    let kind = type_name.to_owned();
    let field_name = format!("all{type_name}s");

    Field::new(field_name, TypeRef::named_list(type_name), move |_| {
        let store = store.clone();
        let kind = kind.clone();
        FieldFuture::new(async move {
            let snapshot = store.snapshot();
            let pages = snapshot
                .of_kind(&kind)
                .into_iter()
                .map(|page| FieldValue::owned_any(page.clone()))
                .collect::<Vec<_>>();
            Ok(Some(FieldValue::list(pages)))
        })
    })
    .description(format!("All pages of type `{type_name}`."))
}

/// `fields(type: String!): [Field]`
fn fields(types: &Arc<PageTypes>) -> Field {
    let types = types.clone();

    Field::new("fields", TypeRef::named_list(FIELD), move |ctx| {
        let types = types.clone();
        FieldFuture::new(async move {
            let name = ctx.args.try_get("type")?.string()?;
            let ty = types.get(name).ok_or_else(|| {
                Error::invalid(format!("type `{name}` is not a page type")).extend()
            })?;
            let descriptors = ty.descriptors().into_iter().map(FieldValue::owned_any);
            Ok(Some(FieldValue::list(descriptors)))
        })
    })
    .argument(InputValue::new("type", TypeRef::named_nn(TypeRef::STRING)))
    .description("Editable fields of a page type, for building content editors.")
}

/// `page(url: String!): Page`
fn page(types: &Arc<PageTypes>, store: &Arc<ContentStore>) -> Field {
    let types = types.clone();
    let store = store.clone();

    Field::new("page", TypeRef::named(PAGE), move |ctx| {
        let types = types.clone();
        let store = store.clone();
        FieldFuture::new(async move {
            let url = ctx.args.try_get("url")?.string()?;
            let page = store.get(url).map_err(|err| err.extend())?;
            Ok(page.map(|page| types::page_value(page, &types)))
        })
    })
    .argument(InputValue::new("url", TypeRef::named_nn(TypeRef::STRING)))
    .description("The page at `url`, or null.")
}

/// `pages: [Page]`, in URL order.
fn pages(types: &Arc<PageTypes>, store: &Arc<ContentStore>) -> Field {
    let types = types.clone();
    let store = store.clone();

    Field::new("pages", TypeRef::named_list(PAGE), move |_| {
        let types = types.clone();
        let store = store.clone();
        FieldFuture::new(async move {
            let snapshot = store.snapshot();
            let pages = snapshot
                .pages()
                .map(|page| types::page_value(page.clone(), &types))
                .collect::<Vec<_>>();
            Ok(Some(FieldValue::list(pages)))
        })
    })
    .description("Every page under the content root.")
}
