//! Output and input types of the generated schema.
//!
//! | Type | Kind | Fields |
//! |------|------|--------|
//! | `Page` | interface | `url`, `title`, `order` |
//! | `GenericPage` | object | `Page` fields only |
//! | `<T>` | object | `Page` fields + declared fields |
//! | `<T>Input` | input | `title`, `order` + declared fields |
//! | `Field` | object | `name`, `type`, `description` |
//!
//! Page resolvers receive a [`Page`] as their parent value and read the
//! stored string, converting it to the declared scalar on the way out.

use super::model::{FieldDef, FieldDescriptor, FieldType, PageType, PageTypes, Scalar};
use crate::{
    content::{Content, Page},
    error::Error,
    log,
};
use async_graphql::{
    ErrorExtensions, Value,
    dynamic::{
        Field, FieldFuture, FieldValue, InputObject, InputValue, Interface, InterfaceField,
        Object, ResolverContext, TypeRef,
    },
};

pub const PAGE: &str = "Page";
pub const GENERIC_PAGE: &str = "GenericPage";
pub const FIELD: &str = "Field";

const URL_DESCRIPTION: &str = "URL of the page, relative to the content root.";
const ORDER_DESCRIPTION: &str =
    "Specifies the sort order of the page. Pages are sorted in ascending order.";

// ============================================================================
// Output types
// ============================================================================

pub fn page_interface() -> Interface {
    Interface::new(PAGE)
        .description("A page of content, stored as a directory with an `index.txt` file.")
        .field(
            InterfaceField::new("url", TypeRef::named_nn(TypeRef::STRING))
                .description(URL_DESCRIPTION),
        )
        .field(InterfaceField::new("title", TypeRef::named(TypeRef::STRING)))
        .field(
            InterfaceField::new("order", TypeRef::named(TypeRef::INT))
                .description(ORDER_DESCRIPTION),
        )
}

/// Page whose stored type is absent or names no page type.
pub fn generic_page() -> Object {
    page_object_base(GENERIC_PAGE)
        .description("A page without a known type. Only the common page fields are exposed.")
}

/// Object type for a declared page type.
pub fn page_object(ty: &PageType) -> Object {
    let object = ty
        .fields
        .iter()
        .fold(page_object_base(&ty.name), |object, def| {
            object.field(declared_field(def))
        });
    match &ty.description {
        Some(description) => object.description(description),
        None => object,
    }
}

fn page_object_base(name: &str) -> Object {
    Object::new(name)
        .implement(PAGE)
        .field(url_field())
        .field(stored_field("title", FieldType { scalar: Scalar::String, required: false }, None))
        .field(order_field())
}

/// `order` resolves to null when the stored value is not an integer, the
/// same way sorting treats it.
fn order_field() -> Field {
    Field::new("order", TypeRef::named(TypeRef::INT), |ctx| {
        FieldFuture::new(async move {
            let page = parent_page(&ctx)?;
            Ok(page.order().map(FieldValue::value))
        })
    })
    .description(ORDER_DESCRIPTION)
}

fn url_field() -> Field {
    Field::new("url", TypeRef::named_nn(TypeRef::STRING), |ctx| {
        FieldFuture::new(async move {
            let page = parent_page(&ctx)?;
            Ok(Some(FieldValue::value(page.url().to_owned())))
        })
    })
    .description(URL_DESCRIPTION)
}

fn declared_field(def: &FieldDef) -> Field {
    stored_field(&def.name, def.ty, def.description.as_deref())
}

/// Field backed by a stored key of the parent page.
fn stored_field(name: &str, ty: FieldType, description: Option<&str>) -> Field {
    let key = name.to_owned();
    let field = Field::new(name, ty.type_ref(), move |ctx| {
        let key = key.clone();
        FieldFuture::new(async move {
            let page = parent_page(&ctx)?;
            let value = page
                .get(&key)
                .map(|raw| ty.scalar.parse(&key, raw))
                .transpose()
                .map_err(|err| err.extend())?;
            Ok(value.map(FieldValue::value))
        })
    });
    match description {
        Some(description) => field.description(description),
        None => field,
    }
}

fn parent_page<'a>(ctx: &ResolverContext<'a>) -> async_graphql::Result<&'a Page> {
    ctx.parent_value.try_downcast_ref::<Page>()
}

/// The `Field` object returned by the `fields` query.
pub fn field_descriptor() -> Object {
    let text = |name: &'static str, nullable: bool| {
        let ty = if nullable {
            TypeRef::named(TypeRef::STRING)
        } else {
            TypeRef::named_nn(TypeRef::STRING)
        };
        Field::new(name, ty, move |ctx| {
            FieldFuture::new(async move {
                let descriptor = ctx.parent_value.try_downcast_ref::<FieldDescriptor>()?;
                let value = match name {
                    "name" => Some(descriptor.name.clone()),
                    "type" => Some(descriptor.kind.clone()),
                    _ => descriptor.description.clone(),
                };
                Ok(value.map(FieldValue::value))
            })
        })
    };

    Object::new(FIELD)
        .description("Describes a page field for content editors.")
        .field(text("name", false))
        .field(text("type", true))
        .field(text("description", true))
}

// ============================================================================
// Input types
// ============================================================================

pub fn page_input(ty: &PageType) -> InputObject {
    let input = InputObject::new(ty.input_name())
        .field(InputValue::new("title", TypeRef::named(TypeRef::STRING)))
        .field(
            InputValue::new("order", TypeRef::named(TypeRef::INT)).description(ORDER_DESCRIPTION),
        );
    ty.fields.iter().fold(input, |input, def| {
        let value = InputValue::new(&def.name, def.ty.type_ref());
        input.field(match &def.description {
            Some(description) => value.description(description),
            None => value,
        })
    })
}

/// Read the `content` argument into a field update.
///
/// Absent keys are untouched, explicit `null` clears a key.
pub fn content_arg(ctx: &ResolverContext<'_>) -> async_graphql::Result<Content> {
    let Some(content) = ctx.args.get("content") else {
        return Ok(Content::new());
    };
    if content.is_null() {
        return Ok(Content::new());
    }

    content
        .object()?
        .iter()
        .map(|(name, value)| -> async_graphql::Result<(String, Option<String>)> {
            let value = input_to_string(name.as_str(), value.as_value())?;
            Ok((name.to_string(), value))
        })
        .collect()
}

fn input_to_string(name: &str, value: &Value) -> async_graphql::Result<Option<String>> {
    Ok(match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Boolean(b) => Some(b.to_string()),
        Value::Enum(e) => Some(e.to_string()),
        _ => {
            return Err(Error::invalid(format!("field `{name}` must be a scalar value")).extend());
        }
    })
}

// ============================================================================
// Page values
// ============================================================================

/// Wrap a page for an abstract `Page` position, picking its concrete type.
pub fn page_value(page: Page, types: &PageTypes) -> FieldValue<'static> {
    let type_name = concrete_type(&page, types);
    FieldValue::owned_any(page).with_type(type_name)
}

fn concrete_type(page: &Page, types: &PageTypes) -> String {
    match page.kind() {
        Some(kind) if types.contains(kind) => kind.to_owned(),
        Some(kind) => {
            log!("warn"; "page type \"{kind}\" of {} does not exist, falling back to a generic page", page.url());
            GENERIC_PAGE.to_owned()
        }
        None => GENERIC_PAGE.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concrete_type() {
        let types = PageTypes::parse("type Film { role: String }").unwrap();
        let page = |kind: Option<&str>| {
            let fields = kind.map(|k| ("type", k)).into_iter().collect();
            Page::new("/x", fields)
        };

        assert_eq!(concrete_type(&page(Some("Film")), &types), "Film");
        assert_eq!(concrete_type(&page(Some("Missing")), &types), GENERIC_PAGE);
        assert_eq!(concrete_type(&page(None), &types), GENERIC_PAGE);
    }

    #[test]
    fn test_input_to_string() {
        assert_eq!(input_to_string("a", &Value::Null).unwrap(), None);
        assert_eq!(
            input_to_string("a", &Value::from("text")).unwrap().as_deref(),
            Some("text")
        );
        assert_eq!(input_to_string("a", &Value::from(3)).unwrap().as_deref(), Some("3"));
        assert_eq!(
            input_to_string("a", &Value::Boolean(false)).unwrap().as_deref(),
            Some("false")
        );
        assert!(input_to_string("a", &Value::List(vec![])).is_err());
    }
}
