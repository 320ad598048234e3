//! Validated page-type model parsed from the base schema.
//!
//! The registry is built once at startup. Field kinds (the strings returned
//! by the `fields` query) are resolved here, so configuration diagnostics
//! are reported once instead of on every request.

use crate::{
    error::{Error, Result},
    log,
};
use async_graphql::{
    Number, Value,
    dynamic::TypeRef,
    parser::{
        parse_schema,
        types::{BaseType, FieldDefinition, TypeDefinition, TypeKind, TypeSystemDefinition},
    },
};
use serde::Serialize;
use std::{collections::BTreeMap, fmt};

/// Directive controlling a field's external kind: `@field(type: "long-text")`.
pub const FIELD_DIRECTIVE: &str = "field";

/// Names the generated schema defines itself.
const RESERVED_TYPE_NAMES: &[&str] = &[
    "Query",
    "Mutation",
    "Subscription",
    "Page",
    "GenericPage",
    "Field",
];

/// Fixed page fields plus the stored discriminator. Stored keys match
/// case-insensitively, so these are compared the same way.
const RESERVED_FIELD_NAMES: &[&str] = &["url", "title", "order", "type"];

/// Fixed field a page type may restate as `title: String`.
const TITLE_FIELD: &str = "title";

const BUILTIN_SCALARS: &[&str] = &["String", "Int", "Float", "Boolean", "ID"];

// ============================================================================
// Field types
// ============================================================================

/// Built-in scalars a flat content file can store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    String,
    Id,
    Int,
    Float,
    Boolean,
}

impl Scalar {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "String" => Some(Self::String),
            "ID" => Some(Self::Id),
            "Int" => Some(Self::Int),
            "Float" => Some(Self::Float),
            "Boolean" => Some(Self::Boolean),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::String => TypeRef::STRING,
            Self::Id => TypeRef::ID,
            Self::Int => TypeRef::INT,
            Self::Float => TypeRef::FLOAT,
            Self::Boolean => TypeRef::BOOLEAN,
        }
    }

    /// Convert a stored string into a GraphQL value of this scalar.
    pub fn parse(self, field: &str, raw: &str) -> Result<Value> {
        let invalid = || {
            Error::invalid(format!(
                "stored value `{raw}` of field `{field}` is not a valid {}",
                self.name()
            ))
        };
        let raw_trimmed = raw.trim();

        Ok(match self {
            Self::String | Self::Id => Value::String(raw.to_owned()),
            Self::Int => {
                let n: i32 = raw_trimmed.parse().map_err(|_| invalid())?;
                Value::Number(Number::from(n))
            }
            Self::Float => {
                let n: f64 = raw_trimmed.parse().map_err(|_| invalid())?;
                Value::Number(Number::from_f64(n).ok_or_else(invalid)?)
            }
            Self::Boolean => match raw_trimmed {
                "true" => Value::Boolean(true),
                "false" => Value::Boolean(false),
                _ => return Err(invalid()),
            },
        })
    }
}

/// Declared type of a page field: a built-in scalar, optionally non-null.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldType {
    pub scalar: Scalar,
    pub required: bool,
}

impl FieldType {
    pub fn type_ref(self) -> TypeRef {
        if self.required {
            TypeRef::named_nn(self.scalar.name())
        } else {
            TypeRef::named(self.scalar.name())
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scalar.name())?;
        if self.required {
            f.write_str("!")?;
        }
        Ok(())
    }
}

// ============================================================================
// Page types
// ============================================================================

/// A declared field of a page type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub ty: FieldType,
    pub description: Option<String>,
    /// External kind reported by the `fields` query.
    pub kind: String,
}

/// Entry of the `fields` query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: Option<String>,
}

impl FieldDescriptor {
    fn new(name: &str, kind: &str, description: Option<&str>) -> Self {
        Self {
            name: name.to_owned(),
            kind: kind.to_owned(),
            description: description.map(str::to_owned),
        }
    }
}

/// A user-defined page type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageType {
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<FieldDef>,
}

impl PageType {
    /// `FilmInput`
    pub fn input_name(&self) -> String {
        format!("{}Input", self.name)
    }

    /// `allFilms`
    pub fn list_field(&self) -> String {
        format!("all{}s", self.name)
    }

    /// `createFilm`
    pub fn create_field(&self) -> String {
        format!("create{}", self.name)
    }

    /// `editFilm`
    pub fn edit_field(&self) -> String {
        format!("edit{}", self.name)
    }

    /// `writeFilm`
    pub fn write_field(&self) -> String {
        format!("write{}", self.name)
    }

    /// Descriptors for the `fields` query: `url`, `title`, then declared fields.
    pub fn descriptors(&self) -> Vec<FieldDescriptor> {
        let mut descriptors = vec![
            FieldDescriptor::new("url", "url", Some("Link")),
            FieldDescriptor::new("title", "text", Some("Title")),
        ];
        descriptors.extend(
            self.fields
                .iter()
                .map(|f| FieldDescriptor::new(&f.name, &f.kind, f.description.as_deref())),
        );
        descriptors
    }
}

/// Registry of page types, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageTypes {
    types: BTreeMap<String, PageType>,
}

impl PageTypes {
    /// Parse and validate a base schema.
    pub fn parse(source: &str) -> Result<Self> {
        let document = parse_schema(source).map_err(|err| Error::Schema(err.to_string()))?;
        let mut types: BTreeMap<String, PageType> = BTreeMap::new();

        for definition in document.definitions {
            let TypeSystemDefinition::Type(definition) = definition else {
                // schema and directive definitions carry nothing we derive from
                continue;
            };
            let definition = definition.node;
            let name = definition.name.node.to_string();

            if BUILTIN_SCALARS.contains(&name.as_str()) {
                continue;
            }
            if RESERVED_TYPE_NAMES.contains(&name.as_str()) {
                return Err(Error::invalid(format!(
                    "type name `{name}` is reserved by the generated schema"
                )));
            }

            let TypeKind::Object(object) = &definition.kind else {
                log!("warn"; "skipping `{name}`: only object types become page types");
                continue;
            };

            let fields = object
                .fields
                .iter()
                .filter_map(|field| field_def(&name, &field.node).transpose())
                .collect::<Result<Vec<_>>>()?;

            match types.get_mut(&name) {
                Some(existing) if definition.extend => existing.fields.extend(fields),
                Some(_) => {
                    return Err(Error::invalid(format!("type `{name}` is defined twice")));
                }
                None => {
                    types.insert(name.clone(), page_type(name, &definition, fields));
                }
            }
        }

        for ty in types.values() {
            if types.contains_key(&ty.input_name()) {
                return Err(Error::invalid(format!(
                    "type `{}` collides with the generated input type of `{}`",
                    ty.input_name(),
                    ty.name
                )));
            }
            let mut seen: Vec<&str> = Vec::with_capacity(ty.fields.len());
            for field in &ty.fields {
                if seen.iter().any(|name| name.eq_ignore_ascii_case(&field.name)) {
                    return Err(Error::invalid(format!(
                        "field `{}.{}` is declared twice (field names are case-insensitive)",
                        ty.name, field.name
                    )));
                }
                seen.push(field.name.as_str());
            }
        }

        Ok(Self { types })
    }

    pub fn get(&self, name: &str) -> Option<&PageType> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Page types in name order.
    pub fn iter(&self) -> impl Iterator<Item = &PageType> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

fn page_type(name: String, definition: &TypeDefinition, fields: Vec<FieldDef>) -> PageType {
    PageType {
        name,
        description: definition.description.as_ref().map(|d| d.node.clone()),
        fields,
    }
}

/// Validate one declared field. A plain `title: String` restates the fixed
/// field and yields `None`.
fn field_def(type_name: &str, field: &FieldDefinition) -> Result<Option<FieldDef>> {
    let name = field.name.node.to_string();
    let declared = &field.ty.node;
    let scalar = match &declared.base {
        BaseType::Named(named) => Scalar::from_name(named.as_str()),
        BaseType::List(_) => None,
    };

    if name == TITLE_FIELD && declared.nullable && scalar == Some(Scalar::String) {
        return Ok(None);
    }
    if is_reserved_field(&name) {
        return Err(Error::invalid(format!(
            "field `{type_name}.{name}` uses a reserved name"
        )));
    }

    let ty = match scalar {
        Some(scalar) => FieldType {
            scalar,
            required: !declared.nullable,
        },
        None => {
            let err = Error::Configuration(format!(
                "unhandled field type `{declared}` of `{type_name}.{name}`"
            ));
            log!("warn"; "{err} - storing it as String");
            FieldType {
                scalar: Scalar::String,
                required: false,
            }
        }
    };

    if !field.arguments.is_empty() {
        log!("warn"; "ignoring arguments of `{type_name}.{name}`");
    }

    let kind = directive_kind(type_name, &name, field)
        .unwrap_or_else(|| default_kind(ty))
        .unwrap_or_else(|err| {
            log!("warn"; "{err} - defaulting to text");
            "text".to_owned()
        });

    Ok(Some(FieldDef {
        name,
        ty,
        description: field.description.as_ref().map(|d| d.node.clone()),
        kind,
    }))
}

fn is_reserved_field(name: &str) -> bool {
    RESERVED_FIELD_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(name))
}

/// Kind from `@field(type: "...")`, if the directive is present.
fn directive_kind(type_name: &str, name: &str, field: &FieldDefinition) -> Option<Result<String>> {
    let directive = field
        .directives
        .iter()
        .find(|d| d.node.name.node.as_str() == FIELD_DIRECTIVE)?;

    let kind = directive
        .node
        .arguments
        .iter()
        .find(|(arg, _)| arg.node.as_str() == "type")
        .map(|(_, value)| &value.node);

    Some(match kind {
        Some(Value::String(kind)) => Ok(kind.clone()),
        _ => Err(Error::Configuration(format!(
            "`@{FIELD_DIRECTIVE}` on `{type_name}.{name}` needs a string `type` argument"
        ))),
    })
}

/// Kind for fields without a directive. Only string-like scalars have a default.
fn default_kind(ty: FieldType) -> Result<String> {
    match ty.scalar {
        Scalar::String | Scalar::Id => Ok("text".to_owned()),
        other => Err(Error::Configuration(format!(
            "unhandled field type `{}`",
            other.name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITE: &str = r#"
        type About {
          bio: String @field(type: "long-text")
        }

        "A film I worked on"
        type Film {
          role: String
          "Short pitch (< 200 characters)"
          pitch: String @field(type: "long-text")
          "Long description"
          description: String @field(type: "long-text")
          "YouTube URL"
          youtubeUrl: String @field(type: "url")
        }
    "#;

    #[test]
    fn test_parse_types() {
        let types = PageTypes::parse(SITE).unwrap();
        assert_eq!(types.len(), 2);
        assert_eq!(
            types.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
            vec!["About", "Film"]
        );

        let film = types.get("Film").unwrap();
        assert_eq!(film.description.as_deref(), Some("A film I worked on"));
        assert_eq!(film.fields.len(), 4);
        assert_eq!(film.fields[0].ty.to_string(), "String");
        assert_eq!(film.list_field(), "allFilms");
        assert_eq!(film.input_name(), "FilmInput");
    }

    #[test]
    fn test_descriptors() {
        let types = PageTypes::parse(SITE).unwrap();
        let descriptors = types.get("Film").unwrap().descriptors();
        let expected = [
            ("url", "url", Some("Link")),
            ("title", "text", Some("Title")),
            ("role", "text", None),
            ("pitch", "long-text", Some("Short pitch (< 200 characters)")),
            ("description", "long-text", Some("Long description")),
            ("youtubeUrl", "url", Some("YouTube URL")),
        ];
        assert_eq!(descriptors.len(), expected.len());
        for (descriptor, (name, kind, description)) in descriptors.iter().zip(expected) {
            assert_eq!(descriptor.name, name);
            assert_eq!(descriptor.kind, kind);
            assert_eq!(descriptor.description.as_deref(), description);
        }
    }

    #[test]
    fn test_non_string_fields_default_to_text() {
        let types = PageTypes::parse("type Event { capacity: Int! price: Float }").unwrap();
        let event = types.get("Event").unwrap();
        assert_eq!(event.fields[0].kind, "text");
        assert_eq!(event.fields[0].ty.to_string(), "Int!");
        assert_eq!(event.fields[1].kind, "text");
    }

    #[test]
    fn test_directive_without_type_defaults() {
        let types = PageTypes::parse("type A { body: String @field }").unwrap();
        assert_eq!(types.get("A").unwrap().fields[0].kind, "text");
    }

    #[test]
    fn test_skips_non_object_definitions() {
        let sdl = r#"
            directive @field(type: String) on FIELD_DEFINITION
            scalar Date
            enum Color { RED GREEN }
            type Post { body: String }
        "#;
        let types = PageTypes::parse(sdl).unwrap();
        assert_eq!(types.len(), 1);
        assert!(types.contains("Post"));
    }

    #[test]
    fn test_type_extension_appends_fields() {
        let sdl = "type Post { body: String } extend type Post { author: String }";
        let types = PageTypes::parse(sdl).unwrap();
        let names: Vec<_> = types.get("Post").unwrap().fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["body", "author"]);
    }

    #[test]
    fn test_rejects_invalid_schemas() {
        let invalid = [
            "type Query { a: String }",
            "type Page { a: String }",
            "type Film { url: String }",
            "type Film { title: String! }",
            "type Film { title: Int }",
            "type Film { type: String }",
            "type Film { Type: String }",
            "type Film { Title: String }",
            "type Film { ORDER: Int }",
            "type Film { a: String } type FilmInput { b: String }",
            "type Film { a: String } type Film { b: String }",
            "type Film { a: String a: Int }",
            "type Film { Role: String role: String }",
            "type Film { role: String } extend type Film { ROLE: String }",
        ];
        for sdl in invalid {
            let err = PageTypes::parse(sdl).unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)), "{sdl}: {err}");
        }
    }

    #[test]
    fn test_title_redeclaration_is_ignored() {
        let types = PageTypes::parse("type Film { title: String role: String }").unwrap();
        let film = types.get("Film").unwrap();
        assert_eq!(film.fields.len(), 1);
        assert_eq!(film.fields[0].name, "role");
        assert_eq!(
            film.descriptors().iter().filter(|d| d.name == "title").count(),
            1
        );
    }

    #[test]
    fn test_unhandled_field_types_stored_as_string() {
        let sdl = r#"
            type Film {
              tags: [String]
              credits: [String!]! @field(type: "list")
              about: About
              role: String
            }
            type About { bio: String }
        "#;
        let types = PageTypes::parse(sdl).unwrap();
        let film = types.get("Film").unwrap();

        let fields: Vec<_> = film
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.ty.to_string(), f.kind.as_str()))
            .collect();
        assert_eq!(
            fields,
            vec![
                ("tags", "String".to_owned(), "text"),
                ("credits", "String".to_owned(), "list"),
                ("about", "String".to_owned(), "text"),
                ("role", "String".to_owned(), "text"),
            ]
        );
    }

    #[test]
    fn test_syntax_error() {
        let err = PageTypes::parse("type Film {").unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn test_scalar_parse() {
        assert_eq!(Scalar::Int.parse("order", " 3 ").unwrap(), Value::from(3));
        assert_eq!(Scalar::Boolean.parse("flag", "true").unwrap(), Value::Boolean(true));
        assert_eq!(
            Scalar::String.parse("s", " keep ").unwrap(),
            Value::String(" keep ".into())
        );
        assert!(Scalar::Int.parse("order", "x").is_err());
        assert!(Scalar::Float.parse("price", "NaN").is_err());
        assert!(Scalar::Boolean.parse("flag", "yes").is_err());
    }
}
