//! Error types for schema derivation, the content store and mutations.

use async_graphql::ErrorExtensions;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building the schema or resolving an operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Empty or malformed URL, conflicting or missing options, unsupported schema.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("page `{0}` already exists")]
    AlreadyExists(String),

    #[error("page `{0}` not found")]
    NotFound(String),

    /// A schema construct that degrades to a default (logged, never returned by resolvers).
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("IO error at `{0}`")]
    Io(PathBuf, #[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |err| Self::Io(path, err)
    }

    /// Stable machine-readable code, exposed as `extensions.code` in GraphQL errors.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::AlreadyExists(_) => "ALREADY_EXISTS",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Schema(_) => "SCHEMA_ERROR",
            Self::Io(..) => "IO_ERROR",
        }
    }
}

impl ErrorExtensions for Error {
    fn extend(&self) -> async_graphql::Error {
        let message = match self {
            // Include the OS error, the display string alone only names the path
            Self::Io(_, source) => format!("{self}: {source}"),
            _ => self.to_string(),
        };
        async_graphql::Error::new(message).extend_with(|_, ext| ext.set("code", self.code()))
    }
}
