//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

pub fn r#true() -> bool {
    true
}

// ============================================================================
// [content] Section Defaults
// ============================================================================

pub mod content {
    use std::path::PathBuf;

    pub fn root() -> PathBuf {
        "content".into()
    }

    /// Schema file used when neither `schema` nor `inline` is set.
    pub fn schema() -> PathBuf {
        "site.graphql".into()
    }
}

// ============================================================================
// [serve] Section Defaults
// ============================================================================

pub mod serve {
    pub fn interface() -> String {
        "127.0.0.1".into()
    }

    pub fn port() -> u16 {
        5280
    }

    pub fn path() -> String {
        "/graphql".into()
    }
}
