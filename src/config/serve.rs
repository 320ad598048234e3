//! `[serve]` section configuration.
//!
//! Contains HTTP endpoint settings.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[serve]` section in contentbot.toml - GraphQL endpoint settings.
///
/// # Example
/// ```toml
/// [serve]
/// interface = "0.0.0.0"  # Listen on all interfaces
/// port = 8080
/// path = "/api"
/// graphiql = false       # No in-browser IDE
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    #[serde(default = "defaults::serve::interface")]
    #[educe(Default = defaults::serve::interface())]
    pub interface: String,

    /// HTTP port number (default: 5280).
    #[serde(default = "defaults::serve::port")]
    #[educe(Default = defaults::serve::port())]
    pub port: u16,

    /// Endpoint path for GraphQL requests.
    #[serde(default = "defaults::serve::path")]
    #[educe(Default = defaults::serve::path())]
    pub path: String,

    /// Serve the GraphiQL IDE on `GET <path>`.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub graphiql: bool,
}
