//! Contentbot - a GraphQL API over a directory of flat-file pages.
//!
//! Describe page types once in a base schema, point the bot at a content
//! directory, and get queries and mutations for every type:
//!
//! ```ignore
//! let bot = Contentbot::builder()
//!     .schema("type Film { role: String }")
//!     .content_path("content")
//!     .build()
//!     .await?;
//!
//! let response = bot.execute("{ allFilms { url title role } }").await;
//! ```

pub mod logger;

mod bot;
pub mod content;
pub mod error;
pub mod fs;
pub mod schema;
pub mod utils;

pub use bot::{Contentbot, ContentbotBuilder};
pub use error::{Error, Result};
