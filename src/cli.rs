//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Contentbot: a GraphQL API over flat-file content
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Config file name (default: contentbot.toml)
    #[arg(short = 'C', long, default_value = "contentbot.toml", global = true)]
    pub config: PathBuf,

    /// Content directory path (relative to project root)
    #[arg(short, long, global = true)]
    pub content: Option<PathBuf>,

    /// Base schema file path (relative to project root)
    #[arg(short, long, global = true)]
    pub schema: Option<PathBuf>,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Init a starter project with a schema and a home page
    Init {
        /// the name(path) of project directory, related to `root`
        name: Option<PathBuf>,
    },

    /// Print the generated GraphQL schema
    Schema,

    /// Execute a single GraphQL operation and print the JSON response
    Query {
        /// The operation, or a path to a file holding it with `--file`
        query: String,

        /// Variables as a JSON object
        #[arg(long)]
        variables: Option<String>,

        /// Read the operation from the file at QUERY
        #[arg(short, long)]
        file: bool,
    },

    /// Serve the GraphQL endpoint over HTTP
    Serve {
        /// Interface to bind on
        #[arg(short, long)]
        interface: Option<String>,

        /// The port you should provide
        #[arg(short, long)]
        port: Option<u16>,
    },
}

impl Cli {
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Commands::Init { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve() {
        let cli = Cli::parse_from(["contentbot", "serve", "-p", "8080", "--root", "site"]);
        assert_eq!(cli.root, Some(PathBuf::from("site")));
        assert_eq!(cli.config, PathBuf::from("contentbot.toml"));
        match cli.command {
            Commands::Serve { interface, port } => {
                assert_eq!(interface, None);
                assert_eq!(port, Some(8080));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_query_with_globals() {
        let cli = Cli::parse_from([
            "contentbot",
            "-c",
            "pages",
            "query",
            "{ pages { url } }",
            "--variables",
            "{}",
            "-s",
            "schema.graphql",
        ]);
        assert_eq!(cli.content, Some(PathBuf::from("pages")));
        assert_eq!(cli.schema, Some(PathBuf::from("schema.graphql")));
        match cli.command {
            Commands::Query { query, variables, file } => {
                assert_eq!(query, "{ pages { url } }");
                assert_eq!(variables.as_deref(), Some("{}"));
                assert!(!file);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_init() {
        let cli = Cli::parse_from(["contentbot", "init", "my-site"]);
        assert!(cli.is_init());
        assert!(matches!(cli.command, Commands::Init { name: Some(ref n) } if n == &PathBuf::from("my-site")));
    }
}
