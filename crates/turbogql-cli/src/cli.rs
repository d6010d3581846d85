//! CLI argument parsing

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// `turbogql` command line
#[derive(Parser, Debug)]
#[command(
    name = "turbogql",
    version,
    about = "Run GraphQL operations with retry, structured logging and metrics"
)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Client configuration file (TOML, YAML or JSON)
    #[arg(long, short = 'c', global = true, env = "TURBOGQL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Named client from the configuration file
    #[arg(long, global = true)]
    pub client: Option<String>,

    /// Log filter used when `RUST_LOG` is unset
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Emit JSON logs
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Print the Prometheus metrics snapshot after the request
    #[arg(long, global = true)]
    pub print_metrics: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a query
    Query(OperationArgs),

    /// Run a mutation
    Mutate(OperationArgs),

    /// Run the health query against the server
    Health(Target),
}

/// Where to send requests; flags override the configuration file
#[derive(Args, Debug, Clone, Default)]
pub struct Target {
    /// Server origin, e.g. http://localhost:4000
    #[arg(long, short = 'u', env = "TURBOGQL_URL")]
    pub url: Option<String>,

    /// Endpoint path
    #[arg(long)]
    pub path: Option<String>,

    /// Bearer token
    #[arg(long, env = "TURBOGQL_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Retry count
    #[arg(long, short = 'r')]
    pub retries: Option<u32>,

    /// HTTP timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

/// A query or mutation
#[derive(Args, Debug, Clone)]
pub struct OperationArgs {
    #[command(flatten)]
    pub target: Target,

    /// Document source
    #[arg(conflicts_with = "file", required_unless_present = "file")]
    pub document: Option<String>,

    /// Read the document from a file
    #[arg(long, short = 'f')]
    pub file: Option<PathBuf>,

    /// Variables as a JSON object
    #[arg(long, short = 'v', default_value = "{}")]
    pub variables: String,

    /// Name reported in logs, headers and metrics
    #[arg(long, short = 'n')]
    pub name: Option<String>,
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
    fn test_parse_query() {
        let cli = Cli::try_parse_from([
            "turbogql",
            "query",
            "query DoFoo { foo }",
            "--url",
            "http://localhost:4000",
            "--retries",
            "2",
            "--variables",
            r#"{"id":1}"#,
        ])
        .unwrap();

        let Commands::Query(args) = cli.command else {
            panic!("expected query");
        };
        assert_eq!(args.document.as_deref(), Some("query DoFoo { foo }"));
        assert_eq!(args.target.url.as_deref(), Some("http://localhost:4000"));
        assert_eq!(args.target.retries, Some(2));
        assert_eq!(args.variables, r#"{"id":1}"#);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "turbogql",
            "health",
            "--client",
            "users",
            "--print-metrics",
        ])
        .unwrap();
        assert_eq!(cli.client.as_deref(), Some("users"));
        assert!(cli.print_metrics);
        assert!(matches!(cli.command, Commands::Health(_)));
    }

    #[test]
    fn test_document_or_file_required() {
        assert!(Cli::try_parse_from(["turbogql", "mutate"]).is_err());
        assert!(
            Cli::try_parse_from(["turbogql", "mutate", "mutation M { m }", "--file", "m.graphql"])
                .is_err()
        );
    }
}
