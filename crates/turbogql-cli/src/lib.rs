//! # turbogql CLI
//!
//! Run queries and mutations against a GraphQL server with the retrying,
//! logging client from `turbogql-client`.
//!
//! ## Usage
//!
//! ```bash
//! # Query a server directly
//! turbogql query 'query Hello { hello }' --url http://localhost:4000
//!
//! # Mutation from a file with variables, retried up to 3 times
//! turbogql mutate --file add_user.graphql --variables '{"name":"ada"}' -r 3
//!
//! # A named client from a config file, then the metrics snapshot
//! turbogql health --config clients.toml --client users --print-metrics
//! ```
//!
//! Values from `--config` can be overridden with `TURBOGQL__*` environment
//! variables, e.g. `TURBOGQL__CLIENTS__USERS__TOKEN`.

pub mod cli;
pub mod commands;
pub mod config;
mod error;

use clap::Parser;

pub use cli::{Cli, Commands, OperationArgs, Target};
pub use error::{CliError, CliResult};

/// Run the CLI application
///
/// # Errors
///
/// Any configuration, telemetry or request failure.
pub async fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let clients = config::load_clients(cli.config.as_deref())?;
    let target = match &cli.command {
        Commands::Query(args) | Commands::Mutate(args) => &args.target,
        Commands::Health(target) => target,
    };
    let (name, mut client_config) = config::select_client(&clients, cli.client.as_deref(), target)?;
    if cli.print_metrics {
        client_config.metrics = Some(true);
    }

    let telemetry = commands::telemetry_config(&cli, &client_config).init()?;
    let client = client_config.builder(&name).build()?;

    let output = commands::execute(&client, cli.command).await?;
    println!("{output}");

    if cli.print_metrics
        && let Some(metrics) = telemetry.render_metrics()
    {
        println!("{metrics}");
    }
    Ok(())
}
