//! Command implementations

use serde_json::{Value, json};
use turbogql_client::{
    ClientConfig, Document, GraphqlClient, GraphqlRequest, OperationKind, RequestOptions,
};
use turbogql_telemetry::TelemetryConfig;

use crate::cli::{Cli, Commands, OperationArgs};
use crate::error::{CliError, CliResult};

/// Request duration histogram buckets, in milliseconds.
pub const DURATION_BUCKETS: [f64; 4] = [0.0, 200.0, 300.0, 800.0];

/// Telemetry for one CLI invocation against a client configured by `client`.
pub fn telemetry_config(cli: &Cli, client: &ClientConfig) -> TelemetryConfig {
    let mut builder = TelemetryConfig::builder()
        .service_name("turbogql")
        .log_level(cli.log_level.clone())
        .json_logs(cli.json_logs)
        .stderr_output(true)
        .prometheus(cli.print_metrics)
        .duration_buckets(DURATION_BUCKETS.to_vec());
    if let Some(prefix) = &client.metrics_prefix {
        builder = builder.metrics_prefix(prefix.clone());
    }
    builder.build()
}

/// Run `command` with `client` and return the JSON to print.
///
/// # Errors
///
/// Fails on unreadable or invalid input and on request failure.
pub async fn execute(client: &GraphqlClient, command: Commands) -> CliResult<String> {
    let output = match command {
        Commands::Query(args) => run_operation(client, OperationKind::Query, args).await?,
        Commands::Mutate(args) => run_operation(client, OperationKind::Mutation, args).await?,
        Commands::Health(_) => json!({ "healthy": client.health().await? }),
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

async fn run_operation(
    client: &GraphqlClient,
    kind: OperationKind,
    args: OperationArgs,
) -> CliResult<Value> {
    let source = match (&args.file, args.document) {
        (Some(file), _) => tokio::fs::read_to_string(file).await?,
        (None, Some(document)) => document,
        (None, None) => {
            return Err(CliError::InvalidArguments(
                "a document or --file is required".to_string(),
            ));
        }
    };
    let document = Document::parse(&source)?;

    let Value::Object(variables) = serde_json::from_str(&args.variables)? else {
        return Err(CliError::InvalidArguments(
            "--variables must be a JSON object".to_string(),
        ));
    };
    let mut options = RequestOptions::new().variables(variables);
    if let Some(name) = args.name {
        options = options.name(name);
    }

    let request = GraphqlRequest::new(document).with_options(options);
    let response = client.execute(kind, request.into()).await?;
    Ok(serde_json::to_value(response)?)
}
