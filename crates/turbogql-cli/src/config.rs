//! Client configuration: file, environment and command-line flags

use std::path::Path;

use config::{Config, Environment, File, Map};
use turbogql_client::{ClientConfig, ClientsConfig, RetrySetting};

use crate::cli::Target;
use crate::error::{CliError, CliResult};

/// Prefix of environment overrides, e.g. `TURBOGQL__CLIENTS__USERS__TOKEN`.
pub const ENV_PREFIX: &str = "TURBOGQL";

/// Name of the client built from flags alone.
pub const ANONYMOUS_CLIENT: &str = "turbogql";

/// Load the named clients from `path` and the process environment.
///
/// # Errors
///
/// Fails when the file is missing or does not deserialize.
pub fn load_clients(path: Option<&Path>) -> CliResult<ClientsConfig> {
    load_clients_from(path, None)
}

/// Load the named clients, reading overrides from `env` instead of the
/// process environment when given.
pub(crate) fn load_clients_from(
    path: Option<&Path>,
    env: Option<Map<String, String>>,
) -> CliResult<ClientsConfig> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(true));
    }
    let environment = Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
        .source(env);

    let config = builder.add_source(environment).build()?;
    Ok(config.try_deserialize()?)
}

/// The client to use: a named client from `clients`, or one built from
/// the defaults, with the command-line `target` applied on top.
///
/// # Errors
///
/// [`CliError::UnknownClient`] when `name` is not configured.
pub fn select_client(
    clients: &ClientsConfig,
    name: Option<&str>,
    target: &Target,
) -> CliResult<(String, ClientConfig)> {
    let (name, config) = match name {
        Some(name) => {
            let config = clients
                .resolved()
                .find(|(candidate, _)| *candidate == name)
                .map(|(_, config)| config)
                .ok_or_else(|| CliError::UnknownClient(name.to_string()))?;
            (name.to_string(), config)
        }
        None => (ANONYMOUS_CLIENT.to_string(), clients.defaults.clone()),
    };
    Ok((name, apply_target(config, target)))
}

fn apply_target(mut config: ClientConfig, target: &Target) -> ClientConfig {
    if let Some(url) = &target.url {
        config.origin = Some(url.clone());
    }
    if let Some(path) = &target.path {
        config.path = Some(path.clone());
    }
    if let Some(token) = &target.token {
        config.token = Some(token.clone());
    }
    if let Some(retries) = target.retries {
        config.retry = Some(RetrySetting::Count(retries));
    }
    if let Some(timeout) = target.timeout_ms {
        config.timeout_ms = Some(timeout);
    }
    config
}
