//! Named clients built from configuration.

use std::collections::BTreeMap;

use tracing::debug;

use crate::client::{ClientResult, GraphqlClient, GraphqlClientBuilder};
use crate::config::ClientsConfig;

/// A set of named clients.
#[derive(Debug, Clone, Default)]
pub struct ClientRegistry {
    clients: BTreeMap<String, GraphqlClient>,
}

impl ClientRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one client per `clients` entry, each layered over `defaults`.
    ///
    /// # Errors
    ///
    /// Fails on the first client that cannot be built.
    pub fn from_config(config: &ClientsConfig) -> ClientResult<Self> {
        Self::from_config_with(config, |builder| builder)
    }

    /// Like [`from_config`](Self::from_config), letting the caller adjust
    /// each builder (for example to add observers) before it is built.
    ///
    /// # Errors
    ///
    /// Fails on the first client that cannot be built.
    pub fn from_config_with<F>(config: &ClientsConfig, customize: F) -> ClientResult<Self>
    where
        F: Fn(GraphqlClientBuilder) -> GraphqlClientBuilder,
    {
        let mut registry = Self::new();
        for (name, client_config) in config.resolved() {
            let client = customize(client_config.builder(name)).build()?;
            debug!(client = name, "Registered GraphQL client");
            registry.register(name, client);
        }
        Ok(registry)
    }

    /// Add or replace a client.
    pub fn register(&mut self, name: impl Into<String>, client: GraphqlClient) {
        self.clients.insert(name.into(), client);
    }

    /// Client by name.
    pub fn get(&self, name: &str) -> Option<&GraphqlClient> {
        self.clients.get(name)
    }

    /// Registered names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.clients.keys().map(String::as_str)
    }

    /// Number of clients.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// `true` if no clients are registered.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
