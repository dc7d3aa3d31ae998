use alloy::{
    providers::{Provider, ProviderBuilder, RootProvider},
    transports::BoxTransport,
};
use reqwest::Url;
use tracing::debug;

use crate::error::{QueryError, QueryResult};
use crate::ethereum::utils;

const SUPPORTED_SCHEMES: &[&str] = &["http", "https", "ws", "wss"];

/// An open transport to a JSON-RPC node. Dropping it releases the transport.
#[derive(Debug)]
pub struct Connection {
    provider: RootProvider<BoxTransport>,
    endpoint: String,
}

impl Connection {
    /// Open a connection to `endpoint`.
    ///
    /// HTTP endpoints are not contacted until the first request; WebSocket
    /// endpoints complete their handshake here.
    pub async fn connect(endpoint: &str) -> QueryResult<Self> {
        let url = validate_endpoint(endpoint)?;

        let provider = ProviderBuilder::new()
            .on_builtin(url.as_str())
            .await
            .map_err(|e| QueryError::connection(endpoint, utils::interpret_rpc_error(&e.to_string())))?;

        debug!("Using endpoint {}://{}", url.scheme(), url.host_str().unwrap_or_default());
        Ok(Self {
            provider,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn provider(&self) -> &RootProvider<BoxTransport> {
        &self.provider
    }

    /// Check that the node serves the expected chain.
    pub async fn verify_chain_id(&self, expected: u64) -> QueryResult<()> {
        let actual = self.provider.get_chain_id().await.map_err(|e| {
            QueryError::connection(&self.endpoint, utils::interpret_rpc_error(&e.to_string()))
        })?;

        if actual != expected {
            return Err(QueryError::connection(
                &self.endpoint,
                format!("node serves chain id {}, expected {}", actual, expected),
            ));
        }

        debug!("Chain id {} confirmed", actual);
        Ok(())
    }
}

fn validate_endpoint(endpoint: &str) -> QueryResult<Url> {
    let url = Url::parse(endpoint.trim())
        .map_err(|e| QueryError::connection(endpoint, format!("invalid URL: {}", e)))?;

    if !SUPPORTED_SCHEMES.contains(&url.scheme()) {
        return Err(QueryError::connection(
            endpoint,
            format!(
                "unsupported scheme '{}', expected one of {}",
                url.scheme(),
                SUPPORTED_SCHEMES.join(", ")
            ),
        ));
    }

    Ok(url)
}
