use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::QueryError;

const INFURA_PLACEHOLDER: &str = "YOUR_INFURA_PROJECT_ID";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub network: NetworkConfig,
    pub contract: ContractConfig,
    pub account: AccountConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub rpc_url: String,
    /// When set, the node's chain id must match before any query is sent.
    pub chain_id: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractConfig {
    pub address: String,
    /// Inline ABI JSON. Takes precedence over `abi_path`.
    pub abi: Option<String>,
    pub abi_path: Option<PathBuf>,
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    pub private_key: String,
}

// Keeps the key out of debug logs.
impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("private_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub stake_unit: String,
    pub reward_unit: String,
    /// Print amounts as fixed-point decimals with this many places instead of raw integers.
    pub decimals: Option<u8>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            chain_id: None,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            stake_unit: "ETH".to_string(),
            reward_unit: "PEPE".to_string(),
            decimals: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {:?}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {:?}: {}", path, e))?;

        Ok(config)
    }

    /// Load the configuration file and apply environment overrides.
    ///
    /// An explicit path must load. Without one, the default path is used if
    /// it exists, otherwise the built-in defaults.
    pub async fn load<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let config = Self::load_from_file(path.as_ref()).await?;
                tracing::info!("Loaded configuration from {:?}", path.as_ref());
                config
            }
            None => match Self::default_config_path() {
                Ok(default_path) if default_path.exists() => {
                    let config = Self::load_from_file(&default_path).await?;
                    tracing::info!("Loaded configuration from {:?}", default_path);
                    config
                }
                _ => {
                    tracing::debug!("No configuration file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_env_vars(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply environment variable overrides. `lookup` is `std::env::var` outside tests.
    fn apply_env_vars<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(rpc_url) = lookup("STAKE_QUERY_RPC_URL") {
            self.network.rpc_url = rpc_url;
        }

        if let Some(chain_id) = lookup("STAKE_QUERY_CHAIN_ID") {
            let chain_id = chain_id
                .trim()
                .parse::<u64>()
                .map_err(|e| anyhow!("Invalid STAKE_QUERY_CHAIN_ID '{}': {}", chain_id, e))?;
            self.network.chain_id = Some(chain_id);
        }

        if let Some(address) = lookup("STAKE_QUERY_CONTRACT_ADDRESS") {
            self.contract.address = address;
        }

        if let Some(private_key) = lookup("STAKE_QUERY_PRIVATE_KEY") {
            tracing::debug!("Using private key from STAKE_QUERY_PRIVATE_KEY");
            self.account.private_key = private_key;
        }

        Ok(())
    }

    /// Fill the Infura project id placeholder of the final RPC URL from `INFURA_API_KEY`.
    ///
    /// Runs after flag overrides so a placeholder passed with `--rpc-url` is
    /// substituted too.
    pub fn resolve_rpc_url(&mut self) {
        self.substitute_api_key(|key| std::env::var(key).ok());
    }

    pub(crate) fn substitute_api_key<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if !self.network.rpc_url.contains(INFURA_PLACEHOLDER) {
            return;
        }

        match lookup("INFURA_API_KEY") {
            Some(api_key) => {
                tracing::info!("Using INFURA_API_KEY environment variable for the RPC URL");
                self.network.rpc_url = self.network.rpc_url.replace(INFURA_PLACEHOLDER, &api_key);
            }
            None => tracing::warn!(
                "RPC URL still contains the {} placeholder, set INFURA_API_KEY",
                INFURA_PLACEHOLDER
            ),
        }
    }

    /// Check that every value the queries need is present.
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.network.rpc_url.trim().is_empty() {
            return Err(QueryError::Config("network.rpc_url is not set".to_string()));
        }
        if self.contract.address.trim().is_empty() {
            return Err(QueryError::Config(
                "contract.address is not set (or use STAKE_QUERY_CONTRACT_ADDRESS)".to_string(),
            ));
        }
        if self.contract.abi.is_none() && self.contract.abi_path.is_none() {
            return Err(QueryError::Config(
                "either contract.abi or contract.abi_path must be set".to_string(),
            ));
        }
        if self.account.private_key.trim().is_empty() {
            return Err(QueryError::Config(
                "account.private_key is not set (or use STAKE_QUERY_PRIVATE_KEY)".to_string(),
            ));
        }
        Ok(())
    }

    /// The contract ABI JSON, read from `abi_path` when no inline ABI is set.
    pub async fn abi_json(&self) -> Result<String> {
        if let Some(abi) = &self.contract.abi {
            return Ok(abi.clone());
        }

        let path = self
            .contract
            .abi_path
            .as_ref()
            .ok_or_else(|| anyhow!("No contract ABI configured"))?;

        fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read ABI file {:?}: {}", path, e))
    }

    /// Get default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("stake-query").join("config.toml"))
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let sample_config = r#"# stake-query configuration file

[network]
# HTTP(S) or WS(S) JSON-RPC endpoint
rpc_url = "https://mainnet.infura.io/v3/YOUR_INFURA_PROJECT_ID"
# Optional: refuse to run against a node serving another chain
chain_id = 1

[contract]
address = "0x0000000000000000000000000000000000000000"
# Either inline ABI JSON...
abi = '''
[
  {"type": "function", "name": "stakes", "stateMutability": "view",
   "inputs": [{"name": "", "type": "address"}],
   "outputs": [{"name": "amount", "type": "uint256"}, {"name": "timestamp", "type": "uint256"}]},
  {"type": "function", "name": "calculateReward", "stateMutability": "view",
   "inputs": [{"name": "staker", "type": "address"}],
   "outputs": [{"name": "", "type": "uint256"}]}
]
'''
# ...or a path to an ABI file or compiler artifact
# abi_path = "Staking.json"

[account]
# Only used to derive the staker address, never to sign.
# Prefer the STAKE_QUERY_PRIVATE_KEY environment variable.
private_key = ""

[report]
stake_unit = "ETH"
reward_unit = "PEPE"
# decimals = 18  # print 1.5 instead of 1500000000000000000

# Environment variables that can be used:
# STAKE_QUERY_RPC_URL - overrides network.rpc_url
# STAKE_QUERY_CHAIN_ID - overrides network.chain_id
# STAKE_QUERY_CONTRACT_ADDRESS - overrides contract.address
# STAKE_QUERY_PRIVATE_KEY - overrides account.private_key
# INFURA_API_KEY - replaces YOUR_INFURA_PROJECT_ID in the RPC URL
"#;
        sample_config.to_string()
    }
}
