mod config;
mod error;
mod ethereum;
mod report;
mod staking;

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use config::Config;
use ethereum::{abi::ContractDescriptor, account, provider::Connection};
use report::Reporter;
use std::io::Write;
use std::path::PathBuf;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Logs go to stderr, stdout carries only the report
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let matches = cli().get_matches();

    if let Err(e) = run(&matches).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn cli() -> Command {
    Command::new("stake-query")
        .version("0.1.0")
        .about("Print the staked amount and accrued reward of an account on a staking contract")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Path to configuration file"),
        )
        .arg(
            Arg::new("rpc-url")
                .short('r')
                .long("rpc-url")
                .value_name("URL")
                .help("RPC endpoint URL (http, https, ws or wss)"),
        )
        .arg(
            Arg::new("contract-address")
                .long("contract-address")
                .value_name("ADDRESS")
                .help("Address of the staking contract"),
        )
        .arg(
            Arg::new("abi-file")
                .long("abi-file")
                .value_name("FILE")
                .help("Path to the contract ABI or compiler artifact"),
        )
        .arg(
            Arg::new("chain-id")
                .long("chain-id")
                .value_name("ID")
                .value_parser(clap::value_parser!(u64))
                .help("Expected chain id of the node"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .help("Generate a sample configuration file and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config-path")
                .long("config-path")
                .help("Print the default configuration file path and exit")
                .action(clap::ArgAction::SetTrue),
        )
}

async fn run(matches: &ArgMatches) -> Result<()> {
    if matches.get_flag("generate-config") {
        println!("{}", Config::generate_sample());
        return Ok(());
    }

    if matches.get_flag("config-path") {
        let path = Config::default_config_path()
            .context("Could not determine default config path")?;
        println!("{}", path.display());
        return Ok(());
    }

    let config_path = matches.get_one::<String>("config").map(PathBuf::from);
    let mut config = Config::load(config_path)
        .await
        .context("Failed to load configuration")?;
    apply_overrides(&mut config, matches);
    config.resolve_rpc_url();

    query(&config, std::io::stdout().lock()).await
}

/// Derive the staker, load the contract, then connect and report to `out`.
///
/// Local inputs are checked before the node is contacted.
async fn query<W: Write>(config: &Config, out: W) -> Result<()> {
    config.validate()?;

    let staker = account::derive_address(&config.account.private_key)
        .context("Failed to parse private key")?;
    info!("Staker address: {}", staker);

    let abi_json = config
        .abi_json()
        .await
        .context("Failed to load the contract ABI")?;
    let contract = ContractDescriptor::new(&config.contract.address, &abi_json)
        .context("Failed to load the staking contract")?;

    let connection = Connection::connect(&config.network.rpc_url)
        .await
        .context("Failed to connect to the Ethereum client")?;
    if let Some(chain_id) = config.network.chain_id {
        connection
            .verify_chain_id(chain_id)
            .await
            .context("Failed to verify the chain id")?;
    }

    let mut reporter = Reporter::new(out);
    staking::report_staking(&connection, &contract, staker, &config.report, &mut reporter).await
}

/// Command line flags take precedence over the file and environment.
fn apply_overrides(config: &mut Config, matches: &ArgMatches) {
    if let Some(rpc_url) = matches.get_one::<String>("rpc-url") {
        config.network.rpc_url = rpc_url.clone();
    }

    if let Some(address) = matches.get_one::<String>("contract-address") {
        config.contract.address = address.clone();
    }

    if let Some(abi_file) = matches.get_one::<String>("abi-file") {
        config.contract.abi = None;
        config.contract.abi_path = Some(PathBuf::from(abi_file));
    }

    if let Some(chain_id) = matches.get_one::<u64>("chain-id") {
        config.network.chain_id = Some(*chain_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;
    use crate::ethereum::abi::tests::{CONTRACT, STAKING_ABI};
    use crate::ethereum::mock_node::{words, MockNode, Reply};
    use alloy::primitives::{Address, U256};

    const HARDHAT_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_cli_definition() {
        cli().debug_assert();
    }

    #[test]
    fn test_flag_overrides() {
        let matches = cli().get_matches_from([
            "stake-query",
            "--rpc-url",
            "https://rpc.example",
            "--contract-address",
            "0x5FbDB2315678afecb367f032d93F642f64180aa3",
            "--abi-file",
            "Staking.json",
            "--chain-id",
            "11155111",
        ]);

        let mut config = Config::default();
        config.contract.abi = Some("[]".to_string());
        apply_overrides(&mut config, &matches);

        assert_eq!(config.network.rpc_url, "https://rpc.example");
        assert_eq!(config.network.chain_id, Some(11155111));
        assert_eq!(
            config.contract.address,
            "0x5FbDB2315678afecb367f032d93F642f64180aa3"
        );
        assert_eq!(config.contract.abi, None);
        assert_eq!(config.contract.abi_path, Some(PathBuf::from("Staking.json")));
    }

    #[test]
    fn test_placeholder_in_flag_is_substituted() {
        let matches = cli().get_matches_from([
            "stake-query",
            "--rpc-url",
            "https://mainnet.infura.io/v3/YOUR_INFURA_PROJECT_ID",
        ]);

        let mut config = Config::default();
        apply_overrides(&mut config, &matches);
        config.substitute_api_key(|key: &str| (key == "INFURA_API_KEY").then(|| "abc123".to_string()));

        assert_eq!(config.network.rpc_url, "https://mainnet.infura.io/v3/abc123");
    }

    fn node_config(url: &str) -> Config {
        let mut config = Config::default();
        config.network.rpc_url = url.to_string();
        config.network.chain_id = Some(1);
        config.contract.address = CONTRACT.to_string();
        config.contract.abi = Some(STAKING_ABI.to_string());
        config.account.private_key = HARDHAT_KEY.to_string();
        config
    }

    fn staking_node() -> MockNode {
        MockNode::new(1)
            .reply(
                "stakes(address)",
                Reply::Data(words(&[
                    U256::from(5_000_000_000_000_000_000u64),
                    U256::from(1_700_000_000u64),
                ])),
            )
            .reply(
                "calculateReward(address)",
                Reply::Data(words(&[U256::from(1_000_000_000_000_000_000u64)])),
            )
    }

    #[tokio::test]
    async fn test_query_full_run() {
        let node = staking_node();
        let config = node_config(&node.spawn().await);

        let mut out = Vec::new();
        query(&config, &mut out).await.unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Staked Amount: 5000000000000000000 ETH\n\
             Stake Timestamp: 1700000000\n\
             Reward Amount: 1000000000000000000 PEPE\n"
        );
        assert_eq!(node.methods(), vec!["eth_chainId", "eth_call", "eth_call"]);

        // both calls carry the derived staker and go to the configured contract
        let staker = account::derive_address(HARDHAT_KEY).unwrap();
        for request in node.requests().iter().filter(|r| r["method"] == "eth_call") {
            let tx = &request["params"][0];
            let to: Address = tx["to"].as_str().unwrap().parse().unwrap();
            assert_eq!(to, CONTRACT.parse::<Address>().unwrap());
            let input = tx["input"].as_str().or_else(|| tx["data"].as_str()).unwrap();
            assert!(input.to_lowercase().ends_with(&hex::encode(staker)));
        }
    }

    #[tokio::test]
    async fn test_query_bad_key_sends_nothing() {
        let node = staking_node();
        let mut config = node_config(&node.spawn().await);
        config.account.private_key = "0xYourPrivateKey".to_string();

        let mut out = Vec::new();
        let err = query(&config, &mut out).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<QueryError>(),
            Some(QueryError::KeyFormat(_))
        ));
        let line = format!("{:#}", err);
        assert!(line.starts_with("Failed to parse private key"));
        assert!(!line.contains('\n'));
        assert!(out.is_empty());
        assert!(node.requests().is_empty());
    }

    #[tokio::test]
    async fn test_query_missing_abi_file() {
        let node = staking_node();
        let dir = tempfile::tempdir().unwrap();
        let mut config = node_config(&node.spawn().await);
        config.contract.abi = None;
        config.contract.abi_path = Some(dir.path().join("Staking.json"));

        let mut out = Vec::new();
        let err = query(&config, &mut out).await.unwrap_err();

        assert!(format!("{:#}", err).starts_with("Failed to load the contract ABI"));
        assert!(out.is_empty());
        assert!(node.requests().is_empty());
    }

    #[tokio::test]
    async fn test_query_chain_mismatch() {
        let node = staking_node();
        let mut config = node_config(&node.spawn().await);
        config.network.chain_id = Some(137);

        let mut out = Vec::new();
        let err = query(&config, &mut out).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<QueryError>(),
            Some(QueryError::Connection { .. })
        ));
        assert!(out.is_empty());
        assert!(!node.methods().contains(&"eth_call".to_string()));
    }

    #[test]
    fn test_chain_id_must_be_numeric() {
        assert!(cli()
            .try_get_matches_from(["stake-query", "--chain-id", "mainnet"])
            .is_err());
    }
}
