use alloy::{
    dyn_abi::DynSolValue,
    primitives::{Address, U256},
};
use anyhow::{Context, Result};
use std::io::Write;
use tracing::{debug, info};

use crate::config::ReportConfig;
use crate::error::{QueryError, QueryResult};
use crate::ethereum::{abi::ContractDescriptor, contract, provider::Connection};
use crate::report::{format_amount, Reporter};

pub const STAKES: &str = "stakes";
pub const CALCULATE_REWARD: &str = "calculateReward";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StakeInfo {
    pub amount: U256,
    pub timestamp: u64,
}

/// Query `stakes(staker)`.
pub async fn query_staking_status(
    connection: &Connection,
    contract: &ContractDescriptor,
    staker: Address,
) -> QueryResult<StakeInfo> {
    info!("Querying staking status of {}", staker);
    let result = contract::call(
        connection,
        contract,
        STAKES,
        &[DynSolValue::Address(staker)],
    )
    .await?;
    debug!("{} returned 0x{}", STAKES, hex::encode(&result.raw));

    let [amount, timestamp] = uints::<2>(STAKES, &result.values)?;
    let timestamp = u64::try_from(timestamp).map_err(|_| {
        QueryError::decoding(STAKES, format!("timestamp {} does not fit in 64 bits", timestamp))
    })?;

    Ok(StakeInfo { amount, timestamp })
}

/// Query `calculateReward(staker)`.
pub async fn query_reward(
    connection: &Connection,
    contract: &ContractDescriptor,
    staker: Address,
) -> QueryResult<U256> {
    info!("Querying accrued reward of {}", staker);
    let result = contract::call(
        connection,
        contract,
        CALCULATE_REWARD,
        &[DynSolValue::Address(staker)],
    )
    .await?;
    debug!("{} returned 0x{}", CALCULATE_REWARD, hex::encode(&result.raw));

    let [reward] = uints::<1>(CALCULATE_REWARD, &result.values)?;
    Ok(reward)
}

fn uints<const N: usize>(function: &str, values: &[DynSolValue]) -> QueryResult<[U256; N]> {
    if values.len() != N {
        return Err(QueryError::decoding(
            function,
            format!("expected {} return values, the ABI declares {}", N, values.len()),
        ));
    }

    let mut out = [U256::ZERO; N];
    for (slot, value) in out.iter_mut().zip(values) {
        *slot = match value {
            DynSolValue::Uint(v, _) => *v,
            other => {
                return Err(QueryError::decoding(
                    function,
                    format!("expected an unsigned integer, got {:?}", other),
                ))
            }
        };
    }
    Ok(out)
}

/// Run both queries and print their results. Stake lines are written before
/// the reward query is sent; the first failure stops the run.
pub async fn report_staking<W: Write>(
    connection: &Connection,
    contract: &ContractDescriptor,
    staker: Address,
    config: &ReportConfig,
    reporter: &mut Reporter<W>,
) -> Result<()> {
    let stake = query_staking_status(connection, contract, staker)
        .await
        .context("Failed to query staking status")?;

    reporter.report(
        "Staked Amount",
        format_amount(stake.amount, config.decimals, &config.stake_unit),
    )?;
    reporter.report("Stake Timestamp", stake.timestamp)?;

    let reward = query_reward(connection, contract, staker)
        .await
        .context("Failed to query rewards")?;

    reporter.report(
        "Reward Amount",
        format_amount(reward, config.decimals, &config.reward_unit),
    )?;

    Ok(())
}
