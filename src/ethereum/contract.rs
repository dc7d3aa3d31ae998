use alloy::{
    dyn_abi::DynSolValue,
    eips::BlockId,
    primitives::Bytes,
    providers::Provider,
    rpc::types::TransactionRequest,
};
use tracing::debug;

use super::CallResult;
use crate::error::{QueryError, QueryResult};
use crate::ethereum::{
    abi::{self, ContractDescriptor},
    provider::Connection,
    utils,
};

/// Issue a read-only `eth_call` of `function_name` against the latest block
/// and decode the result.
///
/// ABI lookup and argument encoding happen before anything is sent, so
/// schema errors never reach the network.
pub async fn call(
    connection: &Connection,
    contract: &ContractDescriptor,
    function_name: &str,
    args: &[DynSolValue],
) -> QueryResult<CallResult> {
    let function = contract.function(function_name, args.len())?;
    let calldata = abi::encode_call(function, args)?;

    let call_request = TransactionRequest::default()
        .to(contract.address)
        .input(calldata.into());

    debug!("eth_call {} on {}", function.signature(), contract.address);

    let raw: Bytes = connection
        .provider()
        .call(&call_request)
        .block(BlockId::latest())
        .await
        .map_err(|e| QueryError::rpc(function_name, utils::interpret_rpc_error(&e.to_string())))?;

    let values = abi::decode_output(function, &raw)?;
    Ok(CallResult { raw, values })
}
