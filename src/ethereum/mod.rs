pub mod abi;
pub mod account;
pub mod contract;
pub mod provider;
pub mod utils;

#[cfg(test)]
pub(crate) mod mock_node;

use alloy::{dyn_abi::DynSolValue, primitives::Bytes};

/// Raw return data of an `eth_call` and its decoded outputs, in declaration order.
#[derive(Debug, Clone)]
pub struct CallResult {
    pub raw: Bytes,
    pub values: Vec<DynSolValue>,
}
