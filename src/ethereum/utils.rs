use alloy::primitives::Address;
use std::str::FromStr;

use crate::error::{QueryError, QueryResult};

/// Validates and normalizes an Ethereum address
pub fn validate_address(address: &str) -> QueryResult<Address> {
    let address = address.trim();

    if address.is_empty() {
        return Err(QueryError::Config("address cannot be empty".to_string()));
    }

    if !address.starts_with("0x") && !address.starts_with("0X") {
        return Err(QueryError::Config(format!(
            "invalid address format: '{}'. Ethereum addresses must start with '0x'",
            address
        )));
    }

    if address.len() != 42 {
        return Err(QueryError::Config(format!(
            "invalid address length: '{}'. Ethereum addresses must be exactly 42 characters (0x + 40 hex characters)",
            address
        )));
    }

    let hex_part = &address[2..];
    if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(QueryError::Config(format!(
            "invalid address format: '{}'. Contains non-hexadecimal characters",
            address
        )));
    }

    Address::from_str(address)
        .map_err(|e| QueryError::Config(format!("invalid address '{}': {}", address, e)))
}

/// Validates a Solidity function identifier
pub fn validate_function_name(function_name: &str) -> QueryResult<()> {
    let mut chars = function_name.chars();
    let Some(first) = chars.next() else {
        return Err(QueryError::AbiParse(
            "function name cannot be empty".to_string(),
        ));
    };

    if !first.is_ascii_alphabetic() && first != '_' {
        return Err(QueryError::AbiParse(format!(
            "invalid function name: '{}'. Function names must start with a letter or underscore",
            function_name
        )));
    }

    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(QueryError::AbiParse(format!(
            "invalid function name: '{}'. Function names can only contain letters, numbers, and underscores",
            function_name
        )));
    }

    Ok(())
}

/// Creates user-friendly error messages for common RPC errors
pub fn interpret_rpc_error(error: &str) -> String {
    let lower = error.to_lowercase();
    if lower.contains("execution reverted") {
        format!("the contract reverted execution ({})", error)
    } else if lower.contains("connection refused") || lower.contains("network unreachable") {
        format!(
            "cannot reach the RPC endpoint, check connectivity and the RPC URL ({})",
            error
        )
    } else if lower.contains("timeout") || lower.contains("timed out") {
        "request timed out, the RPC endpoint may be overloaded or unreachable".to_string()
    } else if lower.contains("rate limit") || lower.contains("429") {
        "rate limited by the RPC endpoint".to_string()
    } else if lower.contains("method not found") {
        "the RPC endpoint does not support this method".to_string()
    } else {
        format!("RPC error: {}", error)
    }
}
