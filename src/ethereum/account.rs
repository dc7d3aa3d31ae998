use alloy::{primitives::Address, signers::local::PrivateKeySigner};
use std::str::FromStr;

use crate::error::{QueryError, QueryResult};

/// Derive the account address owned by a hex-encoded secp256k1 private key.
///
/// The key may carry a `0x` prefix. It is only used to compute the public
/// address; nothing is ever signed with it.
pub fn derive_address(private_key: &str) -> QueryResult<Address> {
    let private_key = private_key.trim();
    let private_key = private_key
        .strip_prefix("0x")
        .or_else(|| private_key.strip_prefix("0X"))
        .unwrap_or(private_key);

    if private_key.len() != 64 {
        return Err(QueryError::KeyFormat(format!(
            "expected 64 hex characters, got {}",
            private_key.len()
        )));
    }

    if !private_key.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(QueryError::KeyFormat(
            "key contains non-hexadecimal characters".to_string(),
        ));
    }

    let signer =
        PrivateKeySigner::from_str(private_key).map_err(|e| QueryError::KeyFormat(e.to_string()))?;

    Ok(signer.address())
}
