use alloy::{
    dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt},
    json_abi::{Function, JsonAbi},
    primitives::{Address, Bytes},
};
use serde_json::Value;
use tracing::debug;

use crate::error::{QueryError, QueryResult};
use crate::ethereum::utils;

/// Parse an ABI definition.
///
/// Accepts either a bare ABI array or a compiler artifact object that carries
/// the ABI under an `abi` key (Hardhat and Foundry both emit these).
pub fn parse_abi(abi_json: &str) -> QueryResult<JsonAbi> {
    let value: Value = serde_json::from_str(abi_json)
        .map_err(|e| QueryError::AbiParse(format!("malformed JSON: {}", e)))?;

    let abi_value = match value {
        Value::Array(_) => value,
        Value::Object(mut obj) => obj.remove("abi").ok_or_else(|| {
            QueryError::AbiParse("expected an ABI array or an object with an 'abi' field".to_string())
        })?,
        other => {
            return Err(QueryError::AbiParse(format!(
                "expected an ABI array, found {}",
                json_kind(&other)
            )))
        }
    };

    let abi: JsonAbi = serde_json::from_value(abi_value)
        .map_err(|e| QueryError::AbiParse(format!("failed to parse ABI entries: {}", e)))?;

    debug!("Parsed ABI with {} functions", abi.functions().count());
    Ok(abi)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A deployed contract together with its parsed ABI.
#[derive(Debug, Clone)]
pub struct ContractDescriptor {
    pub address: Address,
    pub abi: JsonAbi,
}

impl ContractDescriptor {
    pub fn new(address: &str, abi_json: &str) -> QueryResult<Self> {
        let address = utils::validate_address(address)?;
        let abi = parse_abi(abi_json)?;
        Ok(Self { address, abi })
    }

    /// Find `name` in the ABI. Overloads are resolved by argument count.
    pub fn function(&self, name: &str, arity: usize) -> QueryResult<&Function> {
        utils::validate_function_name(name)?;

        let overloads = self.abi.function(name).ok_or_else(|| {
            let available: Vec<&str> = self.abi.functions().map(|f| f.name.as_str()).collect();
            if available.is_empty() {
                QueryError::AbiParse(format!(
                    "function '{}' not found, the ABI declares no functions",
                    name
                ))
            } else {
                QueryError::AbiParse(format!(
                    "function '{}' not found in ABI. Available functions: {}",
                    name,
                    available.join(", ")
                ))
            }
        })?;

        overloads
            .iter()
            .find(|f| f.inputs.len() == arity)
            .or_else(|| overloads.first())
            .ok_or_else(|| QueryError::AbiParse(format!("function '{}' not found in ABI", name)))
    }
}

/// Build call data: the 4-byte selector followed by the ABI-encoded arguments.
pub fn encode_call(function: &Function, args: &[DynSolValue]) -> QueryResult<Bytes> {
    if args.len() != function.inputs.len() {
        let expected: Vec<String> = function
            .inputs
            .iter()
            .map(|input| format!("{} {}", input.ty, input.name).trim_end().to_string())
            .collect();

        return Err(QueryError::encoding(
            &function.name,
            format!(
                "expected {} arguments, got {}. Expected parameters: [{}]",
                function.inputs.len(),
                args.len(),
                expected.join(", ")
            ),
        ));
    }

    let encoded = function
        .abi_encode_input(args)
        .map_err(|e| QueryError::encoding(&function.name, e))?;

    debug!(
        "Encoded {} call data: 0x{}",
        function.signature(),
        hex::encode(&encoded)
    );
    Ok(encoded.into())
}

/// Decode raw return data against the function's declared outputs.
pub fn decode_output(function: &Function, data: &[u8]) -> QueryResult<Vec<DynSolValue>> {
    if data.is_empty() && !function.outputs.is_empty() {
        return Err(QueryError::decoding(
            &function.name,
            format!(
                "empty return data while {} outputs are declared, is there a contract at this address?",
                function.outputs.len()
            ),
        ));
    }

    let values = function
        .abi_decode_output(data, true)
        .map_err(|e| QueryError::decoding(&function.name, e))?;

    if values.len() != function.outputs.len() {
        return Err(QueryError::decoding(
            &function.name,
            format!(
                "expected {} values, decoded {}",
                function.outputs.len(),
                values.len()
            ),
        ));
    }

    Ok(values)
}
