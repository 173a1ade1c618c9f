//! JSON encoding of values and argument lists.
//!
//! Scripts and transactions carry their arguments as a list of individually
//! encoded values, the same form the ledger hands back for script results.

use crate::error::{CodecError, CodecResult};
use crate::value::Value;

/// Encode a single value.
pub fn encode_value(value: &Value) -> CodecResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Decode a single value.
pub fn decode_value(bytes: &[u8]) -> CodecResult<Value> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Encode every argument in order.
pub fn encode_arguments(values: &[Value]) -> CodecResult<Vec<Vec<u8>>> {
    values.iter().map(encode_value).collect()
}

/// Decode every argument in order, reporting the position of the first bad one.
pub fn decode_arguments(arguments: &[Vec<u8>]) -> CodecResult<Vec<Value>> {
    arguments
        .iter()
        .enumerate()
        .map(|(index, bytes)| {
            decode_value(bytes).map_err(|e| CodecError::InvalidArgument {
                index,
                message: e.to_string(),
            })
        })
        .collect()
}
