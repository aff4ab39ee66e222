//! Value normalization for packed snapshot payloads.
//!
//! Snapshot files deserialize into dynamic MessagePack values in which most
//! byte-valued leaves are wrapped as `{"type": "Buffer", "data": [..]}`
//! maps rather than raw binary. Everything in this module is a total,
//! structurally-recursive pattern match over the value tree: Buffer-tagged
//! maps collapse to lowercase `0x`-prefixed hex strings, other maps are
//! normalized key-by-key, sequences element-by-element, and every other
//! value passes through unchanged.

use alloy::primitives::U256;
use serde_json::Value;
use std::fmt::Write;

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("Map key is not a string")]
    NonStringKey,
    #[error("String value is not valid utf-8")]
    InvalidUtf8,
    #[error("Unsupported value type: {0}")]
    UnsupportedValue(&'static str),
    #[error("Invalid hex string: {0}")]
    InvalidHex(String),
    #[error("Buffer data entry is not a byte: {0}")]
    InvalidBufferByte(Value),
    #[error("Integer field does not fit into {0}")]
    IntegerOverflow(&'static str),
    #[error("Cannot interpret value as an integer: {0}")]
    NotAnInteger(Value),
}

fn bytes_to_hex(bytes: impl IntoIterator<Item = u64>) -> String {
    let mut out = String::from("0x");
    for b in bytes {
        write!(out, "{b:02x}").expect("writing to a String cannot fail");
    }
    out
}

/// Converts a decoded MessagePack value into a JSON value.
///
/// Raw binary leaves become `0x` hex strings right away; Buffer-tagged maps
/// are left intact for [`normalize_buffers`]. Map keys must be strings.
pub fn msgpack_to_json(value: rmpv::Value) -> Result<Value, ConvertError> {
    match value {
        rmpv::Value::Nil => Ok(Value::Null),
        rmpv::Value::Boolean(b) => Ok(Value::Bool(b)),
        rmpv::Value::Integer(n) => {
            if let Some(u) = n.as_u64() {
                Ok(Value::from(u))
            } else if let Some(i) = n.as_i64() {
                Ok(Value::from(i))
            } else {
                Err(ConvertError::UnsupportedValue("integer"))
            }
        }
        rmpv::Value::F32(f) => serde_json::Number::from_f64(f.into())
            .map(Value::Number)
            .ok_or(ConvertError::UnsupportedValue("non-finite float")),
        rmpv::Value::F64(f) => {
            serde_json::Number::from_f64(f).map(Value::Number).ok_or(ConvertError::UnsupportedValue("non-finite float"))
        }
        rmpv::Value::String(s) => s.into_str().map(Value::String).ok_or(ConvertError::InvalidUtf8),
        rmpv::Value::Binary(bytes) => Ok(Value::String(bytes_to_hex(bytes.into_iter().map(u64::from)))),
        rmpv::Value::Array(values) => {
            Ok(Value::Array(values.into_iter().map(msgpack_to_json).collect::<Result<_, _>>()?))
        }
        rmpv::Value::Map(entries) => {
            let mut map = serde_json::Map::with_capacity(entries.len());
            for (key, val) in entries {
                let key = key.as_str().ok_or(ConvertError::NonStringKey)?.to_string();
                map.insert(key, msgpack_to_json(val)?);
            }
            Ok(Value::Object(map))
        }
        rmpv::Value::Ext(..) => Err(ConvertError::UnsupportedValue("ext")),
    }
}

fn as_buffer_data(value: &Value) -> Option<&Vec<Value>> {
    let map = value.as_object()?;
    if map.get("type").and_then(Value::as_str) != Some("Buffer") {
        return None;
    }
    map.get("data").and_then(Value::as_array).filter(|data| data.iter().all(Value::is_u64))
}

/// Collapses every Buffer-tagged map in the tree into a `0x` hex string.
///
/// Idempotent: hex strings produced by a previous pass come back out
/// unchanged.
pub fn normalize_buffers(value: Value) -> Value {
    if let Some(data) = as_buffer_data(&value) {
        return Value::String(bytes_to_hex(data.iter().filter_map(Value::as_u64)));
    }
    match value {
        Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, normalize_buffers(v))).collect()),
        Value::Array(values) => Value::Array(values.into_iter().map(normalize_buffers).collect()),
        other => other,
    }
}

fn bytes_from_json(data: &[Value]) -> Result<Vec<u8>, ConvertError> {
    data.iter()
        .map(|v| {
            v.as_u64().and_then(|n| u8::try_from(n).ok()).ok_or_else(|| ConvertError::InvalidBufferByte(v.clone()))
        })
        .collect()
}

/// Interprets a normalized or raw numeric field as a big-endian [`U256`].
///
/// Accepts `0x` hex strings, Buffer-tagged maps, raw byte sequences, and
/// plain integers. An absent or null field yields zero.
pub fn value_as_u256(value: Option<&Value>) -> Result<U256, ConvertError> {
    let value = match value {
        None | Some(Value::Null) => return Ok(U256::ZERO),
        Some(value) => value,
    };
    if let Some(s) = value.as_str() {
        let digits = s.strip_prefix("0x").ok_or_else(|| ConvertError::InvalidHex(s.to_string()))?;
        if digits.is_empty() {
            return Ok(U256::ZERO);
        }
        return U256::from_str_radix(digits, 16).map_err(|_| ConvertError::InvalidHex(s.to_string()));
    }
    if let Some(n) = value.as_u64() {
        return Ok(U256::from(n));
    }
    let bytes = match (as_buffer_data(value), value.as_array()) {
        (Some(data), _) => bytes_from_json(data)?,
        (None, Some(data)) => bytes_from_json(data)?,
        (None, None) => return Err(ConvertError::NotAnInteger(value.clone())),
    };
    if bytes.len() > 32 {
        return Err(ConvertError::IntegerOverflow("u256"));
    }
    Ok(U256::from_be_slice(&bytes))
}

pub fn value_as_u128(value: Option<&Value>) -> Result<u128, ConvertError> {
    u128::try_from(value_as_u256(value)?).map_err(|_| ConvertError::IntegerOverflow("u128"))
}

pub fn value_as_u64(value: Option<&Value>) -> Result<u64, ConvertError> {
    u64::try_from(value_as_u256(value)?).map_err(|_| ConvertError::IntegerOverflow("u64"))
}
