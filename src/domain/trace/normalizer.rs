//! Raw trace payload normalization
//!
//! Different backends wrap the `callTracer` result differently: geth hands
//! back the bare root frame, some providers wrap it in `{ "result": ... }`,
//! Erigon-style responses are an array of frames, and a few return a
//! `{ "calls": [...], "logs": [...] }` object. This module folds all of
//! them into one canonical [`NormalizedTrace`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use alloy_primitives::U256;

use super::TraceError;

/// One raw call frame as reported by the tracer. Quantity fields stay
/// strings (hex or decimal) until the builder parses them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawTraceCall {
    #[serde(rename = "type")]
    pub call_type: String,
    pub from: String,
    pub to: Option<String>,
    pub value: Option<String>,
    pub gas: Option<String>,
    pub gas_used: Option<String>,
    pub input: Option<String>,
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calls: Option<Vec<RawTraceCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<RawLog>>,
}

/// One raw log entry, either from the receipt or embedded in the trace
/// (`callTracer` with `withLog`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawLog {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
}

/// Canonical trace shape every recognized payload folds into.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NormalizedTrace {
    pub calls: Vec<RawTraceCall>,
    pub gas_used: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<RawLog>>,
}

/// Fold an arbitrary raw trace payload into the canonical shape.
///
/// Shapes are tried in order:
/// 1. a bare call frame (`type` + `from` + `to` present)
/// 2. a `{ "result": ... }` wrapper, unwrapped one level and retried
/// 3. an array of frames (gas from the first frame)
/// 4. a `{ "calls": ..., "logs": ... }` object, passed through
///
/// Anything else is fatal: guessing a shape produces misleading output.
/// Already-normalized input hits shape 4 and is a fixed point.
pub fn normalize(payload: &Value) -> Result<NormalizedTrace, TraceError> {
    if let Value::Object(map) = payload {
        if map.contains_key("type") && map.contains_key("from") && map.contains_key("to") {
            let call: RawTraceCall = serde_json::from_value(payload.clone())
                .map_err(|err| TraceError::Malformed(err.to_string()))?;
            let gas_used = call.gas_used.clone().unwrap_or_default();
            return Ok(NormalizedTrace {
                calls: vec![call],
                gas_used,
                logs: None,
            });
        }

        if let Some(inner) = map.get("result") {
            return normalize(inner);
        }
    }

    if payload.is_array() {
        let calls: Vec<RawTraceCall> = serde_json::from_value(payload.clone())
            .map_err(|err| TraceError::Malformed(err.to_string()))?;
        let gas_used = calls
            .first()
            .and_then(|call| call.gas_used.clone())
            .unwrap_or_default();
        return Ok(NormalizedTrace {
            calls,
            gas_used,
            logs: None,
        });
    }

    if let Value::Object(map) = payload {
        if map.contains_key("calls") || map.contains_key("logs") {
            return serde_json::from_value(payload.clone())
                .map_err(|err| TraceError::Malformed(err.to_string()));
        }
    }

    Err(TraceError::UnsupportedFormat(shape_of(payload)))
}

/// Short description of an unrecognized payload for the error message.
fn shape_of(payload: &Value) -> String {
    match payload {
        Value::Object(map) => {
            let keys: Vec<&str> = map.keys().map(String::as_str).take(6).collect();
            format!("object with keys [{}]", keys.join(", "))
        }
        Value::Array(items) => format!("array of {} items", items.len()),
        Value::Null => "null".to_string(),
        Value::Bool(_) => "boolean".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::String(_) => "string".to_string(),
    }
}

/// Parse a quantity field that may be hex ("0x5208") or decimal ("21000").
pub fn parse_quantity(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    if let Some(digits) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        u64::from_str_radix(digits, 16).ok()
    } else {
        trimmed.parse().ok()
    }
}

/// Same as [`parse_quantity`] but full 256-bit width.
pub fn parse_quantity_u256(raw: &str) -> Option<U256> {
    let trimmed = raw.trim();
    if let Some(digits) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        U256::from_str_radix(digits, 16).ok()
    } else {
        trimmed.parse().ok()
    }
}

/// Decode a 0x-prefixed hex string into bytes; empty on malformed input.
pub fn decode_hex_bytes(raw: &str) -> Vec<u8> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    hex::decode(digits).unwrap_or_default()
}
