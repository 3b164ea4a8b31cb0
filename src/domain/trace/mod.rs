//! Normalized trace model - the typed call tree and its surrounding
//! transaction context

pub mod builder;
pub mod normalizer;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::abi::{DecodedEvent, DecodedFunction};

pub use builder::TraceParser;
pub use normalizer::{normalize, NormalizedTrace, RawLog, RawTraceCall};

/// Fatal failures of the inspection pipeline.
///
/// Everything else (a selector that will not decode, a token that will not
/// resolve) degrades to missing detail instead of erroring.
#[derive(Debug, Error)]
pub enum TraceError {
    /// The payload matched none of the recognized trace shapes.
    #[error("unsupported trace format: {0}")]
    UnsupportedFormat(String),

    /// The shape was recognized but its content could not be deserialized.
    #[error("malformed trace payload: {0}")]
    Malformed(String),

    /// The normalized trace carries no top-level calls.
    #[error("no trace data to parse")]
    NoTraceData,
}

/// Call kind as reported by the tracer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallKind {
    Call,
    StaticCall,
    DelegateCall,
    Create,
    Create2,
}

impl CallKind {
    /// Classify a tracer type tag. Unrecognized tags fall back to `Call`
    /// rather than failing the whole trace over one odd node.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_uppercase().as_str() {
            "STATICCALL" => CallKind::StaticCall,
            "DELEGATECALL" => CallKind::DelegateCall,
            "CREATE" => CallKind::Create,
            "CREATE2" => CallKind::Create2,
            _ => CallKind::Call,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CallKind::Call => "call",
            CallKind::StaticCall => "staticcall",
            CallKind::DelegateCall => "delegatecall",
            CallKind::Create => "create",
            CallKind::Create2 => "create2",
        }
    }
}

/// One node of the typed call tree.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedCall {
    pub call_type: CallKind,
    pub from: String,
    pub to: String,
    /// Native value in wei, full-width decimal string.
    pub value: String,
    pub gas: u64,
    pub gas_used: u64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revert_reason: Option<String>,
    /// Root is 0; every child is its parent's depth + 1.
    pub depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoded_function: Option<DecodedFunction>,
    pub events: Vec<ParsedEvent>,
    pub calls: Vec<ParsedCall>,
}

/// One receipt log, optionally decoded.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedEvent {
    /// Contract that emitted the log.
    pub address: String,
    /// Position among all logs of the receipt.
    pub log_index: u64,
    pub topics: Vec<String>,
    pub data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoded: Option<DecodedEvent>,
}

/// Summary of the owning transaction, as fetched from the node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxSummary {
    pub hash: String,
    pub block_number: u64,
    pub from: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Wei, decimal string.
    pub value: String,
    pub gas_used: u64,
    /// Wei per gas, decimal string.
    pub gas_price: String,
    pub status: bool,
}

/// Aggregate root handed to the detector and the formatter.
///
/// The serialized field names are the machine-readable output contract;
/// renaming them breaks downstream consumers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTrace {
    pub transaction: TxSummary,
    pub root_call: ParsedCall,
    pub total_gas_used: u64,
    /// Flattened view of every event in the receipt, in log order.
    pub events: Vec<ParsedEvent>,
}
