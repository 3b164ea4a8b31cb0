//! Call tree construction
//!
//! Walks the normalized raw call list depth-first and produces the typed
//! [`ParsedTrace`], decoding selectors along the way and extracting revert
//! reasons from errored calls. Receipt logs are decoded in a second pass.

use std::sync::Arc;

use alloy_primitives::Address;
use futures::future::BoxFuture;

use super::normalizer::{
    decode_hex_bytes, parse_quantity, parse_quantity_u256, NormalizedTrace, RawLog, RawTraceCall,
};
use super::{CallKind, ParsedCall, ParsedEvent, ParsedTrace, TraceError, TxSummary};
use crate::domain::abi::SignatureDecoder;

/// Solidity `Error(string)` selector, the standard revert envelope.
const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// Traces are bounded by gas in practice; anything deeper than this is a
/// corrupt or adversarial payload and is not descended into.
const MAX_CALL_DEPTH: usize = 1024;

/// Builds [`ParsedTrace`] values from normalized raw traces.
pub struct TraceParser {
    decoder: Arc<SignatureDecoder>,
}

impl TraceParser {
    pub fn new(decoder: Arc<SignatureDecoder>) -> Self {
        Self { decoder }
    }

    /// Build the typed call tree and associate the receipt's logs.
    ///
    /// Selector resolution for the whole tree is prefetched concurrently
    /// up front; the tree itself is then assembled in source order, so
    /// output ordering is the trace's structural order regardless of
    /// lookup completion order.
    pub async fn parse_trace(
        &self,
        trace: &NormalizedTrace,
        receipt_logs: &[RawLog],
        transaction: TxSummary,
    ) -> Result<ParsedTrace, TraceError> {
        let root_raw = match trace.calls.first() {
            Some(root) => root,
            None => return Err(TraceError::NoTraceData),
        };
        if trace.calls.len() > 1 {
            tracing::debug!(
                extra = trace.calls.len() - 1,
                "trace has multiple top-level calls; using the first as root"
            );
        }

        self.decoder
            .prefetch_selectors(collect_selectors(&trace.calls))
            .await;

        let mut root = self.build_call(root_raw, 0).await;

        // Prefer receipt logs; fall back to logs embedded in the trace
        // payload for backends that only report them there.
        let logs: &[RawLog] = if !receipt_logs.is_empty() {
            receipt_logs
        } else {
            trace.logs.as_deref().unwrap_or_default()
        };
        let events = self.parse_logs(logs).await;

        // Events attach to the root call, not the emitting subcall; the
        // flattened list on the trace is the canonical view.
        root.events = events.clone();

        let total_gas_used = parse_quantity(&trace.gas_used).unwrap_or(root.gas_used);

        Ok(ParsedTrace {
            transaction,
            root_call: root,
            total_gas_used,
            events,
        })
    }

    /// Decode each receipt log, preserving receipt order. A log whose
    /// topic is unknown keeps its raw form with no decoded detail.
    pub async fn parse_logs(&self, logs: &[RawLog]) -> Vec<ParsedEvent> {
        let mut events = Vec::with_capacity(logs.len());
        for (index, log) in logs.iter().enumerate() {
            let data = decode_hex_bytes(&log.data);
            let decoded = self.decoder.decode_event_log(&log.topics, &data).await;
            events.push(ParsedEvent {
                address: checksum_or_raw(&log.address),
                log_index: index as u64,
                topics: log.topics.clone(),
                data: log.data.clone(),
                decoded,
            });
        }
        events
    }

    fn build_call<'a>(&'a self, raw: &'a RawTraceCall, depth: usize) -> BoxFuture<'a, ParsedCall> {
        Box::pin(async move {
            let input = raw.input.as_deref().map(decode_hex_bytes).unwrap_or_default();
            let decoded_function = if input.len() >= 4 {
                self.decoder.decode_function_call(&input).await
            } else {
                None
            };

            let success = raw.error.is_none();
            let revert_reason = if success {
                None
            } else {
                extract_revert_reason(raw.output.as_deref())
            };

            let mut calls = Vec::new();
            if let Some(children) = &raw.calls {
                if depth < MAX_CALL_DEPTH {
                    for child in children {
                        calls.push(self.build_call(child, depth + 1).await);
                    }
                } else if !children.is_empty() {
                    tracing::warn!(depth, "call tree exceeds depth bound; truncating");
                }
            }

            ParsedCall {
                call_type: CallKind::from_tag(&raw.call_type),
                from: checksum_or_raw(&raw.from),
                to: raw.to.as_deref().map(checksum_or_raw).unwrap_or_default(),
                value: raw
                    .value
                    .as_deref()
                    .and_then(parse_quantity_u256)
                    .unwrap_or_default()
                    .to_string(),
                gas: raw.gas.as_deref().and_then(parse_quantity).unwrap_or(0),
                gas_used: raw
                    .gas_used
                    .as_deref()
                    .and_then(parse_quantity)
                    .unwrap_or(0),
                success,
                error: raw.error.clone(),
                revert_reason,
                depth,
                decoded_function,
                events: Vec::new(),
                calls,
            }
        })
    }
}

/// Extract a human-readable revert reason from errored-call output.
///
/// Output beginning with the `Error(string)` selector decodes to the
/// attached message; anything else falls back to the raw output string
/// verbatim rather than being dropped.
fn extract_revert_reason(output: Option<&str>) -> Option<String> {
    let raw = output?.trim();
    if raw.is_empty() || raw == "0x" {
        return None;
    }

    let bytes = decode_hex_bytes(raw);
    if bytes.len() > 4 && bytes[..4] == ERROR_STRING_SELECTOR {
        use alloy_dyn_abi::{DynSolType, DynSolValue};
        let tuple = DynSolType::Tuple(vec![DynSolType::String]);
        if let Ok(DynSolValue::Tuple(values)) = tuple.abi_decode(&bytes[4..]) {
            if let Some(DynSolValue::String(reason)) = values.into_iter().next() {
                return Some(reason);
            }
        }
    }
    Some(raw.to_string())
}

/// Gather every selector in the raw tree (iterative walk; the raw nesting
/// is attacker-controlled).
fn collect_selectors(calls: &[RawTraceCall]) -> Vec<[u8; 4]> {
    let mut selectors = Vec::new();
    let mut stack: Vec<&RawTraceCall> = calls.iter().collect();
    while let Some(call) = stack.pop() {
        if let Some(input) = call.input.as_deref() {
            let bytes = decode_hex_bytes(input);
            if bytes.len() >= 4 {
                if let Ok(selector) = <[u8; 4]>::try_from(&bytes[..4]) {
                    selectors.push(selector);
                }
            }
        }
        if let Some(children) = &call.calls {
            stack.extend(children.iter());
        }
    }
    selectors
}

/// EIP-55 checksum an address string, passing unparseable values through
/// untouched.
fn checksum_or_raw(address: &str) -> String {
    address
        .trim()
        .parse::<Address>()
        .map(|parsed| parsed.to_checksum(None))
        .unwrap_or_else(|_| address.to_string())
}
