//! Signature decoder - resolves selectors/topic hashes and decodes
//! call input and log data into typed parameter lists

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::{B256, U256};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use super::schema::{is_spam_signature, EventSchema, FunctionSchema};
use super::seed;
use super::SelectorRegistry;
use crate::domain::trace::normalizer::decode_hex_bytes;

/// A decoded function parameter.
#[derive(Debug, Clone, Serialize)]
pub struct DecodedParam {
    pub name: String,
    /// Solidity type tag (e.g. "address", "uint256", "address[]").
    pub kind: String,
    /// Checksummed addresses and full-width decimal integers arrive as
    /// strings; arrays and tuples as JSON arrays.
    pub value: Value,
}

/// Result of decoding a function call's input.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedFunction {
    pub name: String,
    pub signature: String,
    pub inputs: Vec<DecodedParam>,
}

/// A decoded event parameter.
#[derive(Debug, Clone, Serialize)]
pub struct DecodedEventParam {
    pub name: String,
    pub kind: String,
    pub value: Value,
    pub indexed: bool,
}

/// Result of decoding a log against a known event signature.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedEvent {
    pub name: String,
    pub signature: String,
    pub params: Vec<DecodedEventParam>,
}

/// Resolves selectors and topic hashes to schemas and decodes against
/// them. Both caches are seeded with the well-known table, populated
/// lazily, and live as long as the decoder instance.
///
/// Decoding never errors: an unknown selector, a spammed registry entry,
/// or a layout mismatch all come back as `None`.
pub struct SignatureDecoder {
    registry: Option<Arc<dyn SelectorRegistry>>,
    functions: RwLock<HashMap<[u8; 4], FunctionSchema>>,
    events: RwLock<HashMap<B256, EventSchema>>,
}

impl SignatureDecoder {
    /// Create a decoder, optionally backed by an external selector
    /// registry for cache misses.
    pub fn new(registry: Option<Arc<dyn SelectorRegistry>>) -> Self {
        let functions = seed::seeded_functions()
            .into_iter()
            .map(|schema| (schema.selector, schema))
            .collect();
        let events = seed::seeded_events()
            .into_iter()
            .map(|schema| (schema.topic, schema))
            .collect();
        Self {
            registry,
            functions: RwLock::new(functions),
            events: RwLock::new(events),
        }
    }

    /// Decode raw call input. The first 4 bytes are the selector; the
    /// rest is ABI-encoded arguments.
    pub async fn decode_function_call(&self, input: &[u8]) -> Option<DecodedFunction> {
        if input.len() < 4 {
            return None;
        }
        let selector: [u8; 4] = input[..4].try_into().ok()?;
        let schema = self.function_schema(selector).await?;
        decode_with_schema(&schema, &input[4..])
    }

    /// Decode a log against the seeded event table. topic[0] is the
    /// signature hash; there is no external fallback for events.
    pub async fn decode_event_log(&self, topics: &[String], data: &[u8]) -> Option<DecodedEvent> {
        let hash: B256 = topics.first()?.parse().ok()?;
        let schema = self.events.read().await.get(&hash).cloned()?;
        decode_event_with_schema(&schema, topics, data)
    }

    /// Resolve a batch of selectors concurrently so subsequent per-call
    /// decoding is cache-hit only. Duplicate population on a race is
    /// harmless; the schemas are identical.
    pub async fn prefetch_selectors(&self, selectors: Vec<[u8; 4]>) {
        let unique: HashSet<[u8; 4]> = selectors.into_iter().collect();
        let to_fetch: Vec<[u8; 4]> = {
            let cached = self.functions.read().await;
            unique
                .into_iter()
                .filter(|selector| !cached.contains_key(selector))
                .collect()
        };
        if to_fetch.is_empty() {
            return;
        }
        futures::future::join_all(
            to_fetch
                .into_iter()
                .map(|selector| self.function_schema(selector)),
        )
        .await;
    }

    async fn function_schema(&self, selector: [u8; 4]) -> Option<FunctionSchema> {
        if let Some(schema) = self.functions.read().await.get(&selector) {
            return Some(schema.clone());
        }

        let registry = self.registry.as_ref()?;
        let candidates = match registry.lookup(selector).await {
            Ok(candidates) => candidates,
            Err(err) => {
                tracing::debug!(
                    selector = %format!("0x{}", hex::encode(selector)),
                    %err,
                    "selector registry lookup failed"
                );
                return None;
            }
        };

        // A selector can map to several signatures (collisions + spam).
        // Take the first candidate that is clean, parses, and actually
        // hashes to this selector.
        for candidate in candidates {
            if is_spam_signature(&candidate) {
                continue;
            }
            let Ok(schema) = FunctionSchema::parse(&candidate) else {
                continue;
            };
            if schema.selector != selector {
                continue;
            }
            self.functions
                .write()
                .await
                .insert(selector, schema.clone());
            return Some(schema);
        }
        None
    }
}

/// Decode argument bytes against a resolved schema. A layout mismatch is
/// a non-match, not an error.
fn decode_with_schema(schema: &FunctionSchema, args: &[u8]) -> Option<DecodedFunction> {
    let mut types = Vec::with_capacity(schema.inputs.len());
    for input in &schema.inputs {
        types.push(DynSolType::parse(&input.kind).ok()?);
    }

    let values = if types.is_empty() {
        Vec::new()
    } else {
        let tuple = DynSolType::Tuple(types);
        match tuple.abi_decode(args) {
            Ok(DynSolValue::Tuple(values)) => values,
            Ok(other) => vec![other],
            Err(_) => return None,
        }
    };
    if values.len() != schema.inputs.len() {
        return None;
    }

    let inputs = schema
        .inputs
        .iter()
        .zip(values.iter())
        .map(|(spec, value)| DecodedParam {
            name: spec.name.clone(),
            kind: spec.kind.clone(),
            value: format_value(value),
        })
        .collect();

    Some(DecodedFunction {
        name: schema.name.clone(),
        signature: schema.signature.clone(),
        inputs,
    })
}

/// Decode a log's topics and data against an event schema. Indexed
/// parameters come from topics (in declaration order), the rest from the
/// data section.
fn decode_event_with_schema(
    schema: &EventSchema,
    topics: &[String],
    data: &[u8],
) -> Option<DecodedEvent> {
    let mut params: Vec<Option<DecodedEventParam>> = vec![None; schema.params.len()];
    let mut topic_iter = topics.iter().skip(1);
    let mut body: Vec<(usize, DynSolType)> = Vec::new();

    for (idx, spec) in schema.params.iter().enumerate() {
        let ty = DynSolType::parse(&spec.kind).ok()?;
        if spec.indexed {
            let topic = topic_iter.next()?;
            let value = match ty {
                DynSolType::Address
                | DynSolType::Uint(_)
                | DynSolType::Int(_)
                | DynSolType::Bool
                | DynSolType::FixedBytes(_) => {
                    let word = decode_hex_bytes(topic);
                    if word.len() != 32 {
                        return None;
                    }
                    format_value(&ty.abi_decode(&word).ok()?)
                }
                // Dynamic indexed params are stored as their hash; the
                // topic itself is the most faithful rendering.
                _ => Value::String(topic.clone()),
            };
            params[idx] = Some(DecodedEventParam {
                name: spec.name.clone(),
                kind: spec.kind.clone(),
                value,
                indexed: true,
            });
        } else {
            body.push((idx, ty));
        }
    }

    if !body.is_empty() {
        let tuple = DynSolType::Tuple(body.iter().map(|(_, ty)| ty.clone()).collect());
        let values = match tuple.abi_decode(data).ok()? {
            DynSolValue::Tuple(values) => values,
            other => vec![other],
        };
        if values.len() != body.len() {
            return None;
        }
        for ((idx, _), value) in body.iter().zip(values.iter()) {
            let spec = &schema.params[*idx];
            params[*idx] = Some(DecodedEventParam {
                name: spec.name.clone(),
                kind: spec.kind.clone(),
                value: format_value(value),
                indexed: false,
            });
        }
    }

    let params = params.into_iter().collect::<Option<Vec<_>>>()?;
    Some(DecodedEvent {
        name: schema.name.clone(),
        signature: schema.signature.clone(),
        params,
    })
}

/// Render a decoded value for output.
///
/// Addresses are checksummed, integers stay full-width decimal strings
/// (never a native float), bytes are hex. The one special case: a uint
/// equal to the 256-bit maximum renders as "unlimited", which is how
/// infinite approvals read.
fn format_value(value: &DynSolValue) -> Value {
    match value {
        DynSolValue::Bool(b) => Value::Bool(*b),
        DynSolValue::Int(i, _) => Value::String(i.to_string()),
        DynSolValue::Uint(u, _) => {
            if *u == U256::MAX {
                Value::String("unlimited".to_string())
            } else {
                Value::String(u.to_string())
            }
        }
        DynSolValue::FixedBytes(word, size) => {
            let bytes = &word.as_slice()[..(*size).min(32)];
            Value::String(format!("0x{}", hex::encode(bytes)))
        }
        DynSolValue::Address(addr) => Value::String(addr.to_checksum(None)),
        DynSolValue::Function(func) => Value::String(format!("0x{}", hex::encode(func.as_slice()))),
        DynSolValue::Bytes(bytes) => Value::String(format!("0x{}", hex::encode(bytes))),
        DynSolValue::String(s) => Value::String(s.clone()),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) => {
            Value::Array(items.iter().map(format_value).collect())
        }
        DynSolValue::Tuple(fields) => Value::Array(fields.iter().map(format_value).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::keccak256;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubRegistry {
        candidates: Vec<String>,
        lookups: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl SelectorRegistry for StubRegistry {
        async fn lookup(&self, _selector: [u8; 4]) -> anyhow::Result<Vec<String>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(self.candidates.clone())
        }
    }

    fn transfer_calldata() -> Vec<u8> {
        hex::decode(
            "a9059cbb\
             0000000000000000000000001234567890123456789012345678901234567890\
             00000000000000000000000000000000000000000000000000000000000003e8",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn decodes_seeded_transfer() {
        let decoder = SignatureDecoder::new(None);
        let decoded = decoder
            .decode_function_call(&transfer_calldata())
            .await
            .unwrap();
        assert_eq!(decoded.name, "transfer");
        assert_eq!(decoded.signature, "transfer(address,uint256)");
        assert_eq!(decoded.inputs.len(), 2);
        assert_eq!(decoded.inputs[0].name, "to");
        assert_eq!(decoded.inputs[1].value, Value::String("1000".to_string()));
    }

    #[tokio::test]
    async fn unknown_selector_is_none() {
        let decoder = SignatureDecoder::new(None);
        let calldata = hex::decode("deadbeef00").unwrap();
        assert!(decoder.decode_function_call(&calldata).await.is_none());
    }

    #[tokio::test]
    async fn short_or_mismatched_input_never_errors() {
        let decoder = SignatureDecoder::new(None);
        // Too short for a selector.
        assert!(decoder.decode_function_call(&[0xa9]).await.is_none());
        // Known selector, truncated arguments.
        let truncated = &transfer_calldata()[..20];
        assert!(decoder.decode_function_call(truncated).await.is_none());
    }

    #[tokio::test]
    async fn max_uint_renders_unlimited() {
        let decoder = SignatureDecoder::new(None);
        let mut calldata = hex::decode("095ea7b3").unwrap();
        calldata.extend_from_slice(&[0u8; 12]);
        calldata.extend_from_slice(&[0x42u8; 20]);
        calldata.extend_from_slice(&[0xffu8; 32]);
        let decoded = decoder.decode_function_call(&calldata).await.unwrap();
        assert_eq!(decoded.name, "approve");
        assert_eq!(
            decoded.inputs[1].value,
            Value::String("unlimited".to_string())
        );
    }

    #[tokio::test]
    async fn decodes_transfer_event() {
        let decoder = SignatureDecoder::new(None);
        let topic0 = format!("{:?}", keccak256("Transfer(address,address,uint256)"));
        let topics = vec![
            topic0,
            format!("0x{}{}", "00".repeat(12), "11".repeat(20)),
            format!("0x{}{}", "00".repeat(12), "22".repeat(20)),
        ];
        let mut data = vec![0u8; 31];
        data.push(0x64); // 100
        let decoded = decoder.decode_event_log(&topics, &data).await.unwrap();
        assert_eq!(decoded.name, "Transfer");
        assert_eq!(decoded.params.len(), 3);
        assert!(decoded.params[0].indexed);
        assert!(!decoded.params[2].indexed);
        assert_eq!(decoded.params[2].value, Value::String("100".to_string()));
    }

    #[tokio::test]
    async fn unlimited_approval_event_value() {
        let decoder = SignatureDecoder::new(None);
        let topic0 = format!("{:?}", keccak256("Approval(address,address,uint256)"));
        let topics = vec![
            topic0,
            format!("0x{}{}", "00".repeat(12), "11".repeat(20)),
            format!("0x{}{}", "00".repeat(12), "22".repeat(20)),
        ];
        let data = vec![0xffu8; 32];
        let decoded = decoder.decode_event_log(&topics, &data).await.unwrap();
        assert_eq!(decoded.name, "Approval");
        assert_eq!(
            decoded.params[2].value,
            Value::String("unlimited".to_string())
        );
    }

    #[tokio::test]
    async fn unknown_topic_is_none() {
        let decoder = SignatureDecoder::new(None);
        let topics = vec![format!("0x{}", "ab".repeat(32))];
        assert!(decoder.decode_event_log(&topics, &[]).await.is_none());
    }

    #[tokio::test]
    async fn registry_candidates_filter_spam_and_cache() {
        // keccak("mint(address,uint256)")[..4]
        let schema = FunctionSchema::parse("mint(address,uint256)").unwrap();
        let registry = Arc::new(StubRegistry {
            candidates: vec![
                "watch_tg_invmru_7878(address,uint256)".to_string(),
                "mint(address,uint256)".to_string(),
            ],
            lookups: AtomicUsize::new(0),
        });
        let decoder = SignatureDecoder::new(Some(registry.clone()));

        let mut calldata = schema.selector.to_vec();
        calldata.extend_from_slice(&[0u8; 12]);
        calldata.extend_from_slice(&[0x11u8; 20]);
        calldata.extend_from_slice(&[0u8; 32]);

        let decoded = decoder.decode_function_call(&calldata).await.unwrap();
        assert_eq!(decoded.name, "mint");

        // Second decode hits the cache, not the registry.
        let _ = decoder.decode_function_call(&calldata).await.unwrap();
        assert_eq!(registry.lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn registry_candidate_with_wrong_selector_is_rejected() {
        let registry = Arc::new(StubRegistry {
            // Valid syntax, but hashes to a different selector.
            candidates: vec!["somethingElse(uint256)".to_string()],
            lookups: AtomicUsize::new(0),
        });
        let decoder = SignatureDecoder::new(Some(registry));
        let calldata = hex::decode("deadbeef0000000000000000000000000000000000000000000000000000000000000001").unwrap();
        assert!(decoder.decode_function_call(&calldata).await.is_none());
    }
}
