//! HTTP provider for traces, receipts, and ERC-20 introspection
//!
//! Uses raw JSON requests for the trace and receipt payloads so any EVM
//! chain works, including L2s with non-standard transaction types; the
//! normalizer owns shape handling, so payloads pass through untouched.

use alloy::network::Ethereum;
use alloy::primitives::{keccak256, Address, B256, U256};
use alloy::providers::{
    fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
    Identity, Provider, ProviderBuilder, RootProvider,
};
use alloy::rpc::types::{TransactionInput, TransactionRequest};
use alloy_dyn_abi::{DynSolType, DynSolValue};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::domain::token::Erc20Source;
use crate::domain::trace::normalizer::{parse_quantity, parse_quantity_u256};
use crate::domain::trace::{RawLog, TxSummary};

type HttpFillProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider,
    Ethereum,
>;

/// Everything the pipeline needs from a node for one inspection.
#[async_trait]
pub trait TraceSource: Send + Sync {
    /// Raw `debug_traceTransaction` payload, untouched.
    async fn fetch_trace(&self, hash: B256) -> Result<Value>;

    /// Transaction summary plus the receipt's log list.
    async fn transaction_context(&self, hash: B256) -> Result<(TxSummary, Vec<RawLog>)>;
}

/// HTTP JSON-RPC chain source.
pub struct HttpChainSource {
    provider: HttpFillProvider,
    endpoint: String,
}

impl HttpChainSource {
    pub fn connect(endpoint: &str) -> Result<Self> {
        let url = endpoint
            .parse()
            .with_context(|| format!("invalid RPC endpoint '{}'", endpoint))?;
        Ok(Self {
            provider: ProviderBuilder::new().connect_http(url),
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// `eth_call` a zero-argument function and return the raw bytes.
    async fn call_getter(&self, address: Address, signature: &str) -> Result<Vec<u8>> {
        let selector = &keccak256(signature.as_bytes())[..4];
        let request = TransactionRequest {
            to: Some(address.into()),
            input: TransactionInput::new(selector.to_vec().into()),
            ..Default::default()
        };
        let bytes = self.provider.call(request).await?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl TraceSource for HttpChainSource {
    async fn fetch_trace(&self, hash: B256) -> Result<Value> {
        let options = json!({
            "tracer": "callTracer",
            "tracerConfig": { "withLog": true },
        });
        let trace: Value = self
            .provider
            .raw_request("debug_traceTransaction".into(), (hash, &options))
            .await
            .context("debug_traceTransaction failed; the endpoint must expose debug tracing")?;
        Ok(trace)
    }

    async fn transaction_context(&self, hash: B256) -> Result<(TxSummary, Vec<RawLog>)> {
        let tx: Value = self
            .provider
            .raw_request("eth_getTransactionByHash".into(), (hash,))
            .await
            .context("eth_getTransactionByHash failed")?;
        if tx.is_null() {
            bail!("transaction {hash} not found");
        }

        let receipt: Value = self
            .provider
            .raw_request("eth_getTransactionReceipt".into(), (hash,))
            .await
            .context("eth_getTransactionReceipt failed")?;
        if receipt.is_null() {
            bail!("no receipt for {hash}; transaction may be pending");
        }

        let logs: Vec<RawLog> = receipt
            .get("logs")
            .map(|raw| serde_json::from_value(raw.clone()))
            .transpose()
            .context("receipt log list is malformed")?
            .unwrap_or_default();

        Ok((build_summary(&tx, &receipt), logs))
    }
}

#[async_trait]
impl Erc20Source for HttpChainSource {
    async fn name(&self, address: Address) -> Result<String> {
        decode_string_return(&self.call_getter(address, "name()").await?)
    }

    async fn symbol(&self, address: Address) -> Result<String> {
        decode_string_return(&self.call_getter(address, "symbol()").await?)
    }

    async fn decimals(&self, address: Address) -> Result<u8> {
        decode_u8_return(&self.call_getter(address, "decimals()").await?)
    }
}

fn build_summary(tx: &Value, receipt: &Value) -> TxSummary {
    let field = |value: &Value, key: &str| {
        value
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    TxSummary {
        hash: field(tx, "hash").unwrap_or_default(),
        block_number: field(receipt, "blockNumber")
            .as_deref()
            .and_then(parse_quantity)
            .unwrap_or(0),
        from: field(tx, "from").unwrap_or_default(),
        to: field(tx, "to"),
        value: field(tx, "value")
            .as_deref()
            .and_then(parse_quantity_u256)
            .unwrap_or_default()
            .to_string(),
        gas_used: field(receipt, "gasUsed")
            .as_deref()
            .and_then(parse_quantity)
            .unwrap_or(0),
        gas_price: field(receipt, "effectiveGasPrice")
            .or_else(|| field(tx, "gasPrice"))
            .as_deref()
            .and_then(parse_quantity_u256)
            .unwrap_or_default()
            .to_string(),
        status: field(receipt, "status")
            .as_deref()
            .and_then(parse_quantity)
            .map(|status| status == 1)
            .unwrap_or(true),
    }
}

/// Decode a string-returning getter. Standard tokens ABI-encode a string;
/// a few older ones (MKR-style) return a right-padded bytes32.
fn decode_string_return(data: &[u8]) -> Result<String> {
    let tuple = DynSolType::Tuple(vec![DynSolType::String]);
    if let Ok(DynSolValue::Tuple(values)) = tuple.abi_decode(data) {
        if let Some(DynSolValue::String(value)) = values.into_iter().next() {
            let trimmed = value.trim().to_string();
            if !trimmed.is_empty() {
                return Ok(trimmed);
            }
        }
    }

    if data.len() == 32 {
        let end = data.iter().position(|byte| *byte == 0).unwrap_or(32);
        let value = std::str::from_utf8(&data[..end])
            .context("bytes32 getter return is not UTF-8")?
            .trim()
            .to_string();
        if !value.is_empty() {
            return Ok(value);
        }
    }

    bail!("empty or undecodable string return")
}

fn decode_u8_return(data: &[u8]) -> Result<u8> {
    let tuple = DynSolType::Tuple(vec![DynSolType::Uint(8)]);
    if let Ok(DynSolValue::Tuple(values)) = tuple.abi_decode(data) {
        if let Some(DynSolValue::Uint(value, _)) = values.into_iter().next() {
            if value <= U256::from(u8::MAX) {
                return Ok(value.to::<u64>() as u8);
            }
            bail!("decimals value {value} out of range");
        }
    }
    bail!("undecodable decimals return")
}
