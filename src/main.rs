use std::sync::Arc;

use alloy::primitives::B256;
use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tracelens::config;
use tracelens::domain::abi::SignatureDecoder;
use tracelens::domain::defi::ProtocolDetector;
use tracelens::domain::token::{Erc20Source, TokenResolver};
use tracelens::domain::trace::{normalize, TraceParser};
use tracelens::infrastructure::abi::OpenChainClient;
use tracelens::infrastructure::ethereum::{HttpChainSource, TraceSource};
use tracelens::render;

const DEFAULT_RPC: &str = "http://127.0.0.1:8545";

#[derive(Debug, Parser)]
#[command(
    name = "tracelens",
    version,
    about = "Decode and classify an EVM transaction trace"
)]
struct Args {
    /// Transaction hash to inspect
    tx_hash: String,

    /// HTTP JSON-RPC endpoint (must support debug_traceTransaction)
    #[arg(long)]
    rpc: Option<String>,

    /// Emit machine-readable JSON instead of the text report
    #[arg(long)]
    json: bool,

    /// Skip DeFi protocol detection
    #[arg(long)]
    no_defi: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = config::load();

    let endpoint = args
        .rpc
        .or(config.rpc)
        .unwrap_or_else(|| DEFAULT_RPC.to_string());
    let hash: B256 = args.tx_hash.parse().context("invalid transaction hash")?;

    let source = Arc::new(HttpChainSource::connect(&endpoint)?);
    tracing::debug!(endpoint = source.endpoint(), %hash, "fetching trace");

    let raw_trace = source.fetch_trace(hash).await?;
    let (summary, logs) = source.transaction_context(hash).await?;

    let decoder = Arc::new(SignatureDecoder::new(Some(Arc::new(OpenChainClient::new()))));
    let parser = TraceParser::new(decoder);

    let normalized = normalize(&raw_trace)?;
    let trace = parser.parse_trace(&normalized, &logs, summary).await?;

    let analysis = if args.no_defi {
        None
    } else {
        let erc20: Arc<dyn Erc20Source> = source.clone();
        let resolver = Arc::new(TokenResolver::new(Some(erc20)));
        resolver.add_tokens(&config.tokens);
        Some(ProtocolDetector::new(resolver).analyze_trace(&trace).await)
    };

    if args.json {
        println!("{}", render::render_json(&trace, analysis.as_ref())?);
    } else {
        print!("{}", render::render_text(&trace, analysis.as_ref()));
    }

    Ok(())
}
