//! DeFi detection scenarios over parsed traces

use std::sync::Arc;

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{keccak256, Address, U256};
use serde_json::json;

use tracelens::domain::abi::{DecodedFunction, DecodedParam, SignatureDecoder};
use tracelens::domain::defi::{InteractionDetail, InteractionKind, ProtocolDetector};
use tracelens::domain::token::TokenResolver;
use tracelens::domain::trace::{normalize, ParsedTrace, TraceParser, TxSummary};

const UNISWAP_V2_ROUTER: &str = "0x7a250d5630b4cf539739df2c5dacb4c659f2488d";
const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";
const WETH: &str = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";
const DAI: &str = "0x6B175474E89094C44Da98b954EedeAC495271d0F";
const SENDER: &str = "0x1111111111111111111111111111111111111111";

fn summary() -> TxSummary {
    TxSummary {
        hash: "0xfeed".to_string(),
        block_number: 18_000_000,
        from: SENDER.to_string(),
        to: Some(UNISWAP_V2_ROUTER.to_string()),
        value: "0".to_string(),
        gas_used: 150_000,
        gas_price: "20000000000".to_string(),
        status: true,
    }
}

fn detector() -> ProtocolDetector {
    ProtocolDetector::new(Arc::new(TokenResolver::new(None)))
}

fn addr(value: &str) -> Address {
    value.parse().unwrap()
}

/// ABI-encode a V2 router swap call with the given path.
fn swap_input(signature: &str, amount_in: Option<u64>, path: &[&str]) -> String {
    let selector = &keccak256(signature.as_bytes())[..4];
    let path_value = DynSolValue::Array(
        path.iter()
            .map(|hop| DynSolValue::Address(addr(hop)))
            .collect(),
    );
    let mut fields = Vec::new();
    if let Some(amount) = amount_in {
        fields.push(DynSolValue::Uint(U256::from(amount), 256));
    }
    fields.extend([
        DynSolValue::Uint(U256::ZERO, 256), // amountOutMin
        path_value,
        DynSolValue::Address(addr(SENDER)),
        DynSolValue::Uint(U256::from(1_700_000_000u64), 256), // deadline
    ]);
    let args = DynSolValue::Tuple(fields).abi_encode();
    format!("0x{}{}", hex::encode(selector), hex::encode(args))
}

async fn parse(raw: serde_json::Value) -> ParsedTrace {
    let parser = TraceParser::new(Arc::new(SignatureDecoder::new(None)));
    let normalized = normalize(&raw).unwrap();
    parser
        .parse_trace(&normalized, &[], summary())
        .await
        .unwrap()
}

#[tokio::test]
async fn router_swap_is_detected_with_address_confidence() {
    let input = swap_input(
        "swapExactTokensForTokens(uint256,uint256,address[],address,uint256)",
        Some(1_000_000_000), // 1000 USDC
        &[USDC, WETH],
    );
    let trace = parse(json!({
        "type": "CALL",
        "from": SENDER,
        "to": UNISWAP_V2_ROUTER,
        "gasUsed": "0x249f0",
        "input": input,
    }))
    .await;

    let analysis = detector().analyze_trace(&trace).await;

    assert!(analysis.detected);
    assert_eq!(analysis.interactions.len(), 1);
    let interaction = &analysis.interactions[0];
    assert_eq!(interaction.interaction_type, InteractionKind::Swap);
    assert_eq!(interaction.protocol, "uniswap_v2");
    // swapExactTokensForTokens also sits in the function table at 0.95,
    // but the address match takes priority and its confidence wins.
    assert_eq!(interaction.confidence, 0.9);
    assert_eq!(analysis.confidence, 0.9);
    assert_eq!(analysis.protocol.as_deref(), Some("uniswap_v2"));

    let InteractionDetail::Swap(detail) = &interaction.detail else {
        panic!("expected swap detail, got {:?}", interaction.detail);
    };
    assert_eq!(detail.token_in_symbol, "USDC");
    assert_eq!(detail.token_out_symbol, "WETH");
    assert_eq!(detail.amount_in, "1000000000");
    // Exact-input variant: the output side is unknowable, recorded as 0.
    assert_eq!(detail.amount_out, "0");
    assert!(detail.route.is_none());
}

#[tokio::test]
async fn multi_hop_swap_populates_route() {
    let input = swap_input(
        "swapExactTokensForTokens(uint256,uint256,address[],address,uint256)",
        Some(500),
        &[USDC, WETH, DAI],
    );
    let trace = parse(json!({
        "type": "CALL",
        "from": SENDER,
        "to": UNISWAP_V2_ROUTER,
        "input": input,
    }))
    .await;

    let analysis = detector().analyze_trace(&trace).await;
    let InteractionDetail::Swap(detail) = &analysis.interactions[0].detail else {
        panic!("expected swap detail");
    };
    assert_eq!(detail.token_in_symbol, "USDC");
    assert_eq!(detail.token_out_symbol, "DAI");
    assert_eq!(
        detail.route.as_deref(),
        Some(&["USDC".to_string(), "WETH".to_string(), "DAI".to_string()][..])
    );
}

#[tokio::test]
async fn native_leg_displays_as_eth_and_takes_call_value() {
    let input = swap_input(
        "swapExactETHForTokens(uint256,address[],address,uint256)",
        None, // amountIn is the call value for the native-in variant
        &[WETH, USDC],
    );
    let trace = parse(json!({
        "type": "CALL",
        "from": SENDER,
        "to": UNISWAP_V2_ROUTER,
        "value": "0xde0b6b3a7640000", // 1 ETH
        "input": input,
    }))
    .await;

    let analysis = detector().analyze_trace(&trace).await;
    let InteractionDetail::Swap(detail) = &analysis.interactions[0].detail else {
        panic!("expected swap detail");
    };
    assert_eq!(detail.token_in_symbol, "ETH");
    assert_eq!(detail.token_out_symbol, "USDC");
    assert_eq!(detail.amount_in, "1000000000000000000");
}

#[tokio::test]
async fn exact_output_variant_records_unknown_input_as_zero() {
    let selector = &keccak256(
        b"swapTokensForExactTokens(uint256,uint256,address[],address,uint256)",
    )[..4];
    let args = DynSolValue::Tuple(vec![
        DynSolValue::Uint(U256::from(777u64), 256), // amountOut
        DynSolValue::Uint(U256::MAX, 256),          // amountInMax
        DynSolValue::Array(vec![
            DynSolValue::Address(addr(USDC)),
            DynSolValue::Address(addr(WETH)),
        ]),
        DynSolValue::Address(addr(SENDER)),
        DynSolValue::Uint(U256::from(1_700_000_000u64), 256),
    ])
    .abi_encode();
    let input = format!("0x{}{}", hex::encode(selector), hex::encode(args));

    let trace = parse(json!({
        "type": "CALL",
        "from": SENDER,
        "to": UNISWAP_V2_ROUTER,
        "input": input,
    }))
    .await;

    let analysis = detector().analyze_trace(&trace).await;
    let InteractionDetail::Swap(detail) = &analysis.interactions[0].detail else {
        panic!("expected swap detail");
    };
    assert_eq!(detail.amount_out, "777");
    assert_eq!(detail.amount_in, "0");
}

#[tokio::test]
async fn function_only_match_uses_signature_confidence() {
    // Same calldata, but an unknown router clone: no address match, so
    // the decoded function name carries the detection.
    let input = swap_input(
        "swapExactTokensForTokens(uint256,uint256,address[],address,uint256)",
        Some(42),
        &[USDC, WETH],
    );
    let trace = parse(json!({
        "type": "CALL",
        "from": SENDER,
        "to": "0x9999999999999999999999999999999999999999",
        "input": input,
    }))
    .await;

    let analysis = detector().analyze_trace(&trace).await;
    assert!(analysis.detected);
    assert_eq!(analysis.interactions[0].confidence, 0.95);
    assert_eq!(analysis.interactions[0].protocol, "uniswap_v2");
}

#[tokio::test]
async fn malformed_path_degrades_to_bare_interaction() {
    // Hand-built call whose decoded path is garbage; extraction must
    // degrade, not panic or poison the whole analysis.
    let mut trace = parse(json!({
        "type": "CALL",
        "from": SENDER,
        "to": "0x9999999999999999999999999999999999999999",
        "input": "0x",
    }))
    .await;
    trace.root_call.decoded_function = Some(DecodedFunction {
        name: "swapExactTokensForTokens".to_string(),
        signature: "swapExactTokensForTokens(uint256,uint256,address[],address,uint256)"
            .to_string(),
        inputs: vec![DecodedParam {
            name: "path".to_string(),
            kind: "address[]".to_string(),
            value: serde_json::Value::String("garbage".to_string()),
        }],
    });

    let analysis = detector().analyze_trace(&trace).await;

    assert!(analysis.detected);
    assert_eq!(analysis.interactions.len(), 1);
    assert!(matches!(
        analysis.interactions[0].detail,
        InteractionDetail::None
    ));
}

#[tokio::test]
async fn plain_transfer_detects_nothing() {
    let input = [
        "0xa9059cbb",
        "0000000000000000000000002222222222222222222222222222222222222222",
        "00000000000000000000000000000000000000000000000000000000000003e8",
    ]
    .concat();
    let trace = parse(json!({
        "type": "CALL",
        "from": SENDER,
        "to": USDC,
        "input": input,
    }))
    .await;

    let analysis = detector().analyze_trace(&trace).await;
    assert!(!analysis.detected);
    assert!(analysis.interactions.is_empty());
    assert_eq!(analysis.confidence, 0.0);
    assert!(analysis.protocol.is_none());
}

#[tokio::test]
async fn nested_router_call_is_found_in_subtree() {
    let input = swap_input(
        "swapExactTokensForTokens(uint256,uint256,address[],address,uint256)",
        Some(1),
        &[USDC, WETH],
    );
    let trace = parse(json!({
        "type": "CALL",
        "from": SENDER,
        "to": "0x8888888888888888888888888888888888888888",
        "input": "0x",
        "calls": [{
            "type": "CALL",
            "from": "0x8888888888888888888888888888888888888888",
            "to": UNISWAP_V2_ROUTER,
            "input": input,
        }],
    }))
    .await;

    let analysis = detector().analyze_trace(&trace).await;
    assert!(analysis.detected);
    assert_eq!(analysis.interactions.len(), 1);
    assert_eq!(analysis.interactions[0].contract_address.to_lowercase(), UNISWAP_V2_ROUTER);
}

#[tokio::test]
async fn liquidity_add_gets_pair_detail() {
    let selector = &keccak256(
        b"addLiquidity(address,address,uint256,uint256,uint256,uint256,address,uint256)",
    )[..4];
    let args = DynSolValue::Tuple(vec![
        DynSolValue::Address(addr(USDC)),
        DynSolValue::Address(addr(WETH)),
        DynSolValue::Uint(U256::from(1000u64), 256),
        DynSolValue::Uint(U256::from(1u64), 256),
        DynSolValue::Uint(U256::ZERO, 256),
        DynSolValue::Uint(U256::ZERO, 256),
        DynSolValue::Address(addr(SENDER)),
        DynSolValue::Uint(U256::from(1_700_000_000u64), 256),
    ])
    .abi_encode();
    let input = format!("0x{}{}", hex::encode(selector), hex::encode(args));

    let trace = parse(json!({
        "type": "CALL",
        "from": SENDER,
        "to": UNISWAP_V2_ROUTER,
        "input": input,
    }))
    .await;

    let analysis = detector().analyze_trace(&trace).await;
    let interaction = &analysis.interactions[0];
    assert_eq!(interaction.interaction_type, InteractionKind::LiquidityAdd);
    let InteractionDetail::Liquidity(detail) = &interaction.detail else {
        panic!("expected liquidity detail");
    };
    assert_eq!(detail.token_a.as_deref(), Some("USDC"));
    assert_eq!(detail.token_b.as_deref(), Some("WETH"));
}
