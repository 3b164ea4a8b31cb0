//! Protocol detection over the parsed call tree

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde_json::Value;

use super::signatures::{self, ContractRole};
use super::{
    DefiAnalysis, DefiInteraction, InteractionDetail, InteractionKind, LiquidityDetail, SwapDetail,
};
use crate::domain::abi::DecodedFunction;
use crate::domain::token::{TokenResolver, NATIVE_SYMBOL, WRAPPED_NATIVE};
use crate::domain::trace::{ParsedCall, ParsedTrace};

/// Walks a parsed trace and produces a [`DefiAnalysis`].
///
/// Detection is best-effort enrichment: no failure in here may abort the
/// surrounding inspection, so every fallible step degrades to "no detail"
/// instead of propagating.
pub struct ProtocolDetector {
    tokens: Arc<TokenResolver>,
}

impl ProtocolDetector {
    pub fn new(tokens: Arc<TokenResolver>) -> Self {
        Self { tokens }
    }

    /// Visit every call pre-order and collect protocol interactions.
    pub async fn analyze_trace(&self, trace: &ParsedTrace) -> DefiAnalysis {
        let mut interactions = Vec::new();
        let mut stack: Vec<&ParsedCall> = vec![&trace.root_call];
        while let Some(call) = stack.pop() {
            if let Some(interaction) = self.detect_call(call).await {
                interactions.push(interaction);
            }
            // Children pushed reversed so the pop order stays pre-order.
            for child in call.calls.iter().rev() {
                stack.push(child);
            }
        }
        aggregate(interactions)
    }

    /// Try to match one call. The target address is the strongest signal
    /// and is checked first; the decoded function name is the fallback.
    /// Most calls match neither, which is not an error.
    async fn detect_call(&self, call: &ParsedCall) -> Option<DefiInteraction> {
        if let Some(sig) = signatures::lookup_contract(&call.to) {
            return Some(
                self.build_interaction(
                    call,
                    sig.protocol,
                    sig.version.map(str::to_string),
                    sig.name,
                    Some(sig.role),
                    0.9,
                )
                .await,
            );
        }

        let name = call.decoded_function.as_ref().map(|f| f.name.as_str())?;
        let sig = signatures::lookup_function(name)?;
        Some(
            self.build_interaction(call, sig.protocol, None, sig.protocol, None, sig.confidence)
                .await,
        )
    }

    async fn build_interaction(
        &self,
        call: &ParsedCall,
        protocol: &str,
        version: Option<String>,
        label: &str,
        role: Option<ContractRole>,
        confidence: f64,
    ) -> DefiInteraction {
        let function_name = call.decoded_function.as_ref().map(|f| f.name.clone());

        let mut kind = classify(function_name.as_deref());
        if kind == InteractionKind::Unknown && role == Some(ContractRole::Lending) {
            kind = InteractionKind::Lending;
        }

        let detail = match kind {
            InteractionKind::Swap => match self.swap_detail(call).await {
                Some(detail) => InteractionDetail::Swap(detail),
                None => {
                    tracing::debug!(
                        to = %call.to,
                        function = function_name.as_deref().unwrap_or("<undecoded>"),
                        "swap detail extraction failed; keeping bare interaction"
                    );
                    InteractionDetail::None
                }
            },
            InteractionKind::LiquidityAdd | InteractionKind::LiquidityRemove => {
                InteractionDetail::Liquidity(self.liquidity_detail(call).await)
            }
            _ => InteractionDetail::None,
        };

        DefiInteraction {
            interaction_type: kind,
            protocol: protocol.to_string(),
            version,
            description: describe(kind, label),
            success: call.success,
            detail,
            contract_address: call.to.clone(),
            function_name,
            confidence,
        }
    }

    /// Extract structured swap detail from the decoded parameters.
    ///
    /// Router variants encode the trade as a `path` address array; the
    /// V3 single-pool variants as a params tuple. Exact-input calls know
    /// the input amount, exact-output calls the output amount; the other
    /// side is recorded as "0", not omitted.
    async fn swap_detail(&self, call: &ParsedCall) -> Option<SwapDetail> {
        let function = call.decoded_function.as_ref()?;
        let name = function.name.as_str();

        let native_in = name.starts_with("swapExactETH") || name.starts_with("swapETHForExact");
        let native_out = name.ends_with("ForETH");
        let exact_out = name.starts_with("swapTokensForExact")
            || name.starts_with("swapETHForExact")
            || name.starts_with("exactOutput");

        let (token_in, token_out, path) = if let Some(hops) = param_array(function, "path") {
            let addrs: Option<Vec<String>> = hops
                .iter()
                .map(|hop| hop.as_str().map(str::to_string))
                .collect();
            let addrs = addrs?;
            if addrs.len() < 2 {
                return None;
            }
            (addrs[0].clone(), addrs[addrs.len() - 1].clone(), Some(addrs))
        } else if name == "exactInputSingle" || name == "exactOutputSingle" {
            let params = param_array(function, "params")?;
            let token_in = params.first()?.as_str()?.to_string();
            let token_out = params.get(1)?.as_str()?.to_string();
            (token_in, token_out, None)
        } else {
            return None;
        };

        let amount_in = if exact_out {
            "0".to_string()
        } else if native_in {
            call.value.clone()
        } else if name == "exactInputSingle" {
            param_array(function, "params")
                .and_then(|params| params.get(5))
                .and_then(Value::as_str)
                .unwrap_or("0")
                .to_string()
        } else {
            param_string(function, "amountIn").unwrap_or_else(|| "0".to_string())
        };
        let amount_out = if exact_out {
            param_string(function, "amountOut").unwrap_or_else(|| "0".to_string())
        } else {
            "0".to_string()
        };

        let token_in_symbol = if native_in && is_wrapped_native(&token_in) {
            NATIVE_SYMBOL.to_string()
        } else {
            self.symbol_for(&token_in).await
        };
        let token_out_symbol = if native_out && is_wrapped_native(&token_out) {
            NATIVE_SYMBOL.to_string()
        } else {
            self.symbol_for(&token_out).await
        };

        // Multi-hop trades carry the full route; hop resolutions are
        // independent reads and run fanned out.
        let route = match &path {
            Some(addrs) if addrs.len() > 2 => Some(
                futures::future::join_all(addrs.iter().map(|addr| self.symbol_for(addr))).await,
            ),
            _ => None,
        };

        Some(SwapDetail {
            token_in,
            token_in_symbol,
            token_out,
            token_out_symbol,
            amount_in,
            amount_out,
            route,
        })
    }

    async fn liquidity_detail(&self, call: &ParsedCall) -> LiquidityDetail {
        let function = call.decoded_function.as_ref();
        let token_a = function
            .and_then(|f| param_string(f, "tokenA").or_else(|| param_string(f, "token")));
        let token_b = function.and_then(|f| param_string(f, "tokenB"));
        let native_pair = function
            .map(|f| f.name.ends_with("ETH"))
            .unwrap_or(false);

        let token_a = match token_a {
            Some(addr) => Some(self.symbol_for(&addr).await),
            None => None,
        };
        let token_b = match token_b {
            Some(addr) => Some(self.symbol_for(&addr).await),
            None if native_pair => Some(NATIVE_SYMBOL.to_string()),
            None => None,
        };

        LiquidityDetail { token_a, token_b }
    }

    async fn symbol_for(&self, address: &str) -> String {
        match self.tokens.token_info(address).await {
            Some(info) => info.symbol,
            None => short_addr(address),
        }
    }
}

/// Classify an interaction by its function name.
fn classify(function_name: Option<&str>) -> InteractionKind {
    let Some(name) = function_name else {
        return InteractionKind::Unknown;
    };
    if name.starts_with("swap") || name.starts_with("exactInput") || name.starts_with("exactOutput")
    {
        InteractionKind::Swap
    } else if name.starts_with("addLiquidity") {
        InteractionKind::LiquidityAdd
    } else if name.starts_with("removeLiquidity") {
        InteractionKind::LiquidityRemove
    } else if name.starts_with("flashLoan") {
        InteractionKind::FlashLoan
    } else if name.starts_with("borrow") {
        InteractionKind::Borrowing
    } else if name.starts_with("repay") || name.starts_with("supply") || name == "deposit" {
        InteractionKind::Lending
    } else if name.starts_with("unstake") {
        InteractionKind::Unstaking
    } else if name.starts_with("stake") {
        InteractionKind::Staking
    } else if name.starts_with("getReward") || name.starts_with("harvest") {
        InteractionKind::YieldFarming
    } else {
        InteractionKind::Unknown
    }
}

fn describe(kind: InteractionKind, label: &str) -> String {
    match kind {
        InteractionKind::Swap => format!("Token swap on {}", label),
        InteractionKind::LiquidityAdd => format!("Liquidity provision on {}", label),
        InteractionKind::LiquidityRemove => format!("Liquidity removal on {}", label),
        InteractionKind::Lending => format!("Deposit on {}", label),
        InteractionKind::Borrowing => format!("Borrow on {}", label),
        InteractionKind::Staking => format!("Staking on {}", label),
        InteractionKind::Unstaking => format!("Unstaking on {}", label),
        InteractionKind::YieldFarming => format!("Reward harvest on {}", label),
        InteractionKind::FlashLoan => format!("Flash loan on {}", label),
        InteractionKind::Unknown => format!("Interaction with {}", label),
    }
}

fn aggregate(interactions: Vec<DefiInteraction>) -> DefiAnalysis {
    if interactions.is_empty() {
        return DefiAnalysis {
            detected: false,
            protocol: None,
            interactions,
            summary: "No known DeFi protocol interactions detected".to_string(),
            confidence: 0.0,
        };
    }

    let confidence =
        interactions.iter().map(|i| i.confidence).sum::<f64>() / interactions.len() as f64;

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for interaction in &interactions {
        *counts.entry(interaction.protocol.as_str()).or_default() += 1;
    }
    let protocols: BTreeSet<&str> = counts.keys().copied().collect();
    let dominant = counts
        .iter()
        .max_by_key(|(_, count)| **count)
        .map(|(protocol, _)| (*protocol).to_string());

    let summary = if protocols.len() == 1 {
        format!(
            "{} {} interaction(s) detected",
            interactions.len(),
            protocols.iter().next().map(|p| *p).unwrap_or_default()
        )
    } else {
        format!(
            "{} interactions detected across {} protocols",
            interactions.len(),
            protocols.len()
        )
    };

    DefiAnalysis {
        detected: true,
        protocol: dominant,
        interactions,
        summary,
        confidence,
    }
}

fn is_wrapped_native(address: &str) -> bool {
    address.eq_ignore_ascii_case(WRAPPED_NATIVE)
}

fn param_value<'a>(function: &'a DecodedFunction, name: &str) -> Option<&'a Value> {
    function
        .inputs
        .iter()
        .find(|param| param.name == name)
        .map(|param| &param.value)
}

fn param_array<'a>(function: &'a DecodedFunction, name: &str) -> Option<&'a Vec<Value>> {
    param_value(function, name)?.as_array()
}

fn param_string(function: &DecodedFunction, name: &str) -> Option<String> {
    param_value(function, name)?.as_str().map(str::to_string)
}

/// Abbreviate an address for display when no symbol is known.
fn short_addr(address: &str) -> String {
    let trimmed = address.trim();
    if trimmed.len() <= 10 {
        return trimmed.to_string();
    }
    format!("{}..{}", &trimmed[..6], &trimmed[trimmed.len() - 4..])
}
