//! DeFi protocol detection
//!
//! Best-effort semantic interpretation layered over the parsed call tree:
//! match calls against known contract addresses and function signatures,
//! then extract swap/liquidity detail for the matches. Detection failures
//! never abort a trace inspection.

pub mod detector;
pub mod signatures;

use serde::Serialize;

pub use detector::ProtocolDetector;

/// Kind tag of a detected interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Swap,
    LiquidityAdd,
    LiquidityRemove,
    Lending,
    Borrowing,
    Staking,
    Unstaking,
    YieldFarming,
    FlashLoan,
    Unknown,
}

impl InteractionKind {
    pub fn label(&self) -> &'static str {
        match self {
            InteractionKind::Swap => "swap",
            InteractionKind::LiquidityAdd => "liquidity_add",
            InteractionKind::LiquidityRemove => "liquidity_remove",
            InteractionKind::Lending => "lending",
            InteractionKind::Borrowing => "borrowing",
            InteractionKind::Staking => "staking",
            InteractionKind::Unstaking => "unstaking",
            InteractionKind::YieldFarming => "yield_farming",
            InteractionKind::FlashLoan => "flash_loan",
            InteractionKind::Unknown => "unknown",
        }
    }
}

/// Structured swap detail extracted from a router call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapDetail {
    pub token_in: String,
    pub token_in_symbol: String,
    pub token_out: String,
    pub token_out_symbol: String,
    /// Wei-scale decimal string; "0" when only the other side is knowable
    /// (exact-input vs exact-output variants).
    pub amount_in: String,
    pub amount_out: String,
    /// Resolved symbols along the path for multi-hop swaps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<Vec<String>>,
}

/// Shallow liquidity detail: the pair, when trivially present in the
/// decoded parameters. Amount extraction is an extension point.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidityDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_a: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_b: Option<String>,
}

/// Per-kind payload of an interaction. Each variant carries its own
/// strongly-typed detail instead of one open-ended map.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InteractionDetail {
    Swap(SwapDetail),
    Liquidity(LiquidityDetail),
    None,
}

/// One detected protocol interaction. Created once per matching call,
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefiInteraction {
    pub interaction_type: InteractionKind,
    pub protocol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub description: String,
    pub success: bool,
    pub detail: InteractionDetail,
    pub contract_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    pub confidence: f64,
}

/// Aggregate analysis result for one transaction.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefiAnalysis {
    pub detected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    pub interactions: Vec<DefiInteraction>,
    pub summary: String,
    /// Mean of interaction confidences; 0 when nothing was detected.
    pub confidence: f64,
}
