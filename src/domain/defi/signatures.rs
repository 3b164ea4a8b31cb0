//! Static protocol reference tables
//!
//! Address facts about well-known mainnet contracts and name facts about
//! protocol entry-point functions. Read-only; not tied to any one
//! transaction.

/// Role a known contract plays inside its protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractRole {
    Router,
    Factory,
    Pair,
    Pool,
    Lending,
    Vault,
}

/// A known contract address.
#[derive(Debug, Clone, Copy)]
pub struct ContractSignature {
    pub address: &'static str,
    pub name: &'static str,
    pub protocol: &'static str,
    pub version: Option<&'static str>,
    pub role: ContractRole,
}

/// A known protocol entry-point function name.
#[derive(Debug, Clone, Copy)]
pub struct FunctionSignature {
    pub name: &'static str,
    pub protocol: &'static str,
    pub confidence: f64,
}

const CONTRACTS: &[ContractSignature] = &[
    ContractSignature {
        address: "0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D",
        name: "Uniswap V2 Router",
        protocol: "uniswap_v2",
        version: Some("2"),
        role: ContractRole::Router,
    },
    ContractSignature {
        address: "0x5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f",
        name: "Uniswap V2 Factory",
        protocol: "uniswap_v2",
        version: Some("2"),
        role: ContractRole::Factory,
    },
    ContractSignature {
        address: "0xE592427A0AEce92De3Edee1F18E0157C05861564",
        name: "Uniswap V3 Router",
        protocol: "uniswap_v3",
        version: Some("3"),
        role: ContractRole::Router,
    },
    ContractSignature {
        address: "0x68b3465833fb72A70ecDF485E0e4C7bd8665Fc45",
        name: "Uniswap V3 Router 2",
        protocol: "uniswap_v3",
        version: Some("3"),
        role: ContractRole::Router,
    },
    ContractSignature {
        address: "0xd9e1cE17f2641f24aE83637ab66a2cca9C378B9F",
        name: "SushiSwap Router",
        protocol: "sushiswap",
        version: None,
        role: ContractRole::Router,
    },
    ContractSignature {
        address: "0x7d2768dE32b0b80b7a3454c06BdAc94A69DDc7A9",
        name: "Aave V2 Lending Pool",
        protocol: "aave_v2",
        version: Some("2"),
        role: ContractRole::Lending,
    },
    ContractSignature {
        address: "0x87870Bca3F3fD6335C3F4ce8392D69350B4fA4E2",
        name: "Aave V3 Pool",
        protocol: "aave_v3",
        version: Some("3"),
        role: ContractRole::Lending,
    },
    ContractSignature {
        address: "0xbEbc44782C7dB0a1A60Cb6fe97d0b483032FF1C7",
        name: "Curve 3pool",
        protocol: "curve",
        version: None,
        role: ContractRole::Pool,
    },
    ContractSignature {
        address: "0xae7ab96520DE3A18E5e111B5EaAb095312D7fE84",
        name: "Lido stETH",
        protocol: "lido",
        version: None,
        role: ContractRole::Vault,
    },
];

const FUNCTIONS: &[FunctionSignature] = &[
    FunctionSignature { name: "swapExactTokensForTokens", protocol: "uniswap_v2", confidence: 0.95 },
    FunctionSignature { name: "swapTokensForExactTokens", protocol: "uniswap_v2", confidence: 0.95 },
    FunctionSignature { name: "swapExactETHForTokens", protocol: "uniswap_v2", confidence: 0.95 },
    FunctionSignature { name: "swapETHForExactTokens", protocol: "uniswap_v2", confidence: 0.95 },
    FunctionSignature { name: "swapExactTokensForETH", protocol: "uniswap_v2", confidence: 0.95 },
    FunctionSignature { name: "swapTokensForExactETH", protocol: "uniswap_v2", confidence: 0.95 },
    FunctionSignature { name: "addLiquidity", protocol: "uniswap_v2", confidence: 0.9 },
    FunctionSignature { name: "addLiquidityETH", protocol: "uniswap_v2", confidence: 0.9 },
    FunctionSignature { name: "removeLiquidity", protocol: "uniswap_v2", confidence: 0.9 },
    FunctionSignature { name: "removeLiquidityETH", protocol: "uniswap_v2", confidence: 0.9 },
    FunctionSignature { name: "exactInputSingle", protocol: "uniswap_v3", confidence: 0.95 },
    FunctionSignature { name: "exactInput", protocol: "uniswap_v3", confidence: 0.95 },
    FunctionSignature { name: "exactOutputSingle", protocol: "uniswap_v3", confidence: 0.9 },
    FunctionSignature { name: "exactOutput", protocol: "uniswap_v3", confidence: 0.9 },
    FunctionSignature { name: "flashLoan", protocol: "aave", confidence: 0.9 },
    FunctionSignature { name: "borrow", protocol: "aave", confidence: 0.85 },
    FunctionSignature { name: "repay", protocol: "aave", confidence: 0.85 },
    FunctionSignature { name: "supply", protocol: "aave_v3", confidence: 0.85 },
];

/// Exact, case-insensitive address match.
pub fn lookup_contract(address: &str) -> Option<&'static ContractSignature> {
    let trimmed = address.trim();
    CONTRACTS
        .iter()
        .find(|sig| sig.address.eq_ignore_ascii_case(trimmed))
}

/// Exact function-name match.
pub fn lookup_function(name: &str) -> Option<&'static FunctionSignature> {
    FUNCTIONS.iter().find(|sig| sig.name == name)
}
