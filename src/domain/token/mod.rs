//! Token metadata resolution
//!
//! Resolves a contract address to a symbol/decimals record, from a
//! well-known table or by probing the address as if it were an ERC-20.
//! The probe is duck-typed: any address can be asked, and each of the
//! three reads fails independently.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use alloy_primitives::Address;
use async_trait::async_trait;
use serde::Serialize;

use crate::config::TokenSpec;

/// Canonical wrapped-native-currency contract (WETH on mainnet).
pub const WRAPPED_NATIVE: &str = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";

/// Display symbol for the chain's native currency.
pub const NATIVE_SYMBOL: &str = "ETH";

/// Resolved token metadata. Immutable once cached; token metadata is
/// treated as effectively constant.
#[derive(Debug, Clone, Serialize)]
pub struct TokenInfo {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Live ERC-20 introspection, one read per field.
///
/// Each read is independently fallible: a contract may implement `symbol`
/// but not `name`, or be no token at all. Implementations return whatever
/// the contract gave back and let the resolver fold the three results.
#[async_trait]
pub trait Erc20Source: Send + Sync {
    async fn name(&self, address: Address) -> anyhow::Result<String>;
    async fn symbol(&self, address: Address) -> anyhow::Result<String>;
    async fn decimals(&self, address: Address) -> anyhow::Result<u8>;
}

/// Address-keyed (case-insensitive) token metadata cache with optional
/// live introspection behind it.
pub struct TokenResolver {
    source: Option<Arc<dyn Erc20Source>>,
    cache: RwLock<HashMap<String, TokenInfo>>,
}

impl TokenResolver {
    /// Create a resolver seeded with the well-known mainnet tokens.
    pub fn new(source: Option<Arc<dyn Erc20Source>>) -> Self {
        let cache = well_known()
            .into_iter()
            .map(|info| (info.address.to_lowercase(), info))
            .collect();
        Self {
            source,
            cache: RwLock::new(cache),
        }
    }

    /// Merge user-configured tokens into the cache. Config entries win
    /// over the built-in table.
    pub fn add_tokens(&self, specs: &[TokenSpec]) {
        let mut cache = self.cache.write().expect("token cache poisoned");
        for spec in specs {
            let key = spec.normalized_address();
            let symbol = spec.display_symbol();
            cache.insert(
                key.clone(),
                TokenInfo {
                    address: spec.address.clone(),
                    name: symbol.clone(),
                    symbol,
                    decimals: spec.decimals.unwrap_or(18),
                },
            );
        }
    }

    /// Resolve metadata for an address, probing the chain on a cache
    /// miss. Returns `None` for addresses that do not look like a token.
    ///
    /// Unresolvable addresses are deliberately not negative-cached, so a
    /// later run (or a flaky read) can retry.
    pub async fn token_info(&self, address: &str) -> Option<TokenInfo> {
        let key = address.trim().to_lowercase();
        if let Some(info) = self.cached(&key) {
            return Some(info);
        }

        let source = self.source.as_ref()?;
        let parsed: Address = address.trim().parse().ok()?;

        // Three independent probes; a failing read degrades to absent
        // rather than aborting the resolution.
        let name = source.name(parsed).await.ok();
        let symbol = source.symbol(parsed).await.ok();
        let decimals = source.decimals(parsed).await.ok();

        if name.is_none() && symbol.is_none() {
            return None;
        }

        let symbol = symbol
            .clone()
            .or_else(|| name.clone())
            .unwrap_or_default();
        let info = TokenInfo {
            address: parsed.to_checksum(None),
            name: name.unwrap_or_else(|| symbol.clone()),
            symbol,
            decimals: decimals.unwrap_or(18),
        };

        self.cache
            .write()
            .expect("token cache poisoned")
            .insert(key, info.clone());
        Some(info)
    }

    /// Cache-only lookup. Never performs I/O; safe from formatting paths
    /// that must not block.
    pub fn cached_token_info(&self, address: &str) -> Option<TokenInfo> {
        self.cached(&address.trim().to_lowercase())
    }

    fn cached(&self, key: &str) -> Option<TokenInfo> {
        self.cache
            .read()
            .expect("token cache poisoned")
            .get(key)
            .cloned()
    }
}

fn well_known() -> Vec<TokenInfo> {
    let table: &[(&str, &str, &str, u8)] = &[
        (WRAPPED_NATIVE, "Wrapped Ether", "WETH", 18),
        (
            "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
            "USD Coin",
            "USDC",
            6,
        ),
        (
            "0xdAC17F958D2ee523a2206206994597C13D831ec7",
            "Tether USD",
            "USDT",
            6,
        ),
        (
            "0x6B175474E89094C44Da98b954EedeAC495271d0F",
            "Dai Stablecoin",
            "DAI",
            18,
        ),
        (
            "0x2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599",
            "Wrapped BTC",
            "WBTC",
            8,
        ),
        (
            "0x1f9840a85d5aF5bf1D1762F925BDADdC4201F984",
            "Uniswap",
            "UNI",
            18,
        ),
        (
            "0x514910771AF9Ca656af840dff83E8264EcF986CA",
            "ChainLink Token",
            "LINK",
            18,
        ),
        (
            "0x7Fc66500c84A76Ad7e9c93437bFc5Ac33E2DDaE9",
            "Aave Token",
            "AAVE",
            18,
        ),
    ];
    table
        .iter()
        .map(|(address, name, symbol, decimals)| TokenInfo {
            address: (*address).to_string(),
            name: (*name).to_string(),
            symbol: (*symbol).to_string(),
            decimals: *decimals,
        })
        .collect()
}
