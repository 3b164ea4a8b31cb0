use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct TokenSpec {
    pub address: String,
    pub symbol: Option<String>,
    pub decimals: Option<u8>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Default HTTP JSON-RPC endpoint; overridden by --rpc.
    pub rpc: Option<String>,

    /// Extra tokens merged into the well-known table.
    #[serde(default)]
    pub tokens: Vec<TokenSpec>,
}

impl TokenSpec {
    pub fn normalized_address(&self) -> String {
        normalize_address(&self.address)
    }

    pub fn display_symbol(&self) -> String {
        self.symbol
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| short_addr(&self.address))
    }
}

/// Load the config file, degrading to defaults when it is missing or
/// unparseable.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(_) => return Config::default(),
    };
    toml::from_str::<Config>(&content).unwrap_or_default()
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("TRACELENS_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("tracelens").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join("tracelens").join("config.toml"));
    }

    directories::ProjectDirs::from("io", "tracelens", "tracelens")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn normalize_address(address: &str) -> String {
    let trimmed = address.trim();
    let payload = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    format!("0x{}", payload.to_lowercase())
}

fn short_addr(value: &str) -> String {
    let value = value.trim();
    if value.len() <= 10 {
        return value.to_string();
    }
    let start: String = value.chars().take(6).collect();
    let end: String = value
        .chars()
        .rev()
        .take(4)
        .collect::<String>()
        .chars()
        .rev()
        .collect();
    format!("{}..{}", start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_spec_normalizes() {
        let spec = TokenSpec {
            address: "0XABCDEF0123456789abcdef0123456789ABCDEF01".to_string(),
            symbol: None,
            decimals: None,
        };
        assert_eq!(
            spec.normalized_address(),
            "0xabcdef0123456789abcdef0123456789abcdef01"
        );
        assert_eq!(spec.display_symbol(), "0XABCD..EF01");
    }

    #[test]
    fn config_parses_tokens_table() {
        let config: Config = toml::from_str(
            r#"
            rpc = "http://127.0.0.1:8545"

            [[tokens]]
            address = "0x1111111111111111111111111111111111111111"
            symbol = "TEST"
            decimals = 9
            "#,
        )
        .unwrap();
        assert_eq!(config.rpc.as_deref(), Some("http://127.0.0.1:8545"));
        assert_eq!(config.tokens.len(), 1);
        assert_eq!(config.tokens[0].decimals, Some(9));
    }
}
