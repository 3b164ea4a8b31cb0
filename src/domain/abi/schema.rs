//! Parameter schemas - parsed signature strings ready for decoding

use alloy_dyn_abi::DynSolType;
use alloy_primitives::{keccak256, B256};
use anyhow::{bail, Context, Result};

/// A function parameter specification.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    /// Parameter name (may be empty for registry-resolved signatures).
    pub name: String,
    /// Solidity type (e.g. "address", "uint256", "address[]").
    pub kind: String,
}

/// A resolvable function signature.
#[derive(Debug, Clone)]
pub struct FunctionSchema {
    pub selector: [u8; 4],
    pub name: String,
    /// Canonical signature string, e.g. "transfer(address,uint256)".
    pub signature: String,
    pub inputs: Vec<ParamSpec>,
}

impl FunctionSchema {
    /// Parse a human-readable signature into a schema. The selector is
    /// computed from the canonical signature, never taken on trust.
    pub fn parse(signature: &str) -> Result<Self> {
        let (name, kinds) = split_signature(signature)?;
        let canonical = format!("{}({})", name, kinds.join(","));
        let selector: [u8; 4] = keccak256(canonical.as_bytes())[..4]
            .try_into()
            .expect("keccak digest is 32 bytes");
        let inputs = kinds
            .into_iter()
            .enumerate()
            .map(|(idx, kind)| ParamSpec {
                name: format!("arg{}", idx),
                kind,
            })
            .collect();
        Ok(Self {
            selector,
            name,
            signature: canonical,
            inputs,
        })
    }

    /// Parse a signature and attach parameter names, used for the seeded
    /// well-known table. Extra names are ignored, missing ones stay
    /// positional.
    pub fn parse_named(signature: &str, names: &[&str]) -> Result<Self> {
        let mut schema = Self::parse(signature)?;
        for (input, name) in schema.inputs.iter_mut().zip(names) {
            input.name = (*name).to_string();
        }
        Ok(schema)
    }

    pub fn selector_hex(&self) -> String {
        format!("0x{}", hex::encode(self.selector))
    }
}

/// An event parameter specification.
#[derive(Debug, Clone)]
pub struct EventParamSpec {
    pub name: String,
    pub kind: String,
    pub indexed: bool,
}

/// A decodable event signature, keyed by its topic hash.
#[derive(Debug, Clone)]
pub struct EventSchema {
    pub topic: B256,
    pub name: String,
    pub signature: String,
    pub params: Vec<EventParamSpec>,
}

impl EventSchema {
    /// Parse an event signature with per-parameter names and indexed
    /// flags. The topic hash is computed from the canonical signature.
    pub fn parse(signature: &str, names: &[&str], indexed: &[bool]) -> Result<Self> {
        let (name, kinds) = split_signature(signature)?;
        let canonical = format!("{}({})", name, kinds.join(","));
        let topic = keccak256(canonical.as_bytes());
        let params = kinds
            .into_iter()
            .enumerate()
            .map(|(idx, kind)| EventParamSpec {
                name: names
                    .get(idx)
                    .map(|n| (*n).to_string())
                    .unwrap_or_else(|| format!("arg{}", idx)),
                kind,
                indexed: indexed.get(idx).copied().unwrap_or(false),
            })
            .collect();
        Ok(Self {
            topic,
            name,
            signature: canonical,
            params,
        })
    }
}

/// Split "name(type,type,...)" into the name and canonical type strings.
/// Nested tuples and arrays are handled by parsing the whole parameter
/// list as one tuple type.
fn split_signature(signature: &str) -> Result<(String, Vec<String>)> {
    let normalized: String = signature.chars().filter(|c| !c.is_whitespace()).collect();
    let open = normalized
        .find('(')
        .context("signature is missing an opening parenthesis")?;
    let close = normalized
        .rfind(')')
        .context("signature is missing a closing parenthesis")?;
    if close <= open {
        bail!("malformed parentheses in signature");
    }

    let name = normalized[..open].to_string();
    if name.is_empty() {
        bail!("signature has no function name");
    }

    let params = &normalized[open..=close];
    if params == "()" {
        return Ok((name, Vec::new()));
    }

    let parsed = DynSolType::parse(params)
        .with_context(|| format!("unparseable parameter list '{}'", params))?;
    let kinds = match parsed {
        DynSolType::Tuple(types) => types
            .iter()
            .map(|ty| ty.sol_type_name().into_owned())
            .collect(),
        other => vec![other.sol_type_name().into_owned()],
    };
    Ok((name, kinds))
}

/// Registry spam filter.
///
/// Public signature databases accept arbitrary submissions, so collisions
/// are routinely squatted with junk entries. Reject anything whose name is
/// not a plausible Solidity identifier or that matches known spam shapes.
pub fn is_spam_signature(signature: &str) -> bool {
    let name = match signature.split('(').next() {
        Some(name) => name.trim(),
        None => return true,
    };

    if name.is_empty() || name.len() > 128 || signature.len() > 512 {
        return true;
    }

    let mut chars = name.chars();
    let head_ok = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        .unwrap_or(false);
    if !head_ok || !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
    {
        return true;
    }

    // Well-known squatting patterns observed in the wild.
    const SPAM_MARKERS: &[&str] = &["watch_tg_invmru", "join_tg_invmru"];
    SPAM_MARKERS
        .iter()
        .any(|marker| name.to_ascii_lowercase().starts_with(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_computes_selector() {
        let schema = FunctionSchema::parse("transfer(address,uint256)").unwrap();
        assert_eq!(schema.selector, [0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(schema.name, "transfer");
        assert_eq!(schema.inputs.len(), 2);
        assert_eq!(schema.inputs[0].kind, "address");
        assert_eq!(schema.inputs[0].name, "arg0");
    }

    #[test]
    fn parse_named_attaches_names() {
        let schema =
            FunctionSchema::parse_named("transfer(address,uint256)", &["to", "amount"]).unwrap();
        assert_eq!(schema.inputs[0].name, "to");
        assert_eq!(schema.inputs[1].name, "amount");
    }

    #[test]
    fn nested_tuples_survive_splitting() {
        let schema =
            FunctionSchema::parse("exactInputSingle((address,address,uint24,address,uint256,uint256,uint256,uint160))")
                .unwrap();
        assert_eq!(schema.inputs.len(), 1);
        assert!(schema.inputs[0].kind.starts_with('('));
    }

    #[test]
    fn zero_parameter_signature() {
        let schema = FunctionSchema::parse("deposit()").unwrap();
        assert_eq!(schema.selector, [0xd0, 0xe3, 0x0d, 0xb0]);
        assert!(schema.inputs.is_empty());
    }

    #[test]
    fn malformed_signatures_fail() {
        assert!(FunctionSchema::parse("no parens").is_err());
        assert!(FunctionSchema::parse("(address)").is_err());
        assert!(FunctionSchema::parse("f(nonsense_type)").is_err());
    }

    #[test]
    fn event_schema_topic_hash() {
        let schema = EventSchema::parse(
            "Transfer(address,address,uint256)",
            &["from", "to", "value"],
            &[true, true, false],
        )
        .unwrap();
        assert_eq!(
            format!("{:?}", schema.topic),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
        assert!(schema.params[0].indexed);
        assert!(!schema.params[2].indexed);
    }

    #[test]
    fn spam_filter_rejects_junk() {
        assert!(is_spam_signature("watch_tg_invmru_8c9d7f3(address,uint256)"));
        assert!(is_spam_signature("not an identifier(uint256)"));
        assert!(is_spam_signature("(uint256)"));
        assert!(!is_spam_signature("transfer(address,uint256)"));
        assert!(!is_spam_signature("_privateThing(bytes32)"));
    }
}
