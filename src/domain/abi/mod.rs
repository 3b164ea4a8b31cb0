//! Signature resolution and ABI decoding
//!
//! Selectors and topic hashes resolve to parameter schemas from a seeded
//! local table, falling back to an external signature registry for
//! functions. Raw call input and log data decode against those schemas
//! via `alloy-dyn-abi`.

mod decoder;
mod schema;
mod seed;

pub use decoder::{
    DecodedEvent, DecodedEventParam, DecodedFunction, DecodedParam, SignatureDecoder,
};
pub use schema::{is_spam_signature, EventParamSpec, EventSchema, FunctionSchema, ParamSpec};

use async_trait::async_trait;

/// External selector registry (e.g. OpenChain).
///
/// Returns candidate human-readable signatures for a selector, best first.
/// A single selector can map to several signatures (hash collisions plus
/// registry spam), so callers iterate and validate.
#[async_trait]
pub trait SelectorRegistry: Send + Sync {
    async fn lookup(&self, selector: [u8; 4]) -> anyhow::Result<Vec<String>>;
}
