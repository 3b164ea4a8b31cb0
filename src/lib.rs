//! tracelens: decode and classify EVM transaction traces
//!
//! The pipeline takes a raw `debug_traceTransaction` payload plus the
//! receipt's logs and produces a normalized, typed call tree with decoded
//! function calls and events, then layers best-effort DeFi protocol
//! detection on top.
//!
//! Stages:
//! 1. [`domain::trace::normalizer`] - fold provider-specific payload shapes
//!    into one canonical form
//! 2. [`domain::trace::builder`] - build the typed call tree, decoding
//!    selectors and revert reasons along the way
//! 3. [`domain::defi`] - match calls against known protocol contracts and
//!    signatures, extract swap/liquidity detail

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod render;
