//! Chain access via alloy

mod provider;

pub use provider::{HttpChainSource, TraceSource};
