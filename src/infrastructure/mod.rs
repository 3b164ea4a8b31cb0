//! External collaborators - the signature registry and the chain endpoint
//!
//! The domain layer talks to these through traits; everything here is
//! swappable in tests.

pub mod abi;
pub mod ethereum;
