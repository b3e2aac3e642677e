//! Identifier Space Module
//!
//! Everything that positions nodes and keys on the ring.
//!
//! ## Core Concepts
//! - **Identifier**: a 160-bit SHA-1 digest of an address or key, ordered modulo 2^160.
//! - **Ring arithmetic**: `jump` computes finger targets, `between` tests membership of a
//!   (possibly wrapping) ring interval.
//! - **Edge**: a plain `(address, identifier)` value referring to a ring member. Edges are
//!   copied across RPC boundaries, never shared.

pub mod id;
pub mod types;

pub use id::{Identifier, M, between, hash, jump};
pub use types::{Edge, KVPair, KvMap};

#[cfg(test)]
mod tests;
