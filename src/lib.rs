//! Chord Distributed Hash Table
//!
//! A peer-to-peer key-value store: nodes arrange themselves on a 160-bit identifier ring
//! and each key lives on the first node whose identifier follows the key's hash. The
//! binary (`main.rs`) runs one node.
//!
//! ## Architecture Modules
//! - **`ring`**: identifier arithmetic (`hash`, `jump`, `between`) and the value types
//!   exchanged between nodes.
//! - **`node`**: the ring member itself: lookup, stabilization, join/quit and the
//!   replicated key-value operations.
//! - **`rpc`**: JSON-over-HTTP transport (axum server, reqwest client).
//! - **`config`**: timing and retry budgets, loadable from YAML.
//! - **`error`**: the `ChordError` taxonomy shared by all of the above.

pub mod config;
pub mod error;
pub mod node;
pub mod ring;
pub mod rpc;
