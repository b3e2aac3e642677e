//! Ring Node Module
//!
//! A `ChordNode` is one member of the ring. It owns the routing state (successor list,
//! predecessor, finger table), the two key-value stores and the background maintenance
//! tasks that keep all of it converging.
//!
//! ## Core Concepts
//! - **Primary store (`data`)**: keys whose identifier falls in `(predecessor, self]`.
//! - **Replica store (`data_pre`)**: a mirror of the predecessor's primary store. When
//!   the predecessor crashes its keys are recovered from here.
//! - **Lifecycle**: `new` → `create` | `join` → `quit` | `force_quit`. Public key-value
//!   operations require a live node.

pub mod service;
pub mod types;

mod kv;
mod lookup;
mod maintenance;
mod membership;

pub use service::ChordNode;
