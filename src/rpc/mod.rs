//! Node-to-node and client transport.
//!
//! - **`protocol`**: endpoint paths and the JSON DTOs.
//! - **`client`**: outbound calls with bounded retry (`reqwest`).
//! - **`handlers`** / **`server`**: the inbound `axum` router that maps each endpoint onto
//!   a `ChordNode` operation.

pub mod client;
pub mod handlers;
pub mod protocol;
pub mod server;

#[cfg(test)]
mod tests;
