//! Peer networking
//!
//! Provides what a node needs to reconcile with its peers.
//!
//! # Features
//! - Peer address registry with validation
//! - Chain fetching over HTTP
//! - Concurrent, time-bounded conflict resolution
//! - Node wiring and startup

pub mod client;
pub mod node;
pub mod registry;
pub mod sync;

pub use client::{parse_chain_response, ChainFetcher, HttpChainFetcher, PeerError};
pub use node::{generate_node_id, Node, NodeConfig};
pub use registry::{parse_node_address, NodeRegistry, RegistryError};
pub use sync::{ChainSync, DEFAULT_PEER_TIMEOUT};
