//! Ledger node
//!
//! Wires the ledger, miner, peer registry and chain sync together and serves
//! the REST API.

use crate::api::{create_router, ApiState};
use crate::consensus::{ChainValidator, ConsensusResolver, ProofOfWork, DEFAULT_DIFFICULTY};
use crate::core::{Ledger, SharedLedger};
use crate::mining::{Miner, MiningControl};
use crate::network::client::{ChainFetcher, HttpChainFetcher};
use crate::network::registry::{NodeRegistry, RegistryError};
use crate::network::sync::{ChainSync, DEFAULT_PEER_TIMEOUT};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Node configuration
#[derive(Clone, Debug)]
pub struct NodeConfig {
    /// Port the REST API listens on
    pub port: u16,
    /// Peers registered at startup
    pub bootstrap_peers: Vec<String>,
    /// Leading zero hex digits required of a proof
    pub difficulty: usize,
    /// Bound on a single peer chain fetch
    pub peer_timeout: Duration,
    /// Run conflict resolution on this interval, if set
    pub resolve_interval: Option<Duration>,
    /// Identifier credited with mining rewards
    pub node_id: String,
}

/// Random 32-hex-character node identifier
pub fn generate_node_id() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            bootstrap_peers: Vec::new(),
            difficulty: DEFAULT_DIFFICULTY,
            peer_timeout: DEFAULT_PEER_TIMEOUT,
            resolve_interval: None,
            node_id: generate_node_id(),
        }
    }
}

/// A single ledger node
pub struct Node {
    pub config: NodeConfig,
    pub ledger: SharedLedger,
    pub registry: Arc<RwLock<NodeRegistry>>,
    pub miner: Arc<Miner>,
    pub control: Arc<MiningControl>,
    pub chain_sync: Arc<ChainSync>,
    /// Stops background tasks; cancelled when the node is dropped
    shutdown: CancellationToken,
}

impl Node {
    /// Create a node that fetches peer chains over HTTP
    pub fn new(config: NodeConfig) -> Result<Self, RegistryError> {
        Self::with_fetcher(config, Arc::new(HttpChainFetcher::new()))
    }

    /// Create a node with a custom peer transport
    pub fn with_fetcher(
        config: NodeConfig,
        fetcher: Arc<dyn ChainFetcher>,
    ) -> Result<Self, RegistryError> {
        let pow = ProofOfWork::new(config.difficulty);
        let ledger = Ledger::with_pow(pow).into_shared();

        let mut registry = NodeRegistry::new();
        for peer in &config.bootstrap_peers {
            registry.register_node(peer)?;
        }
        let registry = Arc::new(RwLock::new(registry));

        let control = Arc::new(MiningControl::new());
        let chain_sync = Arc::new(
            ChainSync::new(
                ledger.clone(),
                registry.clone(),
                fetcher,
                control.clone(),
                ConsensusResolver::new(ChainValidator::new(pow)),
            )
            .with_peer_timeout(config.peer_timeout),
        );
        let miner = Arc::new(Miner::new(&config.node_id));

        Ok(Self {
            config,
            ledger,
            registry,
            miner,
            control,
            chain_sync,
            shutdown: CancellationToken::new(),
        })
    }

    /// Shared state handed to the API handlers
    pub fn api_state(&self) -> ApiState {
        ApiState {
            ledger: self.ledger.clone(),
            registry: self.registry.clone(),
            miner: self.miner.clone(),
            control: self.control.clone(),
            chain_sync: self.chain_sync.clone(),
        }
    }

    /// Stop background tasks owned by this node
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Spawn the periodic resolution loop, if configured. The loop ends on
    /// [`Self::shutdown`] or when the node is dropped.
    fn spawn_resolver(&self) -> Option<JoinHandle<()>> {
        let period = self.config.resolve_interval?;

        let chain_sync = self.chain_sync.clone();
        let shutdown = self.shutdown.clone();
        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // First tick fires immediately
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = interval.tick() => {
                        chain_sync.resolve_conflicts().await;
                    }
                }
            }
            log::debug!("Periodic resolution stopped");
        }))
    }

    /// Start serving; runs until the listener fails
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = format!("0.0.0.0:{}", self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        log::info!(
            "Node {} listening on {} (difficulty {}, {} peers)",
            self.config.node_id,
            addr,
            self.config.difficulty,
            self.registry.read().await.len()
        );

        let resolver = self.spawn_resolver();

        let served = axum::serve(listener, create_router(self.api_state())).await;
        self.shutdown();
        if let Some(resolver) = resolver {
            resolver.await.ok();
        }
        served?;
        Ok(())
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NodeConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.difficulty, 4);
        assert_eq!(config.node_id.len(), 32);
        assert!(config.resolve_interval.is_none());
        assert_ne!(config.node_id, NodeConfig::default().node_id);
    }

    #[tokio::test]
    async fn test_node_registers_bootstrap_peers() {
        let config = NodeConfig {
            bootstrap_peers: vec!["http://10.0.0.1:5000".to_string(), "10.0.0.2:5000".to_string()],
            ..Default::default()
        };

        let node = Node::new(config).unwrap();
        assert_eq!(
            node.registry.read().await.nodes(),
            vec!["10.0.0.1:5000", "10.0.0.2:5000"]
        );
        assert_eq!(node.ledger.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_no_resolver_without_interval() {
        let node = Node::new(NodeConfig::default()).unwrap();
        assert!(node.spawn_resolver().is_none());
    }

    #[tokio::test]
    async fn test_resolver_stops_when_node_dropped() {
        let config = NodeConfig {
            resolve_interval: Some(Duration::from_millis(10)),
            ..Default::default()
        };
        let node = Node::new(config).unwrap();
        let resolver = node.spawn_resolver().unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!resolver.is_finished());

        drop(node);
        tokio::time::timeout(Duration::from_secs(1), resolver)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_stops_resolver() {
        let config = NodeConfig {
            resolve_interval: Some(Duration::from_millis(10)),
            ..Default::default()
        };
        let node = Node::new(config).unwrap();
        let resolver = node.spawn_resolver().unwrap();

        node.shutdown();
        tokio::time::timeout(Duration::from_secs(1), resolver)
            .await
            .unwrap()
            .unwrap();
    }

    #[test]
    fn test_node_rejects_bad_bootstrap_peer() {
        let config = NodeConfig {
            bootstrap_peers: vec!["bad peer".to_string()],
            ..Default::default()
        };

        assert!(matches!(
            Node::new(config),
            Err(RegistryError::InvalidAddress(_))
        ));
    }
}
