//! Chain synchronization with peers
//!
//! Fetches every registered peer's chain concurrently, each fetch bounded by
//! a timeout, then applies the longest-valid-chain rule under the ledger's
//! write lock.

use crate::consensus::ConsensusResolver;
use crate::core::{ChainSnapshot, SharedLedger};
use crate::mining::MiningControl;
use crate::network::client::ChainFetcher;
use crate::network::registry::NodeRegistry;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Default bound on a single peer fetch
pub const DEFAULT_PEER_TIMEOUT: Duration = Duration::from_secs(5);

/// Chain synchronization manager
pub struct ChainSync {
    ledger: SharedLedger,
    registry: Arc<RwLock<NodeRegistry>>,
    fetcher: Arc<dyn ChainFetcher>,
    control: Arc<MiningControl>,
    resolver: ConsensusResolver,
    peer_timeout: Duration,
}

impl ChainSync {
    pub fn new(
        ledger: SharedLedger,
        registry: Arc<RwLock<NodeRegistry>>,
        fetcher: Arc<dyn ChainFetcher>,
        control: Arc<MiningControl>,
        resolver: ConsensusResolver,
    ) -> Self {
        Self {
            ledger,
            registry,
            fetcher,
            control,
            resolver,
            peer_timeout: DEFAULT_PEER_TIMEOUT,
        }
    }

    pub fn with_peer_timeout(mut self, peer_timeout: Duration) -> Self {
        self.peer_timeout = peer_timeout;
        self
    }

    /// Fetch all peer chains; failed, slow or malformed peers are skipped
    pub async fn fetch_peer_chains(&self) -> Vec<ChainSnapshot> {
        let peers = self.registry.read().await.nodes();

        let results = join_all(peers.into_iter().map(|peer| {
            let fetcher = Arc::clone(&self.fetcher);
            let timeout = self.peer_timeout;
            tokio::spawn(async move {
                log::debug!("Fetching chain from {}", peer);
                let result = tokio::time::timeout(timeout, fetcher.fetch_chain(&peer)).await;
                (peer, result)
            })
        }))
        .await;

        let mut snapshots = Vec::new();
        for result in results {
            match result {
                Ok((peer, Ok(Ok(snapshot)))) => {
                    log::debug!("Peer {} reports {} blocks", peer, snapshot.length);
                    snapshots.push(snapshot);
                }
                Ok((peer, Ok(Err(e)))) => {
                    log::warn!("Skipping peer {}: {}", peer, e);
                }
                Ok((peer, Err(_))) => {
                    log::warn!(
                        "Skipping peer {}: no response within {:?}",
                        peer,
                        self.peer_timeout
                    );
                }
                Err(e) => {
                    log::error!("Peer fetch task failed: {}", e);
                }
            }
        }

        snapshots
    }

    /// Run one resolution pass; returns whether the local chain was replaced
    pub async fn resolve_conflicts(&self) -> bool {
        let candidates = self.fetch_peer_chains().await;

        let replaced = {
            let mut ledger = self.ledger.write().await;
            ledger.resolve_conflicts(&self.resolver, candidates)
        };

        if replaced {
            // Anything mined against the old tip is wasted work now
            self.control.preempt().await;
        } else {
            log::info!("Local chain is authoritative");
        }

        replaced
    }
}
