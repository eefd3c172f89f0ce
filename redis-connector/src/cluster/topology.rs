//! Cluster topology and its discovery

use super::calculate_slot;
use super::executor::NodeResourceProvider;
use crate::commands::Request;
use crate::connection::reactive::request;
use crate::convert::reply;
use redis_connector_core::error::{NodeFailure, RedisError, RedisResult};
use redis_connector_core::types::ClusterNode;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Snapshot of the nodes forming a cluster
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterTopology {
    nodes: Vec<ClusterNode>,
}

impl ClusterTopology {
    /// Create a topology from parsed nodes
    pub fn new(nodes: Vec<ClusterNode>) -> Self {
        Self { nodes }
    }

    /// Every known node
    pub fn nodes(&self) -> &[ClusterNode] {
        &self.nodes
    }

    /// Nodes with a connected link that are not failing
    pub fn active_nodes(&self) -> Vec<&ClusterNode> {
        self.nodes.iter().filter(|n| n.is_connected()).collect()
    }

    /// Master nodes, active or not
    pub fn master_nodes(&self) -> Vec<&ClusterNode> {
        self.nodes.iter().filter(|n| n.is_master()).collect()
    }

    /// Master nodes that are active
    pub fn active_master_nodes(&self) -> Vec<&ClusterNode> {
        self.nodes
            .iter()
            .filter(|n| n.is_master() && n.is_connected())
            .collect()
    }

    /// Masters serving `slot` followed by their replicas
    pub fn slot_serving_nodes(&self, slot: u16) -> Vec<&ClusterNode> {
        let masters: Vec<&ClusterNode> = self
            .nodes
            .iter()
            .filter(|n| n.is_master() && n.serves_slot(slot))
            .collect();
        let replicas = masters.iter().flat_map(|master| self.replicas_of(master));
        masters.iter().copied().chain(replicas).collect()
    }

    /// Nodes holding `key`, master first
    pub fn key_serving_nodes(&self, key: &[u8]) -> Vec<&ClusterNode> {
        self.slot_serving_nodes(calculate_slot(key))
    }

    /// The master serving `slot`
    pub fn slot_serving_master(&self, slot: u16) -> RedisResult<&ClusterNode> {
        self.nodes
            .iter()
            .find(|n| n.is_master() && n.serves_slot(slot))
            .ok_or_else(|| RedisError::Cluster(format!("No master serves slot {slot}")))
    }

    /// The master serving `key`
    pub fn key_serving_master(&self, key: &[u8]) -> RedisResult<&ClusterNode> {
        self.slot_serving_master(calculate_slot(key))
    }

    /// Node listening on `host:port`
    pub fn lookup(&self, host: &str, port: u16) -> RedisResult<&ClusterNode> {
        self.nodes
            .iter()
            .find(|n| n.host == host && n.port == port)
            .ok_or_else(|| {
                RedisError::Cluster(format!("Node {host}:{port} is unknown to the cluster"))
            })
    }

    /// Node with the given ID
    pub fn lookup_by_id(&self, id: &str) -> RedisResult<&ClusterNode> {
        self.nodes
            .iter()
            .find(|n| n.id == id)
            .ok_or_else(|| RedisError::Cluster(format!("Node {id} is unknown to the cluster")))
    }

    /// The full description of a node given by address or by ID
    pub fn resolve(&self, node: &ClusterNode) -> RedisResult<&ClusterNode> {
        if node.host.is_empty() {
            self.lookup_by_id(&node.id)
        } else {
            self.lookup(&node.host, node.port)
        }
    }

    /// Replicas attached to `master`
    pub fn replicas_of(&self, master: &ClusterNode) -> Vec<&ClusterNode> {
        self.nodes
            .iter()
            .filter(|n| n.is_replica() && n.master_id.as_deref() == Some(master.id.as_str()))
            .collect()
    }
}

/// Source of the current cluster topology
#[async_trait::async_trait]
pub trait ClusterTopologyProvider: Send + Sync {
    /// The current topology
    async fn topology(&self) -> RedisResult<Arc<ClusterTopology>>;

    /// Forget any cached topology, e.g. after a `MOVED` redirect
    fn invalidate(&self) {}
}

struct CachedTopology {
    fetched_at: Instant,
    topology: Arc<ClusterTopology>,
}

/// Asks known nodes for `CLUSTER NODES` and reuses the answer for a while
///
/// Nodes of the last known topology are tried first, then the seed
/// endpoints. When no node answers, the error lists every node failure.
pub struct CachingTopologyProvider<P> {
    nodes: Arc<P>,
    seeds: Vec<(String, u16)>,
    ttl: Duration,
    cache: Mutex<Option<CachedTopology>>,
}

impl<P: NodeResourceProvider> CachingTopologyProvider<P> {
    /// Create a provider querying `seeds` through `nodes`
    pub fn new(nodes: Arc<P>, seeds: Vec<(String, u16)>, ttl: Duration) -> Self {
        Self {
            nodes,
            seeds,
            ttl,
            cache: Mutex::new(None),
        }
    }

    fn cache(&self) -> MutexGuard<'_, Option<CachedTopology>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fresh(&self) -> Option<Arc<ClusterTopology>> {
        self.cache()
            .as_ref()
            .filter(|cached| cached.fetched_at.elapsed() < self.ttl)
            .map(|cached| Arc::clone(&cached.topology))
    }

    fn candidates(&self) -> Vec<(String, u16)> {
        let mut candidates: Vec<(String, u16)> = self
            .cache()
            .as_ref()
            .map(|cached| {
                cached
                    .topology
                    .active_nodes()
                    .into_iter()
                    .map(|n| (n.host.clone(), n.port))
                    .collect()
            })
            .unwrap_or_default();
        for seed in &self.seeds {
            if !candidates.contains(seed) {
                candidates.push(seed.clone());
            }
        }
        candidates
    }

    async fn fetch(&self) -> RedisResult<ClusterTopology> {
        let candidates = self.candidates();
        if candidates.is_empty() {
            return Err(RedisError::Cluster("No cluster nodes known".to_string()));
        }

        let command = Request::new("CLUSTER NODES", reply::cluster_nodes);
        let mut failures = Vec::new();
        for (host, port) in candidates {
            debug!(host = %host, port, "querying cluster topology");
            let outcome = match self.nodes.connection(&host, port).await {
                Ok(mut conn) => request(&mut conn, &command).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(mut nodes) => {
                    // a node unaware of its own address reports an empty host
                    for node in nodes.iter_mut().filter(|n| n.is_myself() && n.host.is_empty()) {
                        node.host.clone_from(&host);
                        node.port = port;
                    }
                    return Ok(ClusterTopology::new(nodes));
                }
                Err(e) => {
                    warn!(host = %host, port, error = %e, "topology query failed");
                    failures.push(NodeFailure::new(format!("{host}:{port}"), e));
                }
            }
        }
        Err(RedisError::ClusterCommandExecution(failures))
    }
}

#[async_trait::async_trait]
impl<P: NodeResourceProvider> ClusterTopologyProvider for CachingTopologyProvider<P> {
    async fn topology(&self) -> RedisResult<Arc<ClusterTopology>> {
        if let Some(topology) = self.fresh() {
            return Ok(topology);
        }
        let topology = Arc::new(self.fetch().await?);
        *self.cache() = Some(CachedTopology {
            fetched_at: Instant::now(),
            topology: Arc::clone(&topology),
        });
        Ok(topology)
    }

    fn invalidate(&self) {
        if let Some(cached) = self.cache().as_mut() {
            cached.fetched_at = Instant::now()
                .checked_sub(self.ttl)
                .unwrap_or(cached.fetched_at);
        }
    }
}

impl<P> std::fmt::Debug for CachingTopologyProvider<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachingTopologyProvider")
            .field("seeds", &self.seeds)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
