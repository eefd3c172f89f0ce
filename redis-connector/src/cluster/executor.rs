//! Running commands on explicitly chosen cluster nodes

use super::topology::{ClusterTopology, ClusterTopologyProvider};
use crate::commands::{decode, Command};
use crate::connection::reactive::request;
use crate::connection::RedisConnectionFactory;
use crate::convert::{from_redis_value, to_redis_cmd, translate_error};
use bytes::Bytes;
use futures_util::future::join_all;
use redis::aio::{ConnectionLike, MultiplexedConnection};
use redis_connector_core::error::{NodeFailure, RedisError, RedisResult};
use redis_connector_core::types::ClusterNode;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Hands out connections to individual nodes
#[async_trait::async_trait]
pub trait NodeResourceProvider: Send + Sync {
    /// Connection type used to talk to one node
    type Connection: ConnectionLike + Send;

    /// A connection to the node listening on `host:port`
    async fn connection(&self, host: &str, port: u16) -> RedisResult<Self::Connection>;

    /// Drop whatever is held for `host:port` after the connection failed
    fn release(&self, _host: &str, _port: u16) {}
}

/// Opens one multiplexed connection per node and shares it
pub struct ClientNodeProvider {
    factory: RedisConnectionFactory,
    connections: Mutex<HashMap<String, MultiplexedConnection>>,
}

impl ClientNodeProvider {
    /// Create a provider opening node connections with `factory`
    pub fn new(factory: RedisConnectionFactory) -> Self {
        Self {
            factory,
            connections: Mutex::new(HashMap::new()),
        }
    }

    fn connections(&self) -> MutexGuard<'_, HashMap<String, MultiplexedConnection>> {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl NodeResourceProvider for ClientNodeProvider {
    type Connection = MultiplexedConnection;

    async fn connection(&self, host: &str, port: u16) -> RedisResult<MultiplexedConnection> {
        let address = format!("{host}:{port}");
        let cached = self.connections().get(&address).cloned();
        if let Some(conn) = cached {
            return Ok(conn);
        }
        let conn = self.factory.get_node_connection(host, port).await?;
        self.connections().insert(address, conn.clone());
        Ok(conn)
    }

    fn release(&self, host: &str, port: u16) {
        if self.connections().remove(&format!("{host}:{port}")).is_some() {
            debug!(host, port, "released node connection");
        }
    }
}

impl std::fmt::Debug for ClientNodeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientNodeProvider")
            .field("nodes", &self.connections().keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Reply of one node, with the key it was asked about for per-key commands
#[derive(Debug, Clone, PartialEq)]
pub struct NodeResult<T> {
    node: ClusterNode,
    value: T,
    key: Option<Bytes>,
}

impl<T> NodeResult<T> {
    /// Result of a node-wide command
    pub fn new(node: ClusterNode, value: T) -> Self {
        Self {
            node,
            value,
            key: None,
        }
    }

    /// Result of a command about `key`
    pub fn with_key(node: ClusterNode, value: T, key: Bytes) -> Self {
        Self {
            node,
            value,
            key: Some(key),
        }
    }

    /// The node that replied
    pub fn node(&self) -> &ClusterNode {
        &self.node
    }

    /// The reply
    pub fn value(&self) -> &T {
        &self.value
    }

    /// The key the command was about
    pub fn key(&self) -> Option<&Bytes> {
        self.key.as_ref()
    }

    /// Take the reply
    pub fn into_value(self) -> T {
        self.value
    }

    /// Convert the reply, keeping node and key
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> NodeResult<U> {
        NodeResult {
            node: self.node,
            value: f(self.value),
            key: self.key,
        }
    }
}

/// Replies of every node a command ran on
#[derive(Debug, Clone, PartialEq)]
pub struct MultiNodeResult<T> {
    results: Vec<NodeResult<T>>,
}

impl<T> Default for MultiNodeResult<T> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
        }
    }
}

impl<T> MultiNodeResult<T> {
    /// Wrap node results
    pub fn new(results: Vec<NodeResult<T>>) -> Self {
        Self { results }
    }

    /// The node results, in completion order of submission
    pub fn results(&self) -> &[NodeResult<T>] {
        &self.results
    }

    /// Number of node results
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether no node replied
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Replies without their nodes
    pub fn results_as_list(self) -> Vec<T> {
        self.results.into_iter().map(NodeResult::into_value).collect()
    }

    /// Replies ordered like `keys`
    ///
    /// A key listed twice takes the next reply recorded for it. Replies
    /// without a key come last.
    pub fn results_as_list_sorted_by_keys<K: AsRef<[u8]>>(self, keys: &[K]) -> Vec<T> {
        let mut by_key: HashMap<Bytes, VecDeque<T>> = HashMap::new();
        let mut unkeyed = Vec::new();
        for result in self.results {
            match result.key {
                Some(key) => by_key.entry(key).or_default().push_back(result.value),
                None => unkeyed.push(result.value),
            }
        }
        let mut sorted: Vec<T> = keys
            .iter()
            .filter_map(|key| by_key.get_mut(key.as_ref()).and_then(VecDeque::pop_front))
            .collect();
        sorted.extend(unkeyed);
        sorted
    }

    /// Convert every reply
    pub fn map_results<U>(self, mut f: impl FnMut(T) -> U) -> MultiNodeResult<U> {
        MultiNodeResult {
            results: self.results.into_iter().map(|r| r.map(&mut f)).collect(),
        }
    }
}

impl<T> MultiNodeResult<Option<T>> {
    /// The first reply that is not nil
    pub fn first_non_null_result(self) -> Option<T> {
        self.results.into_iter().find_map(NodeResult::into_value)
    }
}

impl<T> IntoIterator for MultiNodeResult<T> {
    type Item = NodeResult<T>;
    type IntoIter = std::vec::IntoIter<NodeResult<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

/// Runs commands on chosen nodes and aggregates their replies
///
/// Node-targeted commands follow `MOVED` and `ASK` redirects up to the
/// configured limit. When a command runs on several nodes and any of them
/// fails, the call fails with [`RedisError::ClusterCommandExecution`]
/// listing every failed node.
pub struct ClusterCommandExecutor<P> {
    nodes: Arc<P>,
    topology: Arc<dyn ClusterTopologyProvider>,
    max_redirects: usize,
    next_node: AtomicUsize,
}

impl<P: NodeResourceProvider> ClusterCommandExecutor<P> {
    /// Create an executor
    pub fn new(
        nodes: Arc<P>,
        topology: Arc<dyn ClusterTopologyProvider>,
        max_redirects: usize,
    ) -> Self {
        Self {
            nodes,
            topology,
            max_redirects,
            next_node: AtomicUsize::new(0),
        }
    }

    /// The current topology
    pub async fn topology(&self) -> RedisResult<Arc<ClusterTopology>> {
        self.topology.topology().await
    }

    /// Run `command` on one active master, rotating between calls
    pub async fn execute_command_on_arbitrary_node<Cm>(
        &self,
        command: &Cm,
    ) -> RedisResult<NodeResult<Cm::Output>>
    where
        Cm: Command + Sync + ?Sized,
        Cm::Output: Send,
    {
        let topology = self.topology().await?;
        let masters = topology.active_master_nodes();
        if masters.is_empty() {
            return Err(RedisError::Cluster("No active master node".to_string()));
        }
        let node = masters[self.next_node.fetch_add(1, Ordering::Relaxed) % masters.len()].clone();
        let value = self.send_to(&node, command).await?;
        Ok(NodeResult::new(node, value))
    }

    /// Run `command` on `node`, given by address or by ID
    pub async fn execute_command_on_single_node<Cm>(
        &self,
        command: &Cm,
        node: &ClusterNode,
    ) -> RedisResult<NodeResult<Cm::Output>>
    where
        Cm: Command + Sync + ?Sized,
        Cm::Output: Send,
    {
        let node = self.topology().await?.resolve(node)?.clone();
        let value = self.send_to(&node, command).await?;
        Ok(NodeResult::new(node, value))
    }

    /// Run `command` on every node of `nodes` concurrently
    pub async fn execute_command_async_on_nodes<Cm>(
        &self,
        command: &Cm,
        nodes: &[ClusterNode],
    ) -> RedisResult<MultiNodeResult<Cm::Output>>
    where
        Cm: Command + Sync + ?Sized,
        Cm::Output: Send,
    {
        let topology = self.topology().await?;
        let targets = nodes
            .iter()
            .map(|node| topology.resolve(node).cloned())
            .collect::<RedisResult<Vec<_>>>()?;
        self.run_on(command, targets).await
    }

    /// Run `command` on every active master
    pub async fn execute_command_on_all_nodes<Cm>(
        &self,
        command: &Cm,
    ) -> RedisResult<MultiNodeResult<Cm::Output>>
    where
        Cm: Command + Sync + ?Sized,
        Cm::Output: Send,
    {
        let targets = self
            .topology()
            .await?
            .active_master_nodes()
            .into_iter()
            .cloned()
            .collect();
        self.run_on(command, targets).await
    }

    /// Run one command per key, each on the master serving that key
    ///
    /// Every result carries its key, see
    /// [`MultiNodeResult::results_as_list_sorted_by_keys`].
    pub async fn execute_multi_key_command<K, F, Cm>(
        &self,
        keys: &[K],
        command_for: F,
    ) -> RedisResult<MultiNodeResult<Cm::Output>>
    where
        K: AsRef<[u8]>,
        F: Fn(&[u8]) -> Cm,
        Cm: Command + Sync,
        Cm::Output: Send,
    {
        let topology = self.topology().await?;
        let targets = keys
            .iter()
            .map(|key| {
                let key = key.as_ref();
                let node = topology.key_serving_master(key)?.clone();
                Ok((node, Bytes::copy_from_slice(key), command_for(key)))
            })
            .collect::<RedisResult<Vec<_>>>()?;

        let outcomes = join_all(
            targets
                .iter()
                .map(|(node, _, command)| self.send_to(node, command)),
        )
        .await;
        aggregate(
            targets
                .into_iter()
                .zip(outcomes)
                .map(|((node, key, _), outcome)| (node, Some(key), outcome)),
        )
    }

    async fn run_on<Cm>(
        &self,
        command: &Cm,
        targets: Vec<ClusterNode>,
    ) -> RedisResult<MultiNodeResult<Cm::Output>>
    where
        Cm: Command + Sync + ?Sized,
        Cm::Output: Send,
    {
        debug!(
            command = command.command_name(),
            nodes = targets.len(),
            "running on cluster nodes"
        );
        let outcomes = join_all(targets.iter().map(|node| self.send_to(node, command))).await;
        aggregate(
            targets
                .into_iter()
                .zip(outcomes)
                .map(|(node, outcome)| (node, None, outcome)),
        )
    }

    async fn send_to<Cm>(&self, node: &ClusterNode, command: &Cm) -> RedisResult<Cm::Output>
    where
        Cm: Command + Sync + ?Sized,
        Cm::Output: Send,
    {
        let mut host = node.host.clone();
        let mut port = node.port;
        let mut asking = false;

        for _ in 0..=self.max_redirects {
            let mut conn = self.nodes.connection(&host, port).await?;
            let outcome = if asking {
                request_asking(&mut conn, command).await
            } else {
                request(&mut conn, command).await
            };
            match outcome {
                Err(e) if e.is_redirect() => {
                    let Some((target_host, target_port)) = e.redirect_target() else {
                        return Err(e);
                    };
                    asking = matches!(e, RedisError::Ask { .. });
                    if !asking {
                        self.topology.invalidate();
                    }
                    debug!(
                        from = %format!("{host}:{port}"),
                        to = %format!("{target_host}:{target_port}"),
                        asking,
                        "following redirect"
                    );
                    host = target_host;
                    port = target_port;
                }
                Err(e) => {
                    if e.is_connection_failure() {
                        self.nodes.release(&host, port);
                    }
                    return Err(e);
                }
                Ok(value) => return Ok(value),
            }
        }
        Err(RedisError::Cluster(format!(
            "Too many redirects for {} (max {})",
            command.command_name(),
            self.max_redirects
        )))
    }
}

impl<P> std::fmt::Debug for ClusterCommandExecutor<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterCommandExecutor")
            .field("max_redirects", &self.max_redirects)
            .finish_non_exhaustive()
    }
}

/// Send `ASKING` and `command` back to back on one connection
async fn request_asking<Conn, Cm>(conn: &mut Conn, command: &Cm) -> RedisResult<Cm::Output>
where
    Conn: ConnectionLike + ?Sized,
    Cm: Command + ?Sized,
{
    let mut pipe = redis::pipe();
    pipe.cmd("ASKING").add_command(to_redis_cmd(command));
    let mut values = conn
        .req_packed_commands(&pipe, 1, 1)
        .await
        .map_err(translate_error)?;
    let value = values
        .pop()
        .ok_or_else(|| RedisError::UnexpectedResponse("No reply after ASKING".to_string()))?;
    decode(command, from_redis_value(value))
}

fn aggregate<T>(
    outcomes: impl IntoIterator<Item = (ClusterNode, Option<Bytes>, RedisResult<T>)>,
) -> RedisResult<MultiNodeResult<T>> {
    let mut results = Vec::new();
    let mut failures = Vec::new();
    for (node, key, outcome) in outcomes {
        match outcome {
            Ok(value) => results.push(NodeResult { node, value, key }),
            Err(e) => {
                warn!(node = %node.address(), error = %e, "cluster command failed");
                failures.push(NodeFailure::new(node.address(), e));
            }
        }
    }
    if failures.is_empty() {
        Ok(MultiNodeResult::new(results))
    } else {
        Err(RedisError::ClusterCommandExecution(failures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(port: u16) -> ClusterNode {
        ClusterNode::new("127.0.0.1", port)
    }

    #[test]
    fn test_sorted_by_keys() {
        let result = MultiNodeResult::new(vec![
            NodeResult::with_key(node(7001), 2, Bytes::from_static(b"b")),
            NodeResult::with_key(node(7000), 1, Bytes::from_static(b"a")),
            NodeResult::with_key(node(7000), 3, Bytes::from_static(b"a")),
            NodeResult::new(node(7002), 9),
        ]);
        assert_eq!(
            result.results_as_list_sorted_by_keys(&["a", "b", "a"]),
            vec![1, 2, 3, 9]
        );
    }

    #[test]
    fn test_first_non_null_and_map() {
        let result = MultiNodeResult::new(vec![
            NodeResult::new(node(7000), None),
            NodeResult::new(node(7001), Some("k1")),
            NodeResult::new(node(7002), Some("k2")),
        ]);
        let lengths = result.clone().map_results(|v| v.map_or(0, str::len));
        assert_eq!(lengths.results_as_list(), vec![0, 2, 2]);
        assert_eq!(result.first_non_null_result(), Some("k1"));
    }

    #[test]
    fn test_aggregate_collects_every_failure() {
        let outcome = aggregate(vec![
            (node(7000), None, Ok(1)),
            (node(7001), None, Err(RedisError::Timeout)),
            (node(7002), None, Err(RedisError::Server("ERR".into()))),
        ]);
        match outcome {
            Err(RedisError::ClusterCommandExecution(failures)) => {
                let nodes: Vec<_> = failures.iter().map(|f| f.node.as_str()).collect();
                assert_eq!(nodes, ["127.0.0.1:7001", "127.0.0.1:7002"]);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
