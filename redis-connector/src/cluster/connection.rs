//! Connection to a Redis Cluster

use super::executor::{ClusterCommandExecutor, MultiNodeResult, NodeResourceProvider};
use super::topology::ClusterTopologyProvider;
use super::{calculate_slot, same_slot};
use crate::commands::{Command, CommandExecutor, KeyCommands, Request, StringCommands, TimeCommand};
use crate::connection::AsyncConnection;
use crate::convert::reply;
use bytes::Bytes;
use futures_util::future::BoxFuture;
use redis::aio::ConnectionLike;
use redis_connector_core::error::{RedisError, RedisResult};
use redis_connector_core::types::{ClusterNode, FlushMode, Properties, TimeUnit};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// A cluster connection
///
/// Every command family works on it: keyed commands are routed to the
/// right node by the native cluster client. The inherent methods below
/// address nodes explicitly. Several of them share a name with a family
/// method (`keys`, `db_size`, `del`, `mget`, ...) and take precedence over
/// it, giving the cluster-wide meaning: `db_size` sums the sizes of all
/// masters, `del` accepts keys from different slots.
pub struct ClusterConnection<C, P> {
    native: AsyncConnection<C>,
    executor: ClusterCommandExecutor<P>,
}

impl<C, P> ClusterConnection<C, P>
where
    C: ConnectionLike + Send,
    P: NodeResourceProvider,
{
    /// Combine a native cluster connection with node level access
    pub fn new(
        native: AsyncConnection<C>,
        nodes: Arc<P>,
        topology: Arc<dyn ClusterTopologyProvider>,
        max_redirects: usize,
    ) -> Self {
        Self {
            native,
            executor: ClusterCommandExecutor::new(nodes, topology, max_redirects),
        }
    }

    /// Executor for commands on chosen nodes
    pub const fn executor(&self) -> &ClusterCommandExecutor<P> {
        &self.executor
    }

    /// Connection used for keyed commands
    pub fn native(&mut self) -> &mut AsyncConnection<C> {
        &mut self.native
    }

    /// `CLUSTER NODES`, every node of the cluster
    pub async fn cluster_get_nodes(&self) -> RedisResult<Vec<ClusterNode>> {
        Ok(self.executor.topology().await?.nodes().to_vec())
    }

    /// Replicas of `master`
    pub async fn cluster_get_replicas(&self, master: &ClusterNode) -> RedisResult<Vec<ClusterNode>> {
        let topology = self.executor.topology().await?;
        let master = topology.resolve(master)?;
        Ok(topology.replicas_of(master).into_iter().cloned().collect())
    }

    /// Every master with its replicas
    pub async fn cluster_get_master_replica_map(
        &self,
    ) -> RedisResult<Vec<(ClusterNode, Vec<ClusterNode>)>> {
        let topology = self.executor.topology().await?;
        Ok(topology
            .master_nodes()
            .into_iter()
            .map(|master| {
                let replicas = topology.replicas_of(master).into_iter().cloned().collect();
                (master.clone(), replicas)
            })
            .collect())
    }

    /// Hash slot of `key`
    pub fn cluster_get_slot_for_key<K: AsRef<[u8]>>(&self, key: K) -> u16 {
        calculate_slot(key.as_ref())
    }

    /// Master serving `slot`
    pub async fn cluster_get_node_for_slot(&self, slot: u16) -> RedisResult<ClusterNode> {
        Ok(self
            .executor
            .topology()
            .await?
            .slot_serving_master(slot)?
            .clone())
    }

    /// Master serving `key`
    pub async fn cluster_get_node_for_key<K: AsRef<[u8]>>(&self, key: K) -> RedisResult<ClusterNode> {
        self.cluster_get_node_for_slot(calculate_slot(key.as_ref()))
            .await
    }

    /// `CLUSTER INFO`
    pub async fn cluster_get_cluster_info(&self) -> RedisResult<Properties> {
        let command = Request::new("CLUSTER INFO", reply::info_properties);
        Ok(self
            .executor
            .execute_command_on_arbitrary_node(&command)
            .await?
            .into_value())
    }

    /// `CLUSTER COUNTKEYSINSLOT slot` on the slot's master
    pub async fn cluster_count_keys_in_slot(&self, slot: u16) -> RedisResult<i64> {
        let node = self.cluster_get_node_for_slot(slot).await?;
        let command = Request::new("CLUSTER COUNTKEYSINSLOT", reply::integer).num(slot);
        self.on_node(&command, &node).await
    }

    /// `CLUSTER GETKEYSINSLOT slot count` on the slot's master
    pub async fn cluster_get_keys_in_slot(&self, slot: u16, count: u64) -> RedisResult<Vec<Bytes>> {
        let node = self.cluster_get_node_for_slot(slot).await?;
        let command = Request::new("CLUSTER GETKEYSINSLOT", reply::bytes_list)
            .num(slot)
            .num(count);
        self.on_node(&command, &node).await
    }

    async fn on_node<Cm>(&self, command: &Cm, node: &ClusterNode) -> RedisResult<Cm::Output>
    where
        Cm: Command + Sync + ?Sized,
        Cm::Output: Send,
    {
        Ok(self
            .executor
            .execute_command_on_single_node(command, node)
            .await?
            .into_value())
    }

    async fn on_masters<Cm>(&self, command: &Cm) -> RedisResult<MultiNodeResult<Cm::Output>>
    where
        Cm: Command + Sync + ?Sized,
        Cm::Output: Send,
    {
        self.executor.execute_command_on_all_nodes(command).await
    }

    /// `PING` every master; fails when any does not answer
    pub async fn ping(&self) -> RedisResult<String> {
        let replies = self
            .on_masters(&Request::new("PING", reply::status))
            .await?
            .results_as_list();
        replies
            .into_iter()
            .next()
            .ok_or_else(|| RedisError::Cluster("No active master node".to_string()))
    }

    /// `PING` one node
    pub async fn ping_node(&self, node: &ClusterNode) -> RedisResult<String> {
        self.on_node(&Request::new("PING", reply::status), node).await
    }

    /// `DBSIZE` summed over all masters
    pub async fn db_size(&self) -> RedisResult<i64> {
        Ok(self
            .on_masters(&Request::new("DBSIZE", reply::integer))
            .await?
            .results_as_list()
            .into_iter()
            .sum())
    }

    /// `DBSIZE` of one node
    pub async fn db_size_on(&self, node: &ClusterNode) -> RedisResult<i64> {
        self.on_node(&Request::new("DBSIZE", reply::integer), node).await
    }

    /// `FLUSHALL` on every master
    pub async fn flush_all(&self, mode: Option<FlushMode>) -> RedisResult<()> {
        self.on_masters(&Request::new("FLUSHALL", reply::ok).with(&mode))
            .await
            .map(drop)
    }

    /// `FLUSHDB` on every master
    pub async fn flush_db(&self, mode: Option<FlushMode>) -> RedisResult<()> {
        self.on_masters(&Request::new("FLUSHDB", reply::ok).with(&mode))
            .await
            .map(drop)
    }

    /// `KEYS pattern` on every master, merged
    pub async fn keys<P2: AsRef<[u8]>>(&self, pattern: P2) -> RedisResult<Vec<Bytes>> {
        let command = Request::new("KEYS", reply::bytes_list).arg(pattern);
        let mut seen = HashSet::new();
        let mut keys: Vec<Bytes> = self
            .on_masters(&command)
            .await?
            .results_as_list()
            .into_iter()
            .flatten()
            .collect();
        keys.retain(|key| seen.insert(key.clone()));
        Ok(keys)
    }

    /// `KEYS pattern` on one node
    pub async fn keys_on<P2: AsRef<[u8]>>(&self, node: &ClusterNode, pattern: P2) -> RedisResult<Vec<Bytes>> {
        self.on_node(&Request::new("KEYS", reply::bytes_list).arg(pattern), node)
            .await
    }

    /// `RANDOMKEY` from any master that holds a key
    pub async fn random_key(&self) -> RedisResult<Option<Bytes>> {
        Ok(self
            .on_masters(&Request::new("RANDOMKEY", reply::optional_bytes))
            .await?
            .first_non_null_result())
    }

    /// `INFO` of every master; each property is prefixed with `host:port.`
    pub async fn info(&self) -> RedisResult<Properties> {
        let results = self
            .on_masters(&Request::new("INFO", reply::info_properties))
            .await?;
        let mut merged = Properties::new();
        for result in results {
            let prefix = result.node().address();
            for (name, value) in result.into_value() {
                merged.insert(format!("{prefix}.{name}"), value);
            }
        }
        Ok(merged)
    }

    /// `INFO` of one node
    pub async fn info_on(&self, node: &ClusterNode) -> RedisResult<Properties> {
        self.on_node(&Request::new("INFO", reply::info_properties), node)
            .await
    }

    /// `TIME` of one node, in `unit`
    pub async fn time_on(&self, node: &ClusterNode, unit: TimeUnit) -> RedisResult<i64> {
        self.on_node(&TimeCommand::new(unit), node).await
    }

    /// `SCRIPT FLUSH` on every master
    pub async fn script_flush(&self) -> RedisResult<()> {
        self.on_masters(&Request::new("SCRIPT FLUSH", reply::ok))
            .await
            .map(drop)
    }

    /// `SCRIPT LOAD` on every master, the digest
    pub async fn script_load<S: AsRef<[u8]>>(&self, script: S) -> RedisResult<String> {
        let command = Request::new("SCRIPT LOAD", reply::status).arg(script);
        self.on_masters(&command)
            .await?
            .results_as_list()
            .into_iter()
            .next()
            .ok_or_else(|| RedisError::Cluster("No active master node".to_string()))
    }

    /// `MGET`; keys from several slots are fetched per key and returned in
    /// the order asked for
    pub async fn mget<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> RedisResult<Vec<Option<Bytes>>> {
        if same_slot(keys) {
            return self.native.mget(keys).await;
        }
        Ok(self
            .executor
            .execute_multi_key_command(keys, |key| {
                Request::new("GET", reply::optional_bytes).key(key)
            })
            .await?
            .results_as_list_sorted_by_keys(keys))
    }

    /// `DEL`; keys may live in different slots
    pub async fn del<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> RedisResult<i64> {
        self.count_per_key("DEL", keys).await
    }

    /// `UNLINK`; keys may live in different slots
    pub async fn unlink<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> RedisResult<i64> {
        self.count_per_key("UNLINK", keys).await
    }

    /// `EXISTS`; keys may live in different slots
    pub async fn exists<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> RedisResult<i64> {
        self.count_per_key("EXISTS", keys).await
    }

    async fn count_per_key<K: AsRef<[u8]>>(&mut self, name: &'static str, keys: &[K]) -> RedisResult<i64> {
        if same_slot(keys) {
            return self
                .native
                .execute(Request::new(name, reply::integer).multi_key(keys))
                .await;
        }
        Ok(self
            .executor
            .execute_multi_key_command(keys, |key| Request::new(name, reply::integer).key(key))
            .await?
            .results_as_list()
            .into_iter()
            .sum())
    }

    /// `RENAME`; across slots the value moves with `DUMP`, `RESTORE` and
    /// `DEL`, keeping its remaining TTL
    pub async fn rename<K: AsRef<[u8]>, N: AsRef<[u8]>>(&mut self, key: K, new_key: N) -> RedisResult<()> {
        let (key, new_key) = (key.as_ref(), new_key.as_ref());
        if calculate_slot(key) == calculate_slot(new_key) {
            return KeyCommands::rename(&mut self.native, key, new_key).await;
        }

        debug!("renaming across slots");
        let value = self
            .native
            .dump(key)
            .await?
            .ok_or_else(|| RedisError::Server("ERR no such key".to_string()))?;
        let ttl = match self.native.pttl(key).await? {
            millis if millis > 0 => Duration::from_millis(millis.unsigned_abs()),
            _ => Duration::ZERO,
        };
        self.native.restore(new_key, ttl, value, true).await?;
        KeyCommands::del(&mut self.native, &[key]).await.map(drop)
    }
}

impl<C, P> CommandExecutor for ClusterConnection<C, P>
where
    C: ConnectionLike + Send,
    P: NodeResourceProvider,
{
    type Reply<'a, T> = BoxFuture<'a, RedisResult<T>>
    where
        Self: 'a,
        T: Send + 'static;

    fn execute<Cm>(&mut self, command: Cm) -> BoxFuture<'_, RedisResult<Cm::Output>>
    where
        Cm: Command + Send + 'static,
        Cm::Output: Send + 'static,
    {
        self.native.execute(command)
    }

    fn reject<T>(&mut self, error: RedisError) -> BoxFuture<'_, RedisResult<T>>
    where
        T: Send + 'static,
    {
        self.native.reject(error)
    }
}

impl<C, P> std::fmt::Debug for ClusterConnection<C, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterConnection")
            .field("native", &self.native)
            .field("executor", &self.executor)
            .finish()
    }
}
