//! HyperLogLog commands

use super::{invalid, CommandExecutor, Request};
use crate::convert::reply;

/// Probabilistic cardinality counters
pub trait HyperLogLogCommands: CommandExecutor {
    /// `PFADD key element [element ...]`, `true` when the estimate changed
    fn pf_add<K: AsRef<[u8]>, V: AsRef<[u8]>>(&mut self, key: K, values: &[V]) -> Self::Reply<'_, bool> {
        self.execute(Request::new("PFADD", reply::boolean).key(key).multi_arg(values))
    }

    /// `PFCOUNT key [key ...]`, estimated cardinality of the union
    fn pf_count<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> Self::Reply<'_, i64> {
        if keys.is_empty() {
            return self.reject(invalid("PFCOUNT needs at least one key"));
        }
        self.execute(Request::new("PFCOUNT", reply::integer).multi_key(keys))
    }

    /// `PFMERGE destination source [source ...]`
    fn pf_merge<D: AsRef<[u8]>, K: AsRef<[u8]>>(
        &mut self,
        destination: D,
        sources: &[K],
    ) -> Self::Reply<'_, ()> {
        self.execute(
            Request::new("PFMERGE", reply::ok)
                .key(destination)
                .multi_key(sources),
        )
    }
}

impl<T: CommandExecutor> HyperLogLogCommands for T {}
