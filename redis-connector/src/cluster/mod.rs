//! Redis Cluster support
//!
//! Keyed commands on a [`ClusterConnection`] are routed by the native
//! cluster client. Everything that has to address nodes explicitly (fan-out
//! over all masters, per-node info, commands spanning slots) goes through a
//! [`ClusterCommandExecutor`]:
//! - slot calculation using CRC16
//! - topology discovery with `CLUSTER NODES`, cached for a short time
//! - MOVED and ASK redirect handling for node-targeted commands
//! - aggregation of per-node results and per-node failures

pub mod connection;
pub mod executor;
pub mod topology;

pub use connection::ClusterConnection;
pub use executor::{
    ClientNodeProvider, ClusterCommandExecutor, MultiNodeResult, NodeResourceProvider, NodeResult,
};
pub use topology::{CachingTopologyProvider, ClusterTopology, ClusterTopologyProvider};

use crc16::{State, XMODEM};
pub use redis_connector_core::types::cluster::SLOT_COUNT;

/// Calculate the hash slot for a given key
///
/// - If the key contains {...}, only the part between the first { and first } is hashed
/// - Otherwise, the entire key is hashed
/// - The hash is CRC16 mod 16384
pub fn calculate_slot(key: &[u8]) -> u16 {
    State::<XMODEM>::calculate(extract_hash_tag(key)) % SLOT_COUNT
}

/// Extract the hash tag from a key
///
/// `{user1000}.following` and `{user1000}.followers` hash to the same slot.
fn extract_hash_tag(key: &[u8]) -> &[u8] {
    if let Some(start) = key.iter().position(|&b| b == b'{') {
        if let Some(end) = key[start + 1..].iter().position(|&b| b == b'}') {
            let end = start + 1 + end;
            // an empty tag hashes the whole key
            if end > start + 1 {
                return &key[start + 1..end];
            }
        }
    }
    key
}

/// Whether all `keys` hash to one slot
pub fn same_slot<K: AsRef<[u8]>>(keys: &[K]) -> bool {
    let mut slots = keys.iter().map(|k| calculate_slot(k.as_ref()));
    match slots.next() {
        Some(first) => slots.all(|slot| slot == first),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_slot() {
        assert_eq!(calculate_slot(b"123456789"), 12739);
        assert_eq!(calculate_slot(b"foo"), 12182);
        assert!(calculate_slot(b"mykey") < SLOT_COUNT);

        assert_eq!(
            calculate_slot(b"{user1000}.following"),
            calculate_slot(b"{user1000}.followers"),
        );
    }

    #[test]
    fn test_extract_hash_tag() {
        assert_eq!(extract_hash_tag(b"key"), b"key");
        assert_eq!(extract_hash_tag(b"{user}key"), b"user");
        assert_eq!(extract_hash_tag(b"prefix{user}key"), b"user");
        assert_eq!(extract_hash_tag(b"{}"), b"{}");
        assert_eq!(extract_hash_tag(b"no{hash"), b"no{hash");
        assert_eq!(extract_hash_tag(b"{a}{b}"), b"a");
    }

    #[test]
    fn test_same_slot() {
        assert!(same_slot(&["{tag}a", "{tag}b", "x{tag}"]));
        assert!(!same_slot(&["foo", "bar"]));
        assert!(same_slot::<&str>(&[]));
    }
}
