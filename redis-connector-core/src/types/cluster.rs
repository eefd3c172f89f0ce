//! Cluster topology types

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Total number of hash slots in a Redis cluster
pub const SLOT_COUNT: u16 = 16384;

/// Represents a slot range in a Redis cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotRange {
    /// Start of the slot range (inclusive)
    pub start: u16,
    /// End of the slot range (inclusive)
    pub end: u16,
}

impl SlotRange {
    /// Create a new slot range
    #[must_use]
    pub const fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    /// Range covering a single slot
    #[must_use]
    pub const fn single(slot: u16) -> Self {
        Self::new(slot, slot)
    }

    /// Check if a slot is within this range
    #[must_use]
    pub const fn contains(&self, slot: u16) -> bool {
        slot >= self.start && slot <= self.end
    }

    /// Number of slots in the range
    pub const fn len(&self) -> usize {
        if self.end < self.start {
            0
        } else {
            (self.end - self.start) as usize + 1
        }
    }

    /// Whether the range covers no slot
    pub const fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

/// Flag reported for a node by `CLUSTER NODES`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeFlag {
    /// The node answering the query
    MySelf,
    /// Master node
    Master,
    /// Replica node
    Replica,
    /// Possibly failing, not yet agreed on
    PFail,
    /// Failing
    Fail,
    /// Untrusted node in handshake
    Handshake,
    /// No known address
    NoAddr,
    /// Replica that never attempts a failover
    NoFailover,
    /// No flags
    NoFlags,
}

impl NodeFlag {
    /// Parse a single flag as printed by the server
    pub fn from_raw(raw: &str) -> Option<Self> {
        Some(match raw {
            "myself" => Self::MySelf,
            "master" => Self::Master,
            "slave" | "replica" => Self::Replica,
            "fail?" => Self::PFail,
            "fail" => Self::Fail,
            "handshake" => Self::Handshake,
            "noaddr" => Self::NoAddr,
            "nofailover" => Self::NoFailover,
            "noflags" => Self::NoFlags,
            _ => return None,
        })
    }
}

/// State of the cluster bus link to a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LinkState {
    /// Link is up
    Connected,
    /// Link is down
    #[default]
    Disconnected,
}

/// A node of a Redis cluster
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClusterNode {
    /// Node ID
    pub id: String,
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Announced hostname, if any
    pub hostname: Option<String>,
    /// Flags reported for the node
    pub flags: BTreeSet<NodeFlag>,
    /// ID of the master when this node is a replica
    pub master_id: Option<String>,
    /// Configuration epoch
    pub config_epoch: u64,
    /// Cluster bus link state
    pub link_state: LinkState,
    /// Slot ranges owned by this node
    pub slots: Vec<SlotRange>,
}

impl ClusterNode {
    /// Create a node known only by its address
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Set the node ID
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Add a flag
    #[must_use]
    pub fn with_flag(mut self, flag: NodeFlag) -> Self {
        self.flags.insert(flag);
        self
    }

    /// Add a served slot range
    #[must_use]
    pub fn with_slots(mut self, range: SlotRange) -> Self {
        self.slots.push(range);
        self
    }

    /// `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether the node is a master
    pub fn is_master(&self) -> bool {
        self.flags.contains(&NodeFlag::Master)
    }

    /// Whether the node is a replica
    pub fn is_replica(&self) -> bool {
        self.flags.contains(&NodeFlag::Replica)
    }

    /// Whether the node is the one that answered the topology query
    pub fn is_myself(&self) -> bool {
        self.flags.contains(&NodeFlag::MySelf)
    }

    /// Connected and not marked as failing
    pub fn is_connected(&self) -> bool {
        self.link_state == LinkState::Connected
            && !self.flags.contains(&NodeFlag::Fail)
            && !self.flags.contains(&NodeFlag::PFail)
    }

    /// Whether the node serves `slot`
    pub fn serves_slot(&self, slot: u16) -> bool {
        self.slots.iter().any(|range| range.contains(slot))
    }

    /// Every slot served by the node
    pub fn served_slots(&self) -> impl Iterator<Item = u16> + '_ {
        self.slots.iter().flat_map(|range| range.start..=range.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_range() {
        let range = SlotRange::new(100, 200);
        assert!(range.contains(100));
        assert!(range.contains(200));
        assert!(!range.contains(201));
        assert_eq!(range.len(), 101);
        assert_eq!(SlotRange::single(5).len(), 1);
    }

    #[test]
    fn test_node_predicates() {
        let node = ClusterNode::new("127.0.0.1", 7000)
            .with_id("abc")
            .with_flag(NodeFlag::Master)
            .with_slots(SlotRange::new(0, 10));
        assert!(node.is_master());
        assert!(!node.is_replica());
        assert!(node.serves_slot(10));
        assert!(!node.serves_slot(11));
        assert_eq!(node.address(), "127.0.0.1:7000");
        assert_eq!(node.served_slots().count(), 11);
        assert!(!node.is_connected());
    }

    #[test]
    fn test_flag_parsing() {
        assert_eq!(NodeFlag::from_raw("slave"), Some(NodeFlag::Replica));
        assert_eq!(NodeFlag::from_raw("fail?"), Some(NodeFlag::PFail));
        assert_eq!(NodeFlag::from_raw("bogus"), None);
    }
}
