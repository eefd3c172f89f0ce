//! Error types for connector operations

use std::fmt;
use std::io;
use thiserror::Error;

/// Result type for connector operations
pub type RedisResult<T> = Result<T, RedisError>;

/// Error type shared by every driver behind the connector
///
/// Driver specific failures are translated into these variants so that
/// callers can react to a timeout or a cluster redirect the same way no
/// matter which client executed the command.
#[derive(Error, Debug)]
pub enum RedisError {
    /// IO error during network operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The driver could not make sense of what the server sent
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Server returned an error
    #[error("Server error: {0}")]
    Server(String),

    /// MOVED redirect in cluster mode
    #[error("MOVED redirect: slot {slot} to {host}:{port}")]
    Moved {
        /// Slot number that was moved
        slot: u16,
        /// Target host
        host: String,
        /// Target port
        port: u16,
    },

    /// ASK redirect in cluster mode
    #[error("ASK redirect: slot {slot} to {host}:{port}")]
    Ask {
        /// Slot number for temporary redirect
        slot: u16,
        /// Target host
        host: String,
        /// Target port
        port: u16,
    },

    /// Connection could not be established or was lost
    #[error("Connection error: {0}")]
    Connection(String),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Type conversion error
    #[error("Type conversion error: {0}")]
    Type(String),

    /// The caller passed arguments the command cannot accept
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Cluster is down or the request spans slots
    #[error("Cluster error: {0}")]
    Cluster(String),

    /// One or more nodes failed while executing a fan-out command
    #[error("Cluster command execution failed on {} node(s): {}", .0.len(), NodeFailures(.0))]
    ClusterCommandExecution(Vec<NodeFailure>),

    /// EVALSHA referenced a script the server does not know
    #[error("No matching script: {0}")]
    NoScript(String),

    /// EXEC was aborted because a queued command was rejected
    #[error("Transaction aborted: {0}")]
    ExecAborted(String),

    /// Authentication error
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Write sent to a read-only replica
    #[error("Read-only replica: {0}")]
    ReadOnly(String),

    /// The driver does not support the requested operation
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Unexpected response from server
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Failure of a single node during a multi-node command
#[derive(Debug)]
pub struct NodeFailure {
    /// Address (`host:port`) of the node that failed
    pub node: String,
    /// What went wrong on that node
    pub error: Box<RedisError>,
}

impl NodeFailure {
    /// Create a new node failure
    pub fn new(node: impl Into<String>, error: RedisError) -> Self {
        Self {
            node: node.into(),
            error: Box::new(error),
        }
    }
}

struct NodeFailures<'a>(&'a [NodeFailure]);

impl fmt::Display for NodeFailures<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{} => {}", failure.node, failure.error)?;
        }
        Ok(())
    }
}

impl RedisError {
    /// Parse a Redis error message to check for MOVED or ASK redirects
    #[must_use]
    pub fn parse_redirect(msg: &str) -> Option<Self> {
        let (is_ask, rest) = if let Some(rest) = msg.strip_prefix("MOVED ") {
            (false, rest)
        } else if let Some(rest) = msg.strip_prefix("ASK ") {
            (true, rest)
        } else {
            return None;
        };

        let parts: Vec<&str> = rest.split_whitespace().collect();
        if parts.len() != 2 {
            return None;
        }
        let slot = parts[0].parse::<u16>().ok()?;
        let (host, port) = parts[1].rsplit_once(':')?;
        let port = port.parse::<u16>().ok()?;
        let host = host.to_string();

        Some(if is_ask {
            Self::Ask { slot, host, port }
        } else {
            Self::Moved { slot, host, port }
        })
    }

    /// Check if this error is a redirect (MOVED or ASK)
    #[must_use]
    pub const fn is_redirect(&self) -> bool {
        matches!(self, Self::Moved { .. } | Self::Ask { .. })
    }

    /// Get the target address from a redirect error
    #[must_use]
    pub fn redirect_target(&self) -> Option<(String, u16)> {
        match self {
            Self::Moved { host, port, .. } | Self::Ask { host, port, .. } => {
                Some((host.clone(), *port))
            }
            _ => None,
        }
    }

    /// Get the slot number from a redirect error
    #[must_use]
    pub const fn redirect_slot(&self) -> Option<u16> {
        match self {
            Self::Moved { slot, .. } | Self::Ask { slot, .. } => Some(*slot),
            _ => None,
        }
    }

    /// Whether retrying on another connection could succeed
    #[must_use]
    pub const fn is_connection_failure(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Connection(_) | Self::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_moved() {
        let err = RedisError::parse_redirect("MOVED 3999 127.0.0.1:6381").unwrap();
        assert!(err.is_redirect());
        assert_eq!(err.redirect_slot(), Some(3999));
        assert_eq!(
            err.redirect_target(),
            Some(("127.0.0.1".to_string(), 6381))
        );
        assert!(matches!(err, RedisError::Moved { .. }));
    }

    #[test]
    fn test_parse_ask() {
        let err = RedisError::parse_redirect("ASK 100 10.0.0.5:7000").unwrap();
        assert!(matches!(err, RedisError::Ask { slot: 100, .. }));
    }

    #[test]
    fn test_parse_not_a_redirect() {
        assert!(RedisError::parse_redirect("ERR unknown command").is_none());
        assert!(RedisError::parse_redirect("MOVED abc 127.0.0.1:6381").is_none());
        assert!(RedisError::parse_redirect("MOVED 1 no-port").is_none());
    }

    #[test]
    fn test_cluster_failure_display() {
        let err = RedisError::ClusterCommandExecution(vec![
            NodeFailure::new("127.0.0.1:7000", RedisError::Timeout),
            NodeFailure::new("127.0.0.1:7001", RedisError::Server("ERR x".into())),
        ]);
        let text = err.to_string();
        assert!(text.contains("2 node(s)"));
        assert!(text.contains("127.0.0.1:7000 => Operation timed out"));
        assert!(text.contains("127.0.0.1:7001 => Server error: ERR x"));
    }
}
