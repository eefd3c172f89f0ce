//! Configuration types for Redis connections

use crate::error::{RedisError, RedisResult};
use std::time::Duration;

/// Protocol version preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProtocolVersion {
    /// RESP2 (Redis Serialization Protocol version 2) - Default
    #[default]
    Resp2,
    /// RESP3 (Redis Serialization Protocol version 3) - Redis 6.0+
    Resp3,
}

/// Topology selection mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TopologyMode {
    /// Cluster when more than one endpoint is configured, standalone otherwise
    #[default]
    Auto,
    /// Force standalone mode
    Standalone,
    /// Force cluster mode
    Cluster,
}

/// Configuration for Redis connection
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Connection string (e.g., `<redis://localhost:6379>` or `<redis://host1:6379,host2:6379>`)
    pub connection_string: String,

    /// Optional ACL user name
    pub username: Option<String>,

    /// Optional password for authentication
    pub password: Option<String>,

    /// Database number (only for standalone mode); when unset, a `/db`
    /// path in the connection string is used
    pub database: Option<u8>,

    /// Name announced with `CLIENT SETNAME` after connecting
    pub client_name: Option<String>,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// Read/write operation timeout
    pub operation_timeout: Duration,

    /// Topology selection mode
    pub topology_mode: TopologyMode,

    /// Maximum number of redirects followed by node-targeted cluster commands
    pub max_redirects: usize,

    /// Preferred protocol version
    pub protocol_version: ProtocolVersion,

    /// How long a fetched cluster topology is reused before asking again
    pub topology_cache_ttl: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connection_string: "redis://localhost:6379".to_string(),
            username: None,
            password: None,
            database: None,
            client_name: None,
            connect_timeout: Duration::from_secs(5),
            operation_timeout: Duration::from_secs(30),
            topology_mode: TopologyMode::Auto,
            max_redirects: 5,
            protocol_version: ProtocolVersion::default(),
            topology_cache_ttl: Duration::from_millis(100),
        }
    }
}

impl ConnectionConfig {
    /// Create a new configuration with the given connection string
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            ..Default::default()
        }
    }

    /// Set the ACL user name
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the password for authentication
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the database number
    #[must_use]
    pub const fn with_database(mut self, database: u8) -> Self {
        self.database = Some(database);
        self
    }

    /// Set the client name
    #[must_use]
    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = Some(name.into());
        self
    }

    /// Set the connection timeout
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the operation timeout
    #[must_use]
    pub const fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Set the topology mode
    #[must_use]
    pub const fn with_topology_mode(mut self, mode: TopologyMode) -> Self {
        self.topology_mode = mode;
        self
    }

    /// Set the maximum number of redirects
    #[must_use]
    pub const fn with_max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }

    /// Set the preferred protocol version
    #[must_use]
    pub const fn with_protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.protocol_version = version;
        self
    }

    /// Set how long a cluster topology stays cached
    #[must_use]
    pub const fn with_topology_cache_ttl(mut self, ttl: Duration) -> Self {
        self.topology_cache_ttl = ttl;
        self
    }

    /// Whether this configuration targets a Redis Cluster
    #[must_use]
    pub fn is_cluster(&self) -> bool {
        match self.topology_mode {
            TopologyMode::Cluster => true,
            TopologyMode::Standalone => false,
            TopologyMode::Auto => self.parse_endpoints().len() > 1,
        }
    }

    /// Whether the connection string asks for TLS
    #[must_use]
    pub fn is_tls(&self) -> bool {
        self.connection_string.trim().starts_with("rediss://")
    }

    /// Split the connection string into userinfo, host list and database path
    fn url_parts(&self) -> UrlParts<'_> {
        let conn_str = self.connection_string.trim();
        let rest = conn_str
            .strip_prefix("redis://")
            .or_else(|| conn_str.strip_prefix("rediss://"))
            .unwrap_or(conn_str);

        let (userinfo, rest) = match rest.rsplit_once('@') {
            Some((userinfo, hosts)) => (Some(userinfo), hosts),
            None => (None, rest),
        };
        let rest = rest.split('?').next().unwrap_or(rest);
        let (hosts, database) = match rest.split_once('/') {
            Some((hosts, db)) => (hosts, Some(db).filter(|db| !db.is_empty())),
            None => (rest, None),
        };
        UrlParts {
            userinfo,
            hosts,
            database,
        }
    }

    /// ACL user name: the explicit setting, else `user@` from the URL
    #[must_use]
    pub fn resolved_username(&self) -> Option<String> {
        self.username.clone().or_else(|| {
            let userinfo = self.url_parts().userinfo?;
            let user = userinfo.split_once(':').map_or(userinfo, |(user, _)| user);
            (!user.is_empty()).then(|| user.to_string())
        })
    }

    /// Password: the explicit setting, else `:password@` from the URL
    #[must_use]
    pub fn resolved_password(&self) -> Option<String> {
        self.password.clone().or_else(|| {
            let (_, password) = self.url_parts().userinfo?.split_once(':')?;
            (!password.is_empty()).then(|| password.to_string())
        })
    }

    /// Database: the explicit setting, else the `/db` path of the URL, else 0
    pub fn resolved_database(&self) -> RedisResult<u8> {
        if let Some(database) = self.database {
            return Ok(database);
        }
        match self.url_parts().database {
            Some(path) => path.parse().map_err(|_| {
                RedisError::Config(format!("Invalid database in connection string: {path}"))
            }),
            None => Ok(0),
        }
    }

    /// Parse connection endpoints from connection string
    #[must_use]
    pub fn parse_endpoints(&self) -> Vec<(String, u16)> {
        self.url_parts()
            .hosts
            .split(',')
            .filter_map(|endpoint| {
                let endpoint = endpoint.trim();
                if endpoint.is_empty() {
                    return None;
                }

                if let Some((host, port_str)) = endpoint.rsplit_once(':') {
                    if let Ok(port) = port_str.parse::<u16>() {
                        return Some((host.to_string(), port));
                    }
                }

                Some((endpoint.to_string(), 6379))
            })
            .collect()
    }

    /// Check the configuration for combinations that can never work
    pub fn validate(&self) -> RedisResult<()> {
        if self.parse_endpoints().is_empty() {
            return Err(RedisError::Config("No endpoints specified".to_string()));
        }
        let database = self.resolved_database()?;
        if self.is_cluster() {
            if database != 0 {
                return Err(RedisError::Config(
                    "Cluster mode only supports database 0".to_string(),
                ));
            }
            if self.max_redirects == 0 {
                return Err(RedisError::Config(
                    "Cluster mode needs at least one redirect".to_string(),
                ));
            }
        } else if self.topology_mode == TopologyMode::Standalone
            && self.parse_endpoints().len() > 1
        {
            return Err(RedisError::Config(
                "Standalone mode accepts a single endpoint".to_string(),
            ));
        }
        Ok(())
    }
}

struct UrlParts<'a> {
    userinfo: Option<&'a str>,
    hosts: &'a str,
    database: Option<&'a str>,
}
