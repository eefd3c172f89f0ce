//! Server administration types

use std::collections::BTreeMap;

/// Key/value view of `INFO`, `CONFIG GET` and `CLUSTER INFO` replies
pub type Properties = BTreeMap<String, String>;

/// Whether a flush runs synchronously or in the background
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushMode {
    /// `SYNC`
    Sync,
    /// `ASYNC`
    Async,
}

impl FlushMode {
    /// Keyword sent to the server
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Sync => "SYNC",
            Self::Async => "ASYNC",
        }
    }
}

/// Persistence behaviour of `SHUTDOWN`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOption {
    /// Save before shutting down
    Save,
    /// Do not save
    NoSave,
}

impl ShutdownOption {
    /// Keyword sent to the server
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Save => "SAVE",
            Self::NoSave => "NOSAVE",
        }
    }
}

/// Option of `MIGRATE`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrateOption {
    /// Keep the key on the source instance
    Copy,
    /// Replace an existing key on the target instance
    Replace,
}

impl MigrateOption {
    /// Keyword sent to the server
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Copy => "COPY",
            Self::Replace => "REPLACE",
        }
    }
}

/// One line of `CLIENT LIST`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    properties: Properties,
}

impl ClientInfo {
    /// Wrap parsed `key=value` pairs
    pub fn new(properties: Properties) -> Self {
        Self { properties }
    }

    /// Raw value of a property
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    /// Client id
    pub fn id(&self) -> Option<i64> {
        self.get_i64("id")
    }

    /// Address and port of the client
    pub fn address_port(&self) -> Option<&str> {
        self.get("addr")
    }

    /// Name set with `CLIENT SETNAME`
    pub fn name(&self) -> Option<&str> {
        self.get("name").filter(|n| !n.is_empty())
    }

    /// Connection age in seconds
    pub fn age(&self) -> Option<i64> {
        self.get_i64("age")
    }

    /// Idle time in seconds
    pub fn idle(&self) -> Option<i64> {
        self.get_i64("idle")
    }

    /// Client flags
    pub fn flags(&self) -> Option<&str> {
        self.get("flags")
    }

    /// Current database
    pub fn database(&self) -> Option<i64> {
        self.get_i64("db")
    }

    /// Last command played
    pub fn last_command(&self) -> Option<&str> {
        self.get("cmd")
    }

    /// All properties
    pub fn properties(&self) -> &Properties {
        &self.properties
    }
}
