//! Connection and server administration commands

use super::{Command, CommandExecutor, Request};
use crate::convert::reply;
use bytes::Bytes;
use redis_connector_core::error::RedisResult;
use redis_connector_core::types::{
    ClientInfo, FlushMode, MigrateOption, Properties, ShutdownOption, TimeUnit,
};
use redis_connector_core::value::RespValue;
use std::time::Duration;

/// `TIME` converted to a caller chosen unit
#[derive(Debug, Clone, Copy)]
pub struct TimeCommand {
    unit: TimeUnit,
}

impl TimeCommand {
    /// Server clock in `unit` since the unix epoch
    pub const fn new(unit: TimeUnit) -> Self {
        Self { unit }
    }
}

impl Command for TimeCommand {
    type Output = i64;

    fn command_name(&self) -> &str {
        "TIME"
    }

    fn args(&self) -> Vec<Bytes> {
        Vec::new()
    }

    fn parse_response(&self, response: RespValue) -> RedisResult<Self::Output> {
        reply::time_in(response, self.unit)
    }

    fn keys(&self) -> Vec<&[u8]> {
        Vec::new()
    }
}

/// Commands about the connection itself
pub trait ConnectionCommands: CommandExecutor {
    /// `PING`
    fn ping(&mut self) -> Self::Reply<'_, String> {
        self.execute(Request::new("PING", reply::status))
    }

    /// `ECHO message`
    fn echo<M: AsRef<[u8]>>(&mut self, message: M) -> Self::Reply<'_, Bytes> {
        self.execute(Request::new("ECHO", reply::bytes).arg(message))
    }

    /// `SELECT index`
    fn select(&mut self, database: u32) -> Self::Reply<'_, ()> {
        self.execute(Request::new("SELECT", reply::ok).num(database))
    }
}

impl<T: CommandExecutor> ConnectionCommands for T {}

/// Server administration
pub trait ServerCommands: CommandExecutor {
    /// `BGREWRITEAOF`, the status line
    fn bg_rewrite_aof(&mut self) -> Self::Reply<'_, String> {
        self.execute(Request::new("BGREWRITEAOF", reply::status))
    }

    /// `BGSAVE`, the status line
    fn bg_save(&mut self) -> Self::Reply<'_, String> {
        self.execute(Request::new("BGSAVE", reply::status))
    }

    /// `LASTSAVE`, unix time in seconds
    fn last_save(&mut self) -> Self::Reply<'_, i64> {
        self.execute(Request::new("LASTSAVE", reply::integer))
    }

    /// `SAVE`
    fn save(&mut self) -> Self::Reply<'_, ()> {
        self.execute(Request::new("SAVE", reply::ok))
    }

    /// `DBSIZE`
    fn db_size(&mut self) -> Self::Reply<'_, i64> {
        self.execute(Request::new("DBSIZE", reply::integer))
    }

    /// `FLUSHDB [SYNC|ASYNC]`
    fn flush_db(&mut self, mode: Option<FlushMode>) -> Self::Reply<'_, ()> {
        self.execute(Request::new("FLUSHDB", reply::ok).with(&mode))
    }

    /// `FLUSHALL [SYNC|ASYNC]`
    fn flush_all(&mut self, mode: Option<FlushMode>) -> Self::Reply<'_, ()> {
        self.execute(Request::new("FLUSHALL", reply::ok).with(&mode))
    }

    /// `INFO`
    fn info(&mut self) -> Self::Reply<'_, Properties> {
        self.execute(Request::new("INFO", reply::info_properties))
    }

    /// `INFO section`
    fn info_section<S: AsRef<[u8]>>(&mut self, section: S) -> Self::Reply<'_, Properties> {
        self.execute(Request::new("INFO", reply::info_properties).arg(section))
    }

    /// `CONFIG GET pattern`
    fn config_get<P: AsRef<[u8]>>(&mut self, pattern: P) -> Self::Reply<'_, Properties> {
        self.execute(Request::new("CONFIG GET", reply::properties_from_pairs).arg(pattern))
    }

    /// `CONFIG SET parameter value`
    fn config_set<P: AsRef<[u8]>, V: AsRef<[u8]>>(&mut self, parameter: P, value: V) -> Self::Reply<'_, ()> {
        self.execute(Request::new("CONFIG SET", reply::ok).arg(parameter).arg(value))
    }

    /// `CONFIG RESETSTAT`
    fn config_reset_stats(&mut self) -> Self::Reply<'_, ()> {
        self.execute(Request::new("CONFIG RESETSTAT", reply::ok))
    }

    /// `CONFIG REWRITE`
    fn config_rewrite(&mut self) -> Self::Reply<'_, ()> {
        self.execute(Request::new("CONFIG REWRITE", reply::ok))
    }

    /// `TIME` in `unit`
    fn time(&mut self, unit: TimeUnit) -> Self::Reply<'_, i64> {
        self.execute(TimeCommand::new(unit))
    }

    /// `CLIENT KILL host:port`
    fn client_kill(&mut self, host: &str, port: u16) -> Self::Reply<'_, ()> {
        self.execute(Request::new("CLIENT KILL", reply::ok).arg(format!("{host}:{port}")))
    }

    /// `CLIENT SETNAME name`
    fn client_set_name<N: AsRef<[u8]>>(&mut self, name: N) -> Self::Reply<'_, ()> {
        self.execute(Request::new("CLIENT SETNAME", reply::ok).arg(name))
    }

    /// `CLIENT GETNAME`
    fn client_get_name(&mut self) -> Self::Reply<'_, Option<String>> {
        self.execute(Request::new("CLIENT GETNAME", reply::optional_string))
    }

    /// `CLIENT LIST`
    fn client_list(&mut self) -> Self::Reply<'_, Vec<ClientInfo>> {
        self.execute(Request::new("CLIENT LIST", reply::client_list))
    }

    /// `REPLICAOF host port`
    fn replica_of(&mut self, host: &str, port: u16) -> Self::Reply<'_, ()> {
        self.execute(Request::new("REPLICAOF", reply::ok).arg(host).num(port))
    }

    /// `REPLICAOF NO ONE`, promote to master
    fn replica_of_no_one(&mut self) -> Self::Reply<'_, ()> {
        self.execute(Request::new("REPLICAOF", reply::ok).arg("NO").arg("ONE"))
    }

    /// `MIGRATE host port key db timeout [COPY|REPLACE]`
    fn migrate<K: AsRef<[u8]>>(
        &mut self,
        host: &str,
        port: u16,
        key: K,
        database: u32,
        timeout: Duration,
        option: Option<MigrateOption>,
    ) -> Self::Reply<'_, ()> {
        self.execute(
            Request::new("MIGRATE", reply::ok)
                .arg(host)
                .num(port)
                .key(key)
                .num(database)
                .num(timeout.as_millis())
                .with(&option),
        )
    }

    /// `SHUTDOWN [SAVE|NOSAVE]`
    ///
    /// A successful shutdown closes the connection, which the driver reports
    /// as a connection error.
    fn shutdown(&mut self, option: Option<ShutdownOption>) -> Self::Reply<'_, ()> {
        let mut request = Request::new("SHUTDOWN", reply::ok);
        if let Some(option) = option {
            request = request.arg(option.keyword());
        }
        self.execute(request)
    }
}

impl<T: CommandExecutor> ServerCommands for T {}
