//! Optimistic locking around `MULTI`/`EXEC`
//!
//! `MULTI` and `EXEC` themselves are issued by
//! [`Transaction`](crate::connection::Transaction); only the watch list is
//! managed here.

use super::{CommandExecutor, Request};
use crate::convert::reply;

/// `WATCH` and `UNWATCH`
pub trait TransactionCommands: CommandExecutor {
    /// `WATCH key [key ...]`; the next `EXEC` aborts if any of them changes
    fn watch<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> Self::Reply<'_, ()> {
        self.execute(Request::new("WATCH", reply::ok).multi_key(keys))
    }

    /// `UNWATCH`
    fn unwatch(&mut self) -> Self::Reply<'_, ()> {
        self.execute(Request::new("UNWATCH", reply::ok))
    }
}

impl<T: CommandExecutor> TransactionCommands for T {}
