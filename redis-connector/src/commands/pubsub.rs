//! Publishing and pub/sub introspection
//!
//! Subscribing needs a dedicated connection, see [`crate::pubsub`].

use super::{CommandExecutor, Request};
use crate::convert::reply;
use bytes::Bytes;

/// Commands usable on a regular (non-subscribed) connection
pub trait PubSubCommands: CommandExecutor {
    /// `PUBLISH channel message`, number of receiving clients
    fn publish<C: AsRef<[u8]>, M: AsRef<[u8]>>(&mut self, channel: C, message: M) -> Self::Reply<'_, i64> {
        self.execute(Request::new("PUBLISH", reply::integer).arg(channel).arg(message))
    }

    /// `PUBSUB CHANNELS [pattern]`, channels with at least one subscriber
    fn pubsub_channels(&mut self, pattern: Option<&[u8]>) -> Self::Reply<'_, Vec<Bytes>> {
        let mut request = Request::new("PUBSUB CHANNELS", reply::bytes_list);
        if let Some(pattern) = pattern {
            request = request.arg(pattern);
        }
        self.execute(request)
    }

    /// `PUBSUB NUMSUB [channel ...]`, subscriber count per channel
    fn pubsub_numsub<C: AsRef<[u8]>>(&mut self, channels: &[C]) -> Self::Reply<'_, Vec<(Bytes, i64)>> {
        self.execute(Request::new("PUBSUB NUMSUB", reply::counts).multi_arg(channels))
    }

    /// `PUBSUB NUMPAT`, number of pattern subscriptions
    fn pubsub_numpat(&mut self) -> Self::Reply<'_, i64> {
        self.execute(Request::new("PUBSUB NUMPAT", reply::integer))
    }
}

impl<T: CommandExecutor> PubSubCommands for T {}
