//! Blocking subscriptions

use super::{names, to_message, MessageListener, Subscriptions};
use crate::connection::BlockingConnection;
use crate::convert::translate_error;
use bytes::Bytes;
use redis_connector_core::error::RedisResult;
use redis_connector_core::types::Message;
use std::collections::BTreeSet;
use std::ops::ControlFlow;
use std::time::Duration;
use tracing::debug;

impl BlockingConnection<redis::Connection> {
    /// Put the connection in subscribed mode
    ///
    /// The connection is unsubscribed from everything when the subscription
    /// is dropped.
    pub fn subscription(&mut self) -> BlockingSubscription<'_> {
        BlockingSubscription::new(self.get_mut().as_pubsub())
    }
}

/// A blocking subscription over a borrowed connection
pub struct BlockingSubscription<'a> {
    inner: redis::PubSub<'a>,
    subscriptions: Subscriptions,
}

impl<'a> BlockingSubscription<'a> {
    /// Wrap a driver subscription
    pub fn new(inner: redis::PubSub<'a>) -> Self {
        Self {
            inner,
            subscriptions: Subscriptions::default(),
        }
    }

    /// `SUBSCRIBE channel [channel ...]`
    pub fn subscribe<C: AsRef<[u8]>>(&mut self, channels: &[C]) -> RedisResult<()> {
        let channels = names(channels);
        self.inner
            .subscribe(channels.clone())
            .map_err(translate_error)?;
        debug!(count = channels.len(), "subscribed to channels");
        self.subscriptions.add_channels(&channels);
        Ok(())
    }

    /// `PSUBSCRIBE pattern [pattern ...]`
    pub fn psubscribe<P: AsRef<[u8]>>(&mut self, patterns: &[P]) -> RedisResult<()> {
        let patterns = names(patterns);
        self.inner
            .psubscribe(patterns.clone())
            .map_err(translate_error)?;
        debug!(count = patterns.len(), "subscribed to patterns");
        self.subscriptions.add_patterns(&patterns);
        Ok(())
    }

    /// `UNSUBSCRIBE [channel ...]`; no channels means all of them
    pub fn unsubscribe<C: AsRef<[u8]>>(&mut self, channels: &[C]) -> RedisResult<()> {
        let channels = names(channels);
        self.inner
            .unsubscribe(channels.clone())
            .map_err(translate_error)?;
        self.subscriptions.remove_channels(&channels);
        Ok(())
    }

    /// `PUNSUBSCRIBE [pattern ...]`; no patterns means all of them
    pub fn punsubscribe<P: AsRef<[u8]>>(&mut self, patterns: &[P]) -> RedisResult<()> {
        let patterns = names(patterns);
        self.inner
            .punsubscribe(patterns.clone())
            .map_err(translate_error)?;
        self.subscriptions.remove_patterns(&patterns);
        Ok(())
    }

    /// Channels currently subscribed to
    pub fn channels(&self) -> &BTreeSet<Bytes> {
        self.subscriptions.channels()
    }

    /// Patterns currently subscribed to
    pub fn patterns(&self) -> &BTreeSet<Bytes> {
        self.subscriptions.patterns()
    }

    /// Whether any channel or pattern is subscribed
    pub fn is_alive(&self) -> bool {
        self.subscriptions.is_alive()
    }

    /// Limit how long [`next_message`](Self::next_message) waits; `None`
    /// waits forever
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> RedisResult<()> {
        self.inner.set_read_timeout(timeout).map_err(translate_error)
    }

    /// Wait for the next message
    pub fn next_message(&mut self) -> RedisResult<Message> {
        let msg = self.inner.get_message().map_err(translate_error)?;
        Ok(to_message(&msg))
    }

    /// Hand messages to `listener` until it breaks or receiving fails
    pub fn listen<L: MessageListener + ?Sized>(&mut self, listener: &mut L) -> RedisResult<()> {
        loop {
            let message = self.next_message()?;
            if let ControlFlow::Break(()) = listener.on_message(message) {
                return Ok(());
            }
        }
    }
}

impl std::fmt::Debug for BlockingSubscription<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingSubscription")
            .field("subscriptions", &self.subscriptions)
            .finish_non_exhaustive()
    }
}
