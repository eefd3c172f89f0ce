//! Async subscriptions

use super::{names, to_message, MessageListener, Subscriptions};
use crate::convert::translate_error;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use redis_connector_core::error::RedisResult;
use redis_connector_core::types::Message;
use std::collections::BTreeSet;
use std::ops::ControlFlow;
use tracing::debug;

/// An async subscription on a dedicated pub/sub connection
///
/// Messages are consumed as a [`Stream`], either borrowed with
/// [`messages`](Self::messages) so channels can still be changed
/// afterwards, or owned with [`into_messages`](Self::into_messages).
pub struct ReactiveSubscription {
    inner: redis::aio::PubSub,
    subscriptions: Subscriptions,
}

impl ReactiveSubscription {
    /// Wrap a driver pub/sub connection
    pub fn new(inner: redis::aio::PubSub) -> Self {
        Self {
            inner,
            subscriptions: Subscriptions::default(),
        }
    }

    /// `SUBSCRIBE channel [channel ...]`
    pub async fn subscribe<C: AsRef<[u8]>>(&mut self, channels: &[C]) -> RedisResult<()> {
        let channels = names(channels);
        self.inner
            .subscribe(channels.clone())
            .await
            .map_err(translate_error)?;
        debug!(count = channels.len(), "subscribed to channels");
        self.subscriptions.add_channels(&channels);
        Ok(())
    }

    /// `PSUBSCRIBE pattern [pattern ...]`
    pub async fn psubscribe<P: AsRef<[u8]>>(&mut self, patterns: &[P]) -> RedisResult<()> {
        let patterns = names(patterns);
        self.inner
            .psubscribe(patterns.clone())
            .await
            .map_err(translate_error)?;
        debug!(count = patterns.len(), "subscribed to patterns");
        self.subscriptions.add_patterns(&patterns);
        Ok(())
    }

    /// `UNSUBSCRIBE [channel ...]`; no channels means all of them
    pub async fn unsubscribe<C: AsRef<[u8]>>(&mut self, channels: &[C]) -> RedisResult<()> {
        let channels = names(channels);
        self.inner
            .unsubscribe(channels.clone())
            .await
            .map_err(translate_error)?;
        self.subscriptions.remove_channels(&channels);
        Ok(())
    }

    /// `PUNSUBSCRIBE [pattern ...]`; no patterns means all of them
    pub async fn punsubscribe<P: AsRef<[u8]>>(&mut self, patterns: &[P]) -> RedisResult<()> {
        let patterns = names(patterns);
        self.inner
            .punsubscribe(patterns.clone())
            .await
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

    /// Messages as they arrive; ends when the connection closes
    pub fn messages(&mut self) -> impl Stream<Item = Message> + '_ {
        self.inner.on_message().map(|msg| to_message(&msg))
    }

    /// Consume the subscription into its message stream
    pub fn into_messages(self) -> impl Stream<Item = Message> {
        self.inner.into_on_message().map(|msg| to_message(&msg))
    }

    /// Hand messages to `listener` until it breaks or the connection closes
    pub async fn listen<L: MessageListener + ?Sized>(&mut self, listener: &mut L) {
        let mut messages = Box::pin(self.messages());
        while let Some(message) = messages.next().await {
            if let ControlFlow::Break(()) = listener.on_message(message) {
                break;
            }
        }
    }
}

impl std::fmt::Debug for ReactiveSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactiveSubscription")
            .field("subscriptions", &self.subscriptions)
            .finish_non_exhaustive()
    }
}
