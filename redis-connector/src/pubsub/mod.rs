//! Pub/Sub support
//!
//! Publishing is a regular command (see
//! [`PubSubCommands`](crate::commands::PubSubCommands)). Receiving needs a
//! connection of its own that stays in subscribed mode:
//! [`BlockingSubscription`] borrows a blocking connection for that,
//! [`ReactiveSubscription`] owns a dedicated async pub/sub connection.
//!
//! ```no_run
//! use redis_connector::connection::RedisConnectionFactory;
//! use redis_connector::ConnectionConfig;
//! use futures_util::StreamExt;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let factory = RedisConnectionFactory::new(ConnectionConfig::new("redis://localhost:6379"))?;
//! let mut subscription = factory.get_async_subscription().await?;
//! subscription.subscribe(&["news", "updates"]).await?;
//!
//! let mut messages = subscription.messages();
//! while let Some(message) = messages.next().await {
//!     println!("{:?} on {:?}", message.body_str(), message.channel);
//! }
//! # Ok(())
//! # }
//! ```

pub mod blocking;
pub mod reactive;

pub use blocking::BlockingSubscription;
pub use reactive::ReactiveSubscription;

use bytes::Bytes;
use redis_connector_core::types::Message;
use std::collections::BTreeSet;
use std::ops::ControlFlow;

/// Receives messages until it asks to stop
///
/// Closures `FnMut(Message) -> ControlFlow<()>` are listeners too.
pub trait MessageListener {
    /// Handle one message; `Break` ends listening
    fn on_message(&mut self, message: Message) -> ControlFlow<()>;
}

impl<F> MessageListener for F
where
    F: FnMut(Message) -> ControlFlow<()>,
{
    fn on_message(&mut self, message: Message) -> ControlFlow<()> {
        self(message)
    }
}

/// Channels and patterns a subscription currently listens to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Subscriptions {
    channels: BTreeSet<Bytes>,
    patterns: BTreeSet<Bytes>,
}

impl Subscriptions {
    pub(crate) fn channels(&self) -> &BTreeSet<Bytes> {
        &self.channels
    }

    pub(crate) fn patterns(&self) -> &BTreeSet<Bytes> {
        &self.patterns
    }

    pub(crate) fn is_alive(&self) -> bool {
        !self.channels.is_empty() || !self.patterns.is_empty()
    }

    pub(crate) fn add_channels(&mut self, names: &[Vec<u8>]) {
        self.channels.extend(names.iter().cloned().map(Bytes::from));
    }

    pub(crate) fn add_patterns(&mut self, names: &[Vec<u8>]) {
        self.patterns.extend(names.iter().cloned().map(Bytes::from));
    }

    /// An empty list drops every channel, like `UNSUBSCRIBE` without arguments
    pub(crate) fn remove_channels(&mut self, names: &[Vec<u8>]) {
        remove(&mut self.channels, names);
    }

    /// An empty list drops every pattern
    pub(crate) fn remove_patterns(&mut self, names: &[Vec<u8>]) {
        remove(&mut self.patterns, names);
    }
}

fn remove(set: &mut BTreeSet<Bytes>, names: &[Vec<u8>]) {
    if names.is_empty() {
        set.clear();
    } else {
        for name in names {
            set.remove(name.as_slice());
        }
    }
}

/// Owned argument list for the driver's subscribe calls
pub(crate) fn names<N: AsRef<[u8]>>(names: &[N]) -> Vec<Vec<u8>> {
    names.iter().map(|n| n.as_ref().to_vec()).collect()
}

/// Convert a driver message
pub(crate) fn to_message(msg: &redis::Msg) -> Message {
    let channel = msg
        .get_channel::<Vec<u8>>()
        .unwrap_or_else(|_| msg.get_channel_name().as_bytes().to_vec());
    let body = Bytes::copy_from_slice(msg.get_payload_bytes());
    match msg.from_pattern().then(|| msg.get_pattern::<Vec<u8>>().ok()).flatten() {
        Some(pattern) => Message::with_pattern(pattern, channel, body),
        None => Message::new(channel, body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_is_a_listener() {
        let mut seen = Vec::new();
        let mut listener = |message: Message| {
            seen.push(message.body.clone());
            if seen.len() == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        };
        assert_eq!(
            listener.on_message(Message::new("c", "1")),
            ControlFlow::Continue(())
        );
        assert_eq!(
            listener.on_message(Message::new("c", "2")),
            ControlFlow::Break(())
        );
    }

    #[test]
    fn test_subscription_tracking() {
        let mut subs = Subscriptions::default();
        assert!(!subs.is_alive());
        subs.add_channels(&names(&["a", "b"]));
        subs.add_patterns(&names(&["news.*"]));
        subs.remove_channels(&names(&["a"]));
        assert_eq!(subs.channels().len(), 1);
        assert!(subs.channels().contains(&b"b"[..]));

        subs.remove_channels(&[]);
        assert!(subs.channels().is_empty());
        assert!(subs.is_alive());
        subs.remove_patterns(&[]);
        assert!(!subs.is_alive());
    }
}
