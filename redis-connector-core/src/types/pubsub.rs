//! Pub/sub message type

use bytes::Bytes;

/// A message received on a subscribed channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Channel the message was published to
    pub channel: Bytes,
    /// Message payload
    pub body: Bytes,
    /// Pattern that matched, for pattern subscriptions
    pub pattern: Option<Bytes>,
}

impl Message {
    /// Message delivered through a channel subscription
    pub fn new(channel: impl Into<Bytes>, body: impl Into<Bytes>) -> Self {
        Self {
            channel: channel.into(),
            body: body.into(),
            pattern: None,
        }
    }

    /// Message delivered through a pattern subscription
    pub fn with_pattern(
        pattern: impl Into<Bytes>,
        channel: impl Into<Bytes>,
        body: impl Into<Bytes>,
    ) -> Self {
        Self {
            channel: channel.into(),
            body: body.into(),
            pattern: Some(pattern.into()),
        }
    }

    /// Payload as UTF-8 text, if valid
    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }
}
