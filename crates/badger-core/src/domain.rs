use std::fmt;

/// Discord channel id (snowflake).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Discord user id as it appears in commands (decimal string).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A message sent by the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageRef {
    pub channel_id: ChannelId,
    /// Present when the service echoed the created message back.
    pub message_id: Option<String>,
}
