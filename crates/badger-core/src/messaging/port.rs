use async_trait::async_trait;

use crate::{
    domain::{ChannelId, MessageRef},
    Result,
};

/// Outbound chat port.
///
/// The interpreter only needs to post plain text into a channel; the
/// response is not inspected beyond transport errors.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_text(&self, channel_id: ChannelId, text: &str) -> Result<MessageRef>;
}
