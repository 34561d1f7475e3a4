use std::time::Duration;

use tokio::time::sleep;

use crate::{
    domain::{ChannelId, MessageRef, UserId},
    messaging::port::MessagingPort,
    sequence::{Sequence, Step},
    Result,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub steps: usize,
    pub messages: usize,
    /// Messages the service echoed back with an id; the rest were rejected.
    pub acknowledged: usize,
}

impl RunSummary {
    pub fn rejected(&self) -> usize {
        self.messages - self.acknowledged
    }
}

/// Plays a [`Sequence`] into a channel.
///
/// Each step sends the command, waits, sends the confirmation, waits. A
/// failed send aborts the rest of the sequence.
pub struct Interpreter<'a> {
    messenger: &'a dyn MessagingPort,
    channel_id: ChannelId,
    delay: Duration,
    user_id: UserId,
    prefix: String,
}

impl<'a> Interpreter<'a> {
    pub fn new(
        messenger: &'a dyn MessagingPort,
        channel_id: ChannelId,
        delay: Duration,
        user_id: UserId,
    ) -> Self {
        Self {
            messenger,
            channel_id,
            delay,
            user_id,
            prefix: String::new(),
        }
    }

    /// Bot prefix put in front of each command (confirmations are sent bare).
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub async fn run(
        &self,
        sequence: &Sequence,
        mut on_step: impl FnMut(&Step),
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for step in sequence.steps() {
            on_step(step);

            let command = format!("{}{}", self.prefix, step.text(&self.user_id));
            for text in [command.as_str(), step.confirmation()] {
                let sent = self.dispatch(text).await?;
                summary.messages += 1;
                if sent.message_id.is_some() {
                    summary.acknowledged += 1;
                }
            }

            summary.steps += 1;
        }

        tracing::info!(
            sequence = %sequence,
            steps = summary.steps,
            messages = summary.messages,
            acknowledged = summary.acknowledged,
            "sequence finished"
        );
        Ok(summary)
    }

    async fn dispatch(&self, text: &str) -> Result<MessageRef> {
        let sent = self.messenger.send_text(self.channel_id, text).await?;
        tracing::debug!(
            channel = %self.channel_id,
            text,
            message_id = sent.message_id.as_deref().unwrap_or("-"),
            "dispatched"
        );
        sleep(self.delay).await;
        Ok(sent)
    }
}
