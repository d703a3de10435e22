use std::time::Duration;

use serenity::all::{ChannelId, MessageId};
use tokio_util::sync::CancellationToken;

use crate::platform::ChatActions;

/// Deletes messages after a delay.
///
/// Every scheduled deletion gets a child token of one root token.
/// Nothing cancels single deletions at the moment, but [`Self::shutdown`]
/// cancels all pending ones at once.
#[derive(Debug, Clone, Default)]
pub struct DeletionScheduler {
    root: CancellationToken,
}

impl DeletionScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delete the message once `delay` passes, unless cancelled first.
    /// Failure to delete is logged and otherwise ignored.
    pub fn schedule<A: ChatActions>(
        &self,
        actions: A,
        channel_id: ChannelId,
        message_id: MessageId,
        delay: Duration,
    ) -> CancellationToken {
        let token = self.root.child_token();
        let task_token = token.clone();

        tokio::spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(delay) => {
                    match actions.delete_message(channel_id, message_id).await {
                        Ok(()) => log::debug!("Deleted report {message_id}"),
                        Err(e) => log::warn!("Failed to delete report {message_id}: {e}"),
                    }
                }
                () = task_token.cancelled() => {
                    log::debug!("Deletion of {message_id} was cancelled");
                }
            }
        });

        token
    }

    /// Cancel every pending deletion, including ones scheduled afterwards.
    pub fn shutdown(&self) {
        self.root.cancel();
    }

    /// Token that is cancelled on [`Self::shutdown`].
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.root.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, RecordingActions};

    const CHANNEL: ChannelId = ChannelId::new(1);
    const MESSAGE: MessageId = MessageId::new(2);

    #[tokio::test(start_paused = true)]
    async fn deletes_after_delay() {
        let actions = RecordingActions::default();
        let scheduler = DeletionScheduler::new();

        scheduler.schedule(actions.clone(), CHANNEL, MESSAGE, Duration::from_secs(300));

        tokio::time::sleep(Duration::from_secs(299)).await;
        assert!(actions.calls().is_empty());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(actions.calls(), vec![Call::Delete(CHANNEL, MESSAGE)]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_never_fires() {
        let actions = RecordingActions::default();
        let scheduler = DeletionScheduler::new();

        let token = scheduler.schedule(actions.clone(), CHANNEL, MESSAGE, Duration::from_secs(5));
        token.cancel();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(actions.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_everything() {
        let actions = RecordingActions::default();
        let scheduler = DeletionScheduler::new();

        scheduler.schedule(actions.clone(), CHANNEL, MESSAGE, Duration::from_secs(5));
        scheduler.schedule(
            actions.clone(),
            CHANNEL,
            MessageId::new(3),
            Duration::from_secs(50),
        );
        scheduler.shutdown();

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(actions.calls().is_empty());
    }
}
