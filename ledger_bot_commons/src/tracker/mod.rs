mod reports;

use std::marker::PhantomData;

pub use reports::{
    is_allowed, render_report, MAX_EMBED_CHARS, MAX_FIELD_NAME_CHARS, MAX_FIELD_VALUE_CHARS,
    MAX_REPORT_FIELDS, MAX_TITLE_CHARS, REPORT_COLOUR,
};

use crate::{
    config::TrackerConfig,
    platform::{ChatActions, CommandInvoked, MessageCreated, ReactionChange, ReactionChanged},
    record::{FlagRaised, Submission, TrackedRecord},
    scheduler::DeletionScheduler,
    store::{RecordStore, StoreError},
};

/// What happened to a message that reached the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Not ours to look at: sent by a bot, or outside the tracked channel.
    Ignored,
    /// A record was saved from it.
    Recorded,
    /// It ran a report command.
    Command,
    /// Neither a submission nor a command.
    Nothing,
}

/// What a reaction event did to the records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionOutcome {
    Ignored,
    /// The flag of the record from that message is now this.
    FlagSet(bool),
    /// The right emoji, but the message has no record.
    NoRecord,
    /// The store couldn't be read or written. Nothing changed.
    Failed,
}

/// One deployment's event handling: which channel it watches, where its
/// records go, how reports get posted and cleaned up.
pub struct Tracker<R, S> {
    config: TrackerConfig,
    store: S,
    scheduler: DeletionScheduler,
    _records: PhantomData<fn() -> R>,
}

impl<R, S> Tracker<R, S>
where
    R: TrackedRecord,
    S: RecordStore<R>,
{
    pub fn new(config: TrackerConfig, store: S, scheduler: DeletionScheduler) -> Self {
        Self {
            config,
            store,
            scheduler,
            _records: PhantomData,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn scheduler(&self) -> &DeletionScheduler {
        &self.scheduler
    }

    /// Whether the message is one the listener cares about: user-sent, in the
    /// tracked channel. Lets the platform side skip fetching role names.
    pub fn wants_message(&self, message: &MessageCreated) -> bool {
        !message.author_is_bot && message.channel_name == self.config.tracked_channel
    }

    /// Save a record out of a tracked channel message if it is a submission,
    /// then run it as a command if it is one.
    pub async fn handle_message<A: ChatActions>(
        &self,
        actions: &A,
        message: &MessageCreated,
    ) -> MessageOutcome {
        if !self.wants_message(message) {
            return MessageOutcome::Ignored;
        }

        log::debug!(
            "Message {} from {}: {:?}",
            message.message_id,
            message.author_display_name,
            message.content
        );

        let recorded = self.record_submission(message).await;

        if let Some(command) = CommandInvoked::from_message(message, &self.config.command_prefix) {
            if self.handle_command(actions, &command).await {
                return MessageOutcome::Command;
            }
        }

        match recorded {
            true => MessageOutcome::Recorded,
            false => MessageOutcome::Nothing,
        }
    }

    /// Returns `true` if a record was saved.
    async fn record_submission(&self, message: &MessageCreated) -> bool {
        let fields = match R::SCHEMA.parse(&message.content) {
            Ok(fields) => fields,
            Err(e) => {
                log::debug!("Message {} is not a submission: {e}", message.message_id);
                return false;
            }
        };

        let submission = Submission {
            author_display_name: message.author_display_name.clone(),
            message_id: message.message_id,
            created_at: message.created_at,
        };

        let record = match R::from_submission(&fields, &submission) {
            Ok(record) => record,
            Err(e) => {
                log::debug!("Message {} is not a submission: {e}", message.message_id);
                return false;
            }
        };

        match self.store.append(record).await {
            Ok(()) => {
                log::info!(
                    "Saved a record from {} (message {})",
                    submission.author_display_name,
                    submission.message_id
                );
                true
            }
            Err(StoreError::DuplicateMessage(id)) => {
                log::warn!("Message {id} was already recorded, skipping");
                false
            }
            Err(e) => {
                log::error!("Failed to save a record from message {}: {e}", message.message_id);
                false
            }
        }
    }

    /// Raise or lower the flag of the record made from the reacted-to message.
    pub async fn handle_reaction<A: ChatActions>(
        &self,
        actions: &A,
        reaction: &ReactionChanged,
    ) -> ReactionOutcome {
        if reaction.user_is_bot
            || reaction.channel_name != self.config.tracked_channel
            || reaction.emoji != self.config.emoji
        {
            return ReactionOutcome::Ignored;
        }

        let raise = reaction.change == ReactionChange::Added;

        let updated = match self
            .store
            .find_and_update(reaction.message_id, |record| record.set_flag(raise))
            .await
        {
            Ok(updated) => updated,
            Err(e) => {
                log::error!(
                    "Failed to update the record of message {}: {e}",
                    reaction.message_id
                );
                return ReactionOutcome::Failed;
            }
        };

        let Some(record) = updated else {
            log::info!("No record for message {}, nothing to mark", reaction.message_id);
            return ReactionOutcome::NoRecord;
        };

        log::info!(
            "Record of message {} marked as {}",
            reaction.message_id,
            match raise {
                true => "done",
                false => "not done",
            }
        );

        if raise {
            if let Some(guild_id) = reaction.guild_id {
                let raised = FlagRaised {
                    guild_id,
                    channel_id: reaction.channel_id,
                    message_id: reaction.message_id,
                    moderator_id: reaction.user_id,
                };
                record.after_flag_raised(actions, raised).await;
            }
        }

        ReactionOutcome::FlagSet(record.flag())
    }

    /// Run a report command. Returns `false` if it isn't one of ours.
    pub async fn handle_command<A: ChatActions>(
        &self,
        actions: &A,
        command: &CommandInvoked,
    ) -> bool {
        let Some(report_command) = self.config.command(&command.name) else {
            return false;
        };

        if !is_allowed(&command.author_role_names, &self.config.allowed_roles) {
            log::info!(
                "User {} is not allowed to run !{}",
                command.author_id,
                command.name
            );
            if let Err(e) = actions
                .send_text(command.channel_id, &self.config.denial_message)
                .await
            {
                log::warn!("Failed to send the denial message: {e}");
            }
            return true;
        }

        let records = match self.store.load_all().await {
            Ok(records) => records,
            Err(e) => {
                log::error!("Failed to load records for !{}: {e}", command.name);
                return true;
            }
        };

        let records: Vec<R> = records
            .into_iter()
            .filter(|record| report_command.filter.accepts(record.flag()))
            .collect();

        let report = render_report(report_command.title, &records);

        if let Err(e) = reports::post_report(
            actions,
            &self.scheduler,
            &self.config,
            command,
            &report,
        )
        .await
        {
            log::error!("Failed to post the report for !{}: {e}", command.name);
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use serenity::all::{ChannelId, GuildId, MessageId, UserId};

    use super::*;
    use crate::{
        config::{ReportCommand, ReportFilter},
        platform::Report,
        store::{JsonFileStore, MemoryStore},
        testing::{Call, DummyRecord, RecordingActions},
    };

    const GUILD: GuildId = GuildId::new(1);
    const TRACKED: ChannelId = ChannelId::new(2);
    const REPORTS: ChannelId = ChannelId::new(3);

    fn config() -> TrackerConfig {
        TrackerConfig {
            tracked_channel: "pedir-set".to_string(),
            report_channel: "relatorio".to_string(),
            allowed_roles: vec!["mod".to_string()],
            report_lifetime: Duration::from_secs(300),
            emoji: "✅".to_string(),
            command_prefix: "!".to_string(),
            commands: vec![
                ReportCommand {
                    name: "feitos",
                    title: "Feitos",
                    filter: ReportFilter::FlagRaised,
                },
                ReportCommand {
                    name: "tudo",
                    title: "Tudo",
                    filter: ReportFilter::All,
                },
            ],
            denial_message: "Sem permissão.".to_string(),
            records_file: "unused.json".into(),
            health_addr: TrackerConfig::default_health_addr(),
        }
    }

    fn tracker() -> Tracker<DummyRecord, MemoryStore<DummyRecord>> {
        Tracker::new(config(), MemoryStore::new(), DeletionScheduler::new())
    }

    fn message(id: u64, content: &str, roles: &[&str]) -> MessageCreated {
        MessageCreated {
            message_id: MessageId::new(id),
            channel_id: TRACKED,
            channel_name: "pedir-set".to_string(),
            guild_id: Some(GUILD),
            author_id: UserId::new(50),
            author_display_name: "ana".to_string(),
            author_is_bot: false,
            author_role_names: roles.iter().map(|r| r.to_string()).collect(),
            content: content.to_string(),
            created_at: Utc::now(),
        }
    }

    fn reaction(id: u64, change: ReactionChange, emoji: &str) -> ReactionChanged {
        ReactionChanged {
            change,
            message_id: MessageId::new(id),
            channel_id: TRACKED,
            channel_name: "pedir-set".to_string(),
            guild_id: Some(GUILD),
            user_id: UserId::new(60),
            user_is_bot: false,
            emoji: emoji.to_string(),
        }
    }

    #[tokio::test]
    async fn submission_is_recorded_once() {
        let tracker = tracker();
        let actions = RecordingActions::default();

        let outcome = tracker
            .handle_message(&actions, &message(10, "nome: Ana", &[]))
            .await;
        assert_eq!(outcome, MessageOutcome::Recorded);
        assert_eq!(
            tracker.store().load_all().await.unwrap(),
            vec![DummyRecord::new(10, "Ana", false)]
        );
        assert!(actions.calls().is_empty());
    }

    #[tokio::test]
    async fn ignores_bots_and_other_channels() {
        let tracker = tracker();
        let actions = RecordingActions::default();

        let mut from_bot = message(10, "nome: Ana", &[]);
        from_bot.author_is_bot = true;
        let mut elsewhere = message(11, "nome: Ana", &[]);
        elsewhere.channel_name = "geral".to_string();

        assert_eq!(
            tracker.handle_message(&actions, &from_bot).await,
            MessageOutcome::Ignored
        );
        assert_eq!(
            tracker.handle_message(&actions, &elsewhere).await,
            MessageOutcome::Ignored
        );
        assert!(tracker.store().load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_is_not_recorded() {
        let tracker = tracker();
        let actions = RecordingActions::default();

        let outcome = tracker
            .handle_message(&actions, &message(10, "oi gente", &[]))
            .await;
        assert_eq!(outcome, MessageOutcome::Nothing);
        assert!(tracker.store().load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reaction_round_trip_restores_flag() {
        let tracker = tracker();
        let actions = RecordingActions::default();
        tracker
            .handle_message(&actions, &message(10, "nome: Ana", &[]))
            .await;

        assert_eq!(
            tracker
                .handle_reaction(&actions, &reaction(10, ReactionChange::Added, "✅"))
                .await,
            ReactionOutcome::FlagSet(true)
        );
        assert!(tracker.store().load_all().await.unwrap()[0].setado);

        assert_eq!(
            tracker
                .handle_reaction(&actions, &reaction(10, ReactionChange::Removed, "✅"))
                .await,
            ReactionOutcome::FlagSet(false)
        );
        assert!(!tracker.store().load_all().await.unwrap()[0].setado);
    }

    #[tokio::test]
    async fn other_reactions_do_nothing() {
        let tracker = tracker();
        let actions = RecordingActions::default();
        tracker
            .handle_message(&actions, &message(10, "nome: Ana", &[]))
            .await;

        let mut by_bot = reaction(10, ReactionChange::Added, "✅");
        by_bot.user_is_bot = true;
        let mut elsewhere = reaction(10, ReactionChange::Added, "✅");
        elsewhere.channel_name = "geral".to_string();

        for ignored in [
            reaction(10, ReactionChange::Added, "👍"),
            by_bot,
            elsewhere,
        ] {
            assert_eq!(
                tracker.handle_reaction(&actions, &ignored).await,
                ReactionOutcome::Ignored
            );
        }
        assert!(!tracker.store().load_all().await.unwrap()[0].setado);
    }

    #[tokio::test]
    async fn reaction_on_unknown_message() {
        let tracker = tracker();
        let actions = RecordingActions::default();
        tracker
            .handle_message(&actions, &message(10, "nome: Ana", &[]))
            .await;

        assert_eq!(
            tracker
                .handle_reaction(&actions, &reaction(99, ReactionChange::Added, "✅"))
                .await,
            ReactionOutcome::NoRecord
        );
        assert_eq!(
            tracker.store().load_all().await.unwrap(),
            vec![DummyRecord::new(10, "Ana", false)]
        );
    }

    #[tokio::test]
    async fn broken_store_is_not_a_missing_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registros.json");
        std::fs::write(&path, "{ not a list").unwrap();
        let store: JsonFileStore<DummyRecord> = JsonFileStore::open(&path).await.unwrap();
        let tracker = Tracker::new(config(), store, DeletionScheduler::new());
        let actions = RecordingActions::default();

        assert_eq!(
            tracker
                .handle_reaction(&actions, &reaction(10, ReactionChange::Added, "✅"))
                .await,
            ReactionOutcome::Failed
        );
        assert!(actions.calls().is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not a list");
    }

    #[tokio::test]
    async fn unauthorized_command_is_denied() {
        let tracker = tracker();
        let actions = RecordingActions::default();

        let outcome = tracker
            .handle_message(&actions, &message(10, "!tudo", &["Mod", "membro"]))
            .await;
        assert_eq!(outcome, MessageOutcome::Command);
        assert_eq!(
            actions.calls(),
            vec![Call::SendText(TRACKED, "Sem permissão.".to_string())]
        );
    }

    #[tokio::test]
    async fn unknown_command_falls_through() {
        let tracker = tracker();
        let actions = RecordingActions::default();

        let outcome = tracker
            .handle_message(&actions, &message(10, "!ajuda", &["mod"]))
            .await;
        assert_eq!(outcome, MessageOutcome::Nothing);
        assert!(actions.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn authorized_command_posts_filtered_report() {
        let tracker = tracker();
        let actions = RecordingActions::default();
        actions.add_channel(GUILD, "relatorio", REPORTS);

        tracker
            .handle_message(&actions, &message(10, "nome: Ana", &[]))
            .await;
        tracker
            .handle_message(&actions, &message(11, "nome: Bia", &[]))
            .await;
        tracker
            .handle_reaction(&actions, &reaction(11, ReactionChange::Added, "✅"))
            .await;

        let outcome = tracker
            .handle_message(&actions, &message(12, "!feitos", &["membro", "mod"]))
            .await;
        assert_eq!(outcome, MessageOutcome::Command);

        let expected_report = Report {
            title: "Feitos".to_string(),
            colour: REPORT_COLOUR,
            description: None,
            fields: vec![DummyRecord::new(11, "Bia", true).report_field()],
            footer: None,
        };
        assert_eq!(
            actions.calls(),
            vec![
                Call::SendReport(REPORTS, expected_report),
                Call::Delete(TRACKED, MessageId::new(12)),
            ]
        );

        tokio::time::sleep(Duration::from_secs(301)).await;
        assert_eq!(
            actions.calls().last(),
            Some(&Call::Delete(REPORTS, MessageId::new(1001)))
        );
    }

    #[tokio::test]
    async fn report_channel_is_created_when_missing() {
        let tracker = tracker();
        let actions = RecordingActions::default();

        tracker
            .handle_message(&actions, &message(12, "!tudo", &["mod"]))
            .await;

        let calls = actions.calls();
        assert_eq!(
            calls[0],
            Call::CreateChannel {
                guild_id: GUILD,
                name: "relatorio".to_string(),
                visible_to_roles: vec!["mod".to_string()],
            }
        );
        let Call::SendReport(channel, report) = &calls[1] else {
            panic!("expected a report, got {:?}", calls[1]);
        };
        assert_eq!(*channel, ChannelId::new(1001));
        assert_eq!(
            report.description.as_deref(),
            Some("Nenhum registro encontrado.")
        );

        // Second time around the channel exists.
        tracker
            .handle_message(&actions, &message(13, "!tudo", &["mod"]))
            .await;
        assert!(!actions.calls()[3..]
            .iter()
            .any(|call| matches!(call, Call::CreateChannel { .. })));
    }
}
