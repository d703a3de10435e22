//! Test doubles: a [`ChatActions`] that records what it's asked to do, and a
//! minimal record type.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use serde::{Deserialize, Serialize};
use serenity::all::{ChannelId, GuildId, MessageId, UserId};

use crate::{
    parsing::{FieldSchema, ParseError, ParsedFields},
    platform::{ChatActions, PlatformError, Report, ReportField},
    record::{flag_glyph, Submission, TrackedRecord},
};

/// One thing a [`RecordingActions`] was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SendText(ChannelId, String),
    SendReport(ChannelId, Report),
    Delete(ChannelId, MessageId),
    CreateChannel {
        guild_id: GuildId,
        name: String,
        visible_to_roles: Vec<String>,
    },
    SetNickname(GuildId, UserId, String),
    AddRole(GuildId, UserId, String),
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<Call>,
    channels: Vec<(GuildId, String, ChannelId)>,
    roles: HashSet<String>,
    message_authors: Vec<(MessageId, UserId)>,
    forbidden: bool,
    next_id: u64,
}

/// Fake chat that remembers every mutating call in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingActions {
    state: Arc<Mutex<State>>,
}

impl RecordingActions {
    /// Mutating calls so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Pretend the guild already has this text channel.
    pub fn add_channel(&self, guild_id: GuildId, name: &str, channel_id: ChannelId) {
        self.state
            .lock()
            .unwrap()
            .channels
            .push((guild_id, name.to_string(), channel_id));
    }

    /// Pretend every guild has a role with this name.
    pub fn add_role(&self, name: &str) {
        self.state.lock().unwrap().roles.insert(name.to_string());
    }

    pub fn set_message_author(&self, message_id: MessageId, author: UserId) {
        self.state
            .lock()
            .unwrap()
            .message_authors
            .push((message_id, author));
    }

    /// Make member edits (nickname, roles) fail as if lacking permissions.
    pub fn forbid_member_edits(&self) {
        self.state.lock().unwrap().forbidden = true;
    }

    fn next_id(state: &mut State) -> u64 {
        state.next_id += 1;
        1000 + state.next_id
    }
}

impl ChatActions for RecordingActions {
    async fn send_text(&self, channel_id: ChannelId, text: &str) -> Result<MessageId, PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::SendText(channel_id, text.to_string()));
        Ok(MessageId::new(Self::next_id(&mut state)))
    }

    async fn send_report(
        &self,
        channel_id: ChannelId,
        report: &Report,
    ) -> Result<MessageId, PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::SendReport(channel_id, report.clone()));
        Ok(MessageId::new(Self::next_id(&mut state)))
    }

    async fn delete_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Delete(channel_id, message_id));
        Ok(())
    }

    async fn find_text_channel(
        &self,
        guild_id: GuildId,
        name: &str,
    ) -> Result<Option<ChannelId>, PlatformError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .channels
            .iter()
            .find(|(guild, channel_name, _)| *guild == guild_id && channel_name == name)
            .map(|(_, _, id)| *id))
    }

    async fn create_restricted_channel(
        &self,
        guild_id: GuildId,
        name: &str,
        visible_to_roles: &[String],
    ) -> Result<ChannelId, PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::CreateChannel {
            guild_id,
            name: name.to_string(),
            visible_to_roles: visible_to_roles.to_vec(),
        });
        let id = ChannelId::new(Self::next_id(&mut state));
        state.channels.push((guild_id, name.to_string(), id));
        Ok(id)
    }

    async fn message_author(
        &self,
        _channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<UserId, PlatformError> {
        let state = self.state.lock().unwrap();
        state
            .message_authors
            .iter()
            .find(|(id, _)| *id == message_id)
            .map(|(_, author)| *author)
            .ok_or_else(|| PlatformError::Other(format!("no message {message_id}")))
    }

    async fn set_nickname(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        nickname: &str,
    ) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        if state.forbidden {
            return Err(PlatformError::Forbidden("Missing Permissions".to_string()));
        }
        state
            .calls
            .push(Call::SetNickname(guild_id, user_id, nickname.to_string()));
        Ok(())
    }

    async fn add_role_by_name(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_name: &str,
    ) -> Result<bool, PlatformError> {
        let mut state = self.state.lock().unwrap();
        if !state.roles.contains(role_name) {
            return Ok(false);
        }
        if state.forbidden {
            return Err(PlatformError::Forbidden("Missing Permissions".to_string()));
        }
        state
            .calls
            .push(Call::AddRole(guild_id, user_id, role_name.to_string()));
        Ok(true)
    }
}

/// Smallest possible record: a name and a flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DummyRecord {
    pub mensagem_id: u64,
    pub nome: String,
    #[serde(default)]
    pub setado: bool,
}

impl DummyRecord {
    #[must_use]
    pub fn new(mensagem_id: u64, nome: &str, setado: bool) -> Self {
        Self {
            mensagem_id,
            nome: nome.to_string(),
            setado,
        }
    }
}

impl TrackedRecord for DummyRecord {
    const SCHEMA: FieldSchema = FieldSchema {
        min_lines: 1,
        required: &["nome"],
        numeric: &[],
    };

    fn from_submission(fields: &ParsedFields, submission: &Submission) -> Result<Self, ParseError> {
        Ok(Self::new(
            submission.message_id.get(),
            fields.text("nome"),
            false,
        ))
    }

    fn source_message_id(&self) -> u64 {
        self.mensagem_id
    }

    fn flag(&self) -> bool {
        self.setado
    }

    fn set_flag(&mut self, value: bool) {
        self.setado = value;
    }

    fn report_field(&self) -> ReportField {
        ReportField {
            name: self.nome.clone(),
            value: flag_glyph(self.setado).to_string(),
        }
    }
}
