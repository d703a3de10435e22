/// The real thing: Discord, through serenity.
pub mod discord;

use std::future::Future;

use chrono::{DateTime, Utc};
use serenity::all::{ChannelId, GuildId, MessageId, UserId};

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The bot lacks permissions for this.
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("{0}")]
    Other(String),
}

/// A message was posted somewhere the bot can see.
#[derive(Debug, Clone)]
pub struct MessageCreated {
    pub message_id: MessageId,
    pub channel_id: ChannelId,
    pub channel_name: String,
    pub guild_id: Option<GuildId>,
    pub author_id: UserId,
    /// Server nickname, or global display name, or username.
    pub author_display_name: String,
    pub author_is_bot: bool,
    /// Names of the author's roles in the guild. Only filled in for messages
    /// that look like commands, as it costs a request.
    pub author_role_names: Vec<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionChange {
    Added,
    Removed,
}

/// A reaction was added to or removed from a message.
#[derive(Debug, Clone)]
pub struct ReactionChanged {
    pub change: ReactionChange,
    pub message_id: MessageId,
    pub channel_id: ChannelId,
    pub channel_name: String,
    pub guild_id: Option<GuildId>,
    pub user_id: UserId,
    pub user_is_bot: bool,
    /// The emoji as text: the glyph itself for unicode emoji.
    pub emoji: String,
}

/// A `!command` out of a message that reached command processing.
#[derive(Debug, Clone)]
pub struct CommandInvoked {
    /// Command name without the prefix, like `tudo`.
    pub name: String,
    pub message_id: MessageId,
    pub channel_id: ChannelId,
    pub guild_id: GuildId,
    pub author_id: UserId,
    pub author_role_names: Vec<String>,
}

impl CommandInvoked {
    /// Pick the command out of a message, if it is one.
    ///
    /// Commands need a guild: there are no roles to check elsewhere.
    #[must_use]
    pub fn from_message(message: &MessageCreated, prefix: &str) -> Option<Self> {
        let rest = message.content.strip_prefix(prefix)?;
        let name = rest.split_whitespace().next()?;
        // "! tudo" is not a command.
        if !rest.starts_with(name) {
            return None;
        }

        Some(Self {
            name: name.to_string(),
            message_id: message.message_id,
            channel_id: message.channel_id,
            guild_id: message.guild_id?,
            author_id: message.author_id,
            author_role_names: message.author_role_names.clone(),
        })
    }
}

/// One entry of a [`Report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportField {
    pub name: String,
    pub value: String,
}

/// A rendered summary, sent as an embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub title: String,
    pub colour: u32,
    pub description: Option<String>,
    pub fields: Vec<ReportField>,
    pub footer: Option<String>,
}

/// What handlers may ask the chat platform to do.
pub trait ChatActions: Clone + Send + Sync + 'static {
    fn send_text(
        &self,
        channel_id: ChannelId,
        text: &str,
    ) -> impl Future<Output = Result<MessageId, PlatformError>> + Send;

    fn send_report(
        &self,
        channel_id: ChannelId,
        report: &Report,
    ) -> impl Future<Output = Result<MessageId, PlatformError>> + Send;

    fn delete_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    /// Find a text channel of the guild by its exact name.
    fn find_text_channel(
        &self,
        guild_id: GuildId,
        name: &str,
    ) -> impl Future<Output = Result<Option<ChannelId>, PlatformError>> + Send;

    /// Create a text channel hidden from `@everyone` and visible to the roles
    /// named in `visible_to_roles`. Names with no matching role are skipped.
    fn create_restricted_channel(
        &self,
        guild_id: GuildId,
        name: &str,
        visible_to_roles: &[String],
    ) -> impl Future<Output = Result<ChannelId, PlatformError>> + Send;

    fn message_author(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> impl Future<Output = Result<UserId, PlatformError>> + Send;

    fn set_nickname(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        nickname: &str,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    /// Give the member the role with this exact name.
    /// Returns `false` if the guild has no such role.
    fn add_role_by_name(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_name: &str,
    ) -> impl Future<Output = Result<bool, PlatformError>> + Send;
}
