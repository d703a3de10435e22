use std::sync::Arc;

use chrono::{DateTime, Utc};
use serenity::{
    all::{
        ChannelId, ChannelType, Context, CreateChannel, CreateEmbed, CreateEmbedFooter,
        CreateMessage, EditMember, EventHandler, GatewayIntents, GuildId, Http, Message,
        MessageId, PermissionOverwrite, PermissionOverwriteType, Permissions, Reaction, Ready,
        UserId,
    },
    async_trait,
};

use super::{
    ChatActions, MessageCreated, PlatformError, ReactionChange, ReactionChanged, Report,
};
use crate::{record::TrackedRecord, store::RecordStore, tracker::Tracker};

/// Gateway intents the bots need: message bodies, reactions, and members for
/// nicknames and roles.
#[must_use]
pub fn intents() -> GatewayIntents {
    GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MESSAGE_REACTIONS
        | GatewayIntents::GUILD_MEMBERS
}

impl From<serenity::Error> for PlatformError {
    fn from(e: serenity::Error) -> Self {
        use serenity::http::HttpError;

        if let serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) = &e {
            if response.status_code.as_u16() == 403 {
                return Self::Forbidden(response.error.message.clone());
            }
        }
        Self::Other(e.to_string())
    }
}

/// [`ChatActions`] over serenity's HTTP client.
#[derive(Clone)]
pub struct SerenityActions {
    http: Arc<Http>,
}

impl SerenityActions {
    #[must_use]
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

impl ChatActions for SerenityActions {
    async fn send_text(&self, channel_id: ChannelId, text: &str) -> Result<MessageId, PlatformError> {
        Ok(channel_id.say(&self.http, text).await?.id)
    }

    async fn send_report(
        &self,
        channel_id: ChannelId,
        report: &Report,
    ) -> Result<MessageId, PlatformError> {
        let mut embed = CreateEmbed::new().title(&report.title).colour(report.colour);
        if let Some(description) = &report.description {
            embed = embed.description(description);
        }
        for field in &report.fields {
            embed = embed.field(&field.name, &field.value, false);
        }
        if let Some(footer) = &report.footer {
            embed = embed.footer(CreateEmbedFooter::new(footer));
        }

        let message = channel_id
            .send_message(&self.http, CreateMessage::new().embed(embed))
            .await?;
        Ok(message.id)
    }

    async fn delete_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<(), PlatformError> {
        channel_id.delete_message(&self.http, message_id).await?;
        Ok(())
    }

    async fn find_text_channel(
        &self,
        guild_id: GuildId,
        name: &str,
    ) -> Result<Option<ChannelId>, PlatformError> {
        let channels = guild_id.channels(&self.http).await?;
        Ok(channels
            .into_values()
            .find(|channel| channel.kind == ChannelType::Text && channel.name == name)
            .map(|channel| channel.id))
    }

    async fn create_restricted_channel(
        &self,
        guild_id: GuildId,
        name: &str,
        visible_to_roles: &[String],
    ) -> Result<ChannelId, PlatformError> {
        let roles = guild_id.roles(&self.http).await?;

        let mut overwrites = vec![PermissionOverwrite {
            allow: Permissions::empty(),
            deny: Permissions::VIEW_CHANNEL,
            kind: PermissionOverwriteType::Role(guild_id.everyone_role()),
        }];
        for role in roles.values() {
            if visible_to_roles.contains(&role.name) {
                overwrites.push(PermissionOverwrite {
                    allow: Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES,
                    deny: Permissions::empty(),
                    kind: PermissionOverwriteType::Role(role.id),
                });
            }
        }

        let channel = guild_id
            .create_channel(
                &self.http,
                CreateChannel::new(name)
                    .kind(ChannelType::Text)
                    .permissions(overwrites),
            )
            .await?;
        Ok(channel.id)
    }

    async fn message_author(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<UserId, PlatformError> {
        Ok(channel_id.message(&self.http, message_id).await?.author.id)
    }

    async fn set_nickname(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        nickname: &str,
    ) -> Result<(), PlatformError> {
        guild_id
            .edit_member(&self.http, user_id, EditMember::new().nickname(nickname))
            .await?;
        Ok(())
    }

    async fn add_role_by_name(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_name: &str,
    ) -> Result<bool, PlatformError> {
        let roles = guild_id.roles(&self.http).await?;
        let Some(role) = roles.values().find(|role| role.name == role_name) else {
            return Ok(false);
        };

        self.http
            .add_member_role(guild_id, user_id, role.id, None)
            .await?;
        Ok(true)
    }
}

/// Display name as a guild sees it: nickname, then global display name, then username.
fn display_name(message: &Message) -> String {
    message
        .member
        .as_ref()
        .and_then(|member| member.nick.clone())
        .or_else(|| message.author.global_name.clone())
        .unwrap_or_else(|| message.author.name.clone())
}

async fn channel_name(ctx: &Context, channel_id: ChannelId) -> Option<String> {
    match channel_id.name(ctx).await {
        Ok(name) => Some(name),
        Err(e) => {
            log::warn!("Failed to get the name of channel {channel_id}: {e}");
            None
        }
    }
}

/// Names of the author's roles, if the message came with member info.
async fn author_role_names(ctx: &Context, message: &Message) -> Vec<String> {
    let (Some(guild_id), Some(member)) = (message.guild_id, &message.member) else {
        return Vec::new();
    };

    let roles = match guild_id.roles(&ctx.http).await {
        Ok(roles) => roles,
        Err(e) => {
            log::warn!("Failed to get the roles of guild {guild_id}: {e}");
            return Vec::new();
        }
    };

    member
        .roles
        .iter()
        .filter_map(|role_id| roles.get(role_id))
        .map(|role| role.name.clone())
        .collect()
}

/// Serenity event handler feeding a [`Tracker`].
pub struct DiscordHandler<R, S> {
    tracker: Arc<Tracker<R, S>>,
}

impl<R, S> DiscordHandler<R, S> {
    pub fn new(tracker: Arc<Tracker<R, S>>) -> Self {
        Self { tracker }
    }
}

impl<R, S> DiscordHandler<R, S>
where
    R: TrackedRecord,
    S: RecordStore<R> + 'static,
{
    async fn reaction_event(&self, ctx: &Context, reaction: &Reaction, change: ReactionChange) {
        let Some(user_id) = reaction.user_id else {
            return;
        };

        let user_is_bot = match &reaction.member {
            Some(member) => member.user.bot,
            None => match reaction.user(ctx).await {
                Ok(user) => user.bot,
                Err(e) => {
                    log::warn!("Failed to get the user behind a reaction: {e}");
                    return;
                }
            },
        };

        let Some(channel_name) = channel_name(ctx, reaction.channel_id).await else {
            return;
        };

        let event = ReactionChanged {
            change,
            message_id: reaction.message_id,
            channel_id: reaction.channel_id,
            channel_name,
            guild_id: reaction.guild_id,
            user_id,
            user_is_bot,
            emoji: reaction.emoji.to_string(),
        };

        let actions = SerenityActions::new(ctx.http.clone());
        self.tracker.handle_reaction(&actions, &event).await;
    }
}

#[async_trait]
impl<R, S> EventHandler for DiscordHandler<R, S>
where
    R: TrackedRecord,
    S: RecordStore<R> + 'static,
{
    async fn ready(&self, _ctx: Context, ready: Ready) {
        log::info!("Logged in as {}", ready.user.name);
    }

    async fn message(&self, ctx: Context, message: Message) {
        let Some(channel_name) = channel_name(&ctx, message.channel_id).await else {
            return;
        };

        let mut event = MessageCreated {
            message_id: message.id,
            channel_id: message.channel_id,
            channel_name,
            guild_id: message.guild_id,
            author_id: message.author.id,
            author_display_name: display_name(&message),
            author_is_bot: message.author.bot,
            author_role_names: Vec::new(),
            content: message.content.clone(),
            created_at: DateTime::<Utc>::from_timestamp(message.timestamp.unix_timestamp(), 0)
                .unwrap_or_else(Utc::now),
        };

        if !self.tracker.wants_message(&event) {
            return;
        }

        if event
            .content
            .starts_with(&self.tracker.config().command_prefix)
        {
            event.author_role_names = author_role_names(&ctx, &message).await;
        }

        let actions = SerenityActions::new(ctx.http.clone());
        self.tracker.handle_message(&actions, &event).await;
    }

    async fn reaction_add(&self, ctx: Context, reaction: Reaction) {
        self.reaction_event(&ctx, &reaction, ReactionChange::Added)
            .await;
    }

    async fn reaction_remove(&self, ctx: Context, reaction: Reaction) {
        self.reaction_event(&ctx, &reaction, ReactionChange::Removed)
            .await;
    }
}
