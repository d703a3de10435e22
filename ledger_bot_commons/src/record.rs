use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serenity::all::{ChannelId, GuildId, MessageId, UserId};

use crate::{
    parsing::{FieldSchema, ParseError, ParsedFields},
    platform::{ChatActions, ReportField},
};

/// Glyph shown in reports for a raised flag.
pub const FLAG_RAISED_GLYPH: &str = "✅";
/// Glyph shown in reports for a lowered flag.
pub const FLAG_LOWERED_GLYPH: &str = "❌";

/// Stand-in for a missing date or time in reports.
pub const NOT_AVAILABLE: &str = "N/A";

/// Everything about a submission message that isn't its body.
#[derive(Debug, Clone)]
pub struct Submission {
    /// Display name of whoever sent the message.
    pub author_display_name: String,
    pub message_id: MessageId,
    pub created_at: DateTime<Utc>,
}

impl Submission {
    /// Submission date as stored in records, like `31/12/2024`.
    #[must_use]
    pub fn date(&self) -> String {
        self.created_at.format("%d/%m/%Y").to_string()
    }

    /// Submission time as stored in records, like `23:59:01`.
    #[must_use]
    pub fn time(&self) -> String {
        self.created_at.format("%H:%M:%S").to_string()
    }
}

/// Where a flag was just raised. Handed to [`TrackedRecord::after_flag_raised`].
#[derive(Debug, Clone, Copy)]
pub struct FlagRaised {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    /// Whoever reacted.
    pub moderator_id: UserId,
}

/// A record parsed out of a submission message, with one boolean flag that
/// moderators toggle by reacting.
pub trait TrackedRecord: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// What a submission message must look like.
    const SCHEMA: FieldSchema;

    /// Build a record from fields that passed [`Self::SCHEMA`].
    ///
    /// # Errors
    ///
    /// Errors if a field turns out not to be usable after all.
    fn from_submission(fields: &ParsedFields, submission: &Submission)
        -> Result<Self, ParseError>;

    /// Raw ID of the message this record was parsed from. Unique within a store.
    fn source_message_id(&self) -> u64;

    fn flag(&self) -> bool;

    fn set_flag(&mut self, value: bool);

    /// One report entry describing this record.
    fn report_field(&self) -> ReportField;

    /// Side effect of a moderator raising the flag. Failures are the
    /// implementor's to log; nothing is propagated.
    fn after_flag_raised<A: ChatActions>(
        &self,
        _actions: &A,
        _raised: FlagRaised,
    ) -> impl Future<Output = ()> + Send {
        async {}
    }
}

/// Report glyph of a flag.
#[must_use]
pub fn flag_glyph(flag: bool) -> &'static str {
    match flag {
        true => FLAG_RAISED_GLYPH,
        false => FLAG_LOWERED_GLYPH,
    }
}

/// `value`, or [`NOT_AVAILABLE`] if it's empty.
#[must_use]
pub fn or_not_available(value: &str) -> &str {
    if value.is_empty() {
        NOT_AVAILABLE
    } else {
        value
    }
}
