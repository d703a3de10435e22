use serenity::all::{ChannelId, GuildId};

use crate::{
    config::TrackerConfig,
    platform::{ChatActions, CommandInvoked, PlatformError, Report},
    record::TrackedRecord,
    scheduler::DeletionScheduler,
};

/// Embed colour of reports. A pleasant green.
pub const REPORT_COLOUR: u32 = 0x2ecc71;

/// Discord refuses embeds with more fields than this.
pub const MAX_REPORT_FIELDS: usize = 25;

/// Discord's per-embed limits, counted in characters.
pub const MAX_TITLE_CHARS: usize = 256;
pub const MAX_FIELD_NAME_CHARS: usize = 256;
pub const MAX_FIELD_VALUE_CHARS: usize = 1024;
pub const MAX_EMBED_CHARS: usize = 6000;

/// Kept free for the footer, which is only known once the fields are picked.
const FOOTER_ALLOWANCE: usize = 64;

const EMPTY_REPORT: &str = "Nenhum registro encontrado.";

/// Cut `text` down to `max` characters, ending with an ellipsis if it was cut.
fn clip(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(max - 1).collect();
    clipped.push('…');
    clipped
}

/// Whether any of the user's roles is in the allow-list. Exact, case-sensitive.
#[must_use]
pub fn is_allowed(user_roles: &[String], allowed_roles: &[String]) -> bool {
    allowed_roles.iter().any(|allowed| user_roles.contains(allowed))
}

/// Render records into a report, one entry each.
///
/// Stays within Discord's embed limits: long entry names and values are
/// clipped, and entries stop once either the field count or the total
/// length would run over. Whatever is left out is counted in the footer.
#[must_use]
pub fn render_report<R: TrackedRecord>(title: &str, records: &[R]) -> Report {
    let mut report = Report {
        title: clip(title, MAX_TITLE_CHARS),
        colour: REPORT_COLOUR,
        description: None,
        fields: Vec::new(),
        footer: None,
    };

    if records.is_empty() {
        report.description = Some(EMPTY_REPORT.to_string());
        return report;
    }

    let mut budget = MAX_EMBED_CHARS - report.title.chars().count() - FOOTER_ALLOWANCE;

    for record in records.iter().take(MAX_REPORT_FIELDS) {
        let mut field = record.report_field();
        field.name = clip(&field.name, MAX_FIELD_NAME_CHARS);
        field.value = clip(&field.value, MAX_FIELD_VALUE_CHARS);

        let length = field.name.chars().count() + field.value.chars().count();
        if length > budget {
            break;
        }
        budget -= length;
        report.fields.push(field);
    }

    let shown = report.fields.len();
    if records.len() > shown {
        report.footer = Some(format!(
            "+{} registros não exibidos ({} no total)",
            records.len() - shown,
            records.len()
        ));
    }

    report
}

/// The report channel of the guild, created if it isn't there yet.
async fn ensure_report_channel<A: ChatActions>(
    actions: &A,
    config: &TrackerConfig,
    guild_id: GuildId,
) -> Result<ChannelId, PlatformError> {
    if let Some(channel_id) = actions
        .find_text_channel(guild_id, &config.report_channel)
        .await?
    {
        return Ok(channel_id);
    }

    log::info!(
        "Creating report channel \"{}\" in guild {guild_id}",
        config.report_channel
    );
    actions
        .create_restricted_channel(guild_id, &config.report_channel, &config.allowed_roles)
        .await
}

/// Post the report, delete the command that asked for it, and schedule the
/// report's own deletion.
pub(super) async fn post_report<A: ChatActions>(
    actions: &A,
    scheduler: &DeletionScheduler,
    config: &TrackerConfig,
    command: &CommandInvoked,
    report: &Report,
) -> Result<(), PlatformError> {
    let channel_id = ensure_report_channel(actions, config, command.guild_id).await?;
    let report_id = actions.send_report(channel_id, report).await?;

    if let Err(e) = actions
        .delete_message(command.channel_id, command.message_id)
        .await
    {
        // The report gets cleaned up regardless.
        log::warn!("Failed to delete command message {}: {e}", command.message_id);
    }

    scheduler.schedule(
        actions.clone(),
        channel_id,
        report_id,
        config.report_lifetime,
    );

    Ok(())
}
