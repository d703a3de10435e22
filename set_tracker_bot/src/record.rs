use ledger_bot_commons::{
    parsing::{FieldSchema, ParseError, ParsedFields},
    platform::{ChatActions, PlatformError, ReportField},
    record::{flag_glyph, or_not_available, FlagRaised, Submission, TrackedRecord},
};
use serde::{Deserialize, Serialize};

use crate::CONFIRMED_ROLE;

/// A request to be "set": given the server nickname and role matching the
/// in-game ID and name in the request.
///
/// Field names on disk are the ones `registros.json` has always used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetRecord {
    /// Display name of whoever posted the request.
    #[serde(rename = "usuario")]
    pub user: String,
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "telefone")]
    pub phone: String,
    /// Who recruited them.
    pub rec: String,
    #[serde(rename = "mensagem_id")]
    pub source_message_id: u64,
    #[serde(rename = "data", default)]
    pub date: String,
    #[serde(rename = "hora", default)]
    pub time: String,
    #[serde(rename = "setado", default)]
    pub confirmed: bool,
}

impl SetRecord {
    /// Server nickname the member gets once confirmed.
    #[must_use]
    pub fn nickname(&self) -> String {
        format!("{} | {}", self.id, self.name)
    }
}

impl TrackedRecord for SetRecord {
    const SCHEMA: FieldSchema = FieldSchema {
        min_lines: 4,
        required: &["id", "nome", "telefone", "rec"],
        numeric: &[],
    };

    fn from_submission(fields: &ParsedFields, submission: &Submission) -> Result<Self, ParseError> {
        Ok(Self {
            user: submission.author_display_name.clone(),
            id: fields.text("id").to_string(),
            name: fields.text("nome").to_string(),
            phone: fields.text("telefone").to_string(),
            rec: fields.text("rec").to_string(),
            source_message_id: submission.message_id.get(),
            date: submission.date(),
            time: submission.time(),
            confirmed: false,
        })
    }

    fn source_message_id(&self) -> u64 {
        self.source_message_id
    }

    fn flag(&self) -> bool {
        self.confirmed
    }

    fn set_flag(&mut self, value: bool) {
        self.confirmed = value;
    }

    fn report_field(&self) -> ReportField {
        ReportField {
            name: format!("{} ({})", self.id, self.name),
            value: format!(
                "👤 **Usuário:** {}\n🆔 **ID:** {}\n🕒 **Data:** {} às {}\n💰 **setado:** {}",
                self.user,
                self.id,
                or_not_available(&self.date),
                or_not_available(&self.time),
                flag_glyph(self.confirmed)
            ),
        }
    }

    /// Rename the requester after their in-game ID and name, and give them
    /// the [`CONFIRMED_ROLE`]. Each step is best-effort.
    async fn after_flag_raised<A: ChatActions>(&self, actions: &A, raised: FlagRaised) {
        let author = match actions
            .message_author(raised.channel_id, raised.message_id)
            .await
        {
            Ok(author) => author,
            Err(e) => {
                log::warn!("Failed to find who sent request {}: {e}", raised.message_id);
                return;
            }
        };

        let nickname = self.nickname();
        match actions
            .set_nickname(raised.guild_id, author, &nickname)
            .await
        {
            Ok(()) => log::info!("Renamed {author} to {nickname}"),
            Err(PlatformError::Forbidden(_)) => {
                log::warn!("No permission to rename {author}");
            }
            Err(e) => log::warn!("Failed to rename {author}: {e}"),
        }

        match actions
            .add_role_by_name(raised.guild_id, author, CONFIRMED_ROLE)
            .await
        {
            Ok(true) => log::info!("Gave \"{CONFIRMED_ROLE}\" to {author}"),
            Ok(false) => log::warn!("There is no \"{CONFIRMED_ROLE}\" role in this server"),
            Err(PlatformError::Forbidden(_)) => {
                log::warn!("No permission to give \"{CONFIRMED_ROLE}\" to {author}");
            }
            Err(e) => log::warn!("Failed to give \"{CONFIRMED_ROLE}\" to {author}: {e}"),
        }
    }
}
