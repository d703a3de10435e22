use ledger_bot_commons::{
    parsing::{FieldSchema, ParseError, ParsedFields},
    platform::ReportField,
    record::{flag_glyph, or_not_available, Submission, TrackedRecord},
};
use serde::{Deserialize, Serialize};

/// A delivery of farmed items, waiting to be paid for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmRecord {
    /// Display name of whoever posted the delivery.
    #[serde(rename = "usuario")]
    pub user: String,
    /// In-game ID of the farmer.
    pub id: i64,
    pub item: String,
    #[serde(rename = "quantidade")]
    pub quantity: i64,
    #[serde(rename = "mensagem_id")]
    pub source_message_id: u64,
    #[serde(rename = "data", default)]
    pub date: String,
    #[serde(rename = "hora", default)]
    pub time: String,
    #[serde(rename = "pago", default)]
    pub paid: bool,
}

impl TrackedRecord for FarmRecord {
    const SCHEMA: FieldSchema = FieldSchema {
        min_lines: 3,
        required: &["id", "item", "quantidade"],
        numeric: &["id", "quantidade"],
    };

    fn from_submission(fields: &ParsedFields, submission: &Submission) -> Result<Self, ParseError> {
        Ok(Self {
            user: submission.author_display_name.clone(),
            id: fields.integer("id")?,
            item: fields.text("item").to_string(),
            quantity: fields.integer("quantidade")?,
            source_message_id: submission.message_id.get(),
            date: submission.date(),
            time: submission.time(),
            paid: false,
        })
    }

    fn source_message_id(&self) -> u64 {
        self.source_message_id
    }

    fn flag(&self) -> bool {
        self.paid
    }

    fn set_flag(&mut self, value: bool) {
        self.paid = value;
    }

    fn report_field(&self) -> ReportField {
        ReportField {
            name: format!("{} ({})", self.id, self.user),
            value: format!(
                "👤 **Usuário:** {}\n📦 **Item:** {} x{}\n🕒 **Data:** {} às {}\n💰 **Pago:** {}",
                self.user,
                self.item,
                self.quantity,
                or_not_available(&self.date),
                or_not_available(&self.time),
                flag_glyph(self.paid)
            ),
        }
    }
}
