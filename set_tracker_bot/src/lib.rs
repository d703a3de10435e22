//! Source code for the set request bot: members post their ID, name, phone and
//! recruiter in the request channel, moderators confirm with a ✅, and the
//! confirmed member gets renamed and tagged.

/// The set request record.
mod record;
pub use record::*;

/// Entry function that starts the bot.
mod entry;
pub use entry::*;

use std::time::Duration;

use ledger_bot_commons::config::{ReportCommand, ReportFilter, TrackerConfig};

/// Channel whose messages are set requests.
pub static TRACKED_CHANNEL: &str = "✅┇pedir-set";

/// Channel reports are posted to. Only visible to [`ALLOWED_ROLES`].
pub static REPORT_CHANNEL: &str = "relatorio-setados";

/// Roles that may run report commands.
pub static ALLOWED_ROLES: &[&str] = &[
    "👑┇00",
    "🥇┇01",
    "🥇┇02",
    "🥇┇03",
    "✍️┇EDITOR DO SERVER",
    "🔫┇LIDER TÁTICO",
    "👨‍💼 ┇GERENTE GERAL",
];

/// Reports vanish after this long.
pub const REPORT_LIFETIME: Duration = Duration::from_secs(5 * 60);

pub static CHECK_EMOJI: &str = "✅";

/// Role given to members whose request got confirmed.
pub static CONFIRMED_ROLE: &str = "olheiro";

pub static RECORDS_FILE: &str = "registros.json";

/// Built-in configuration, before environment overrides.
#[must_use]
pub fn default_config() -> TrackerConfig {
    TrackerConfig {
        tracked_channel: TRACKED_CHANNEL.to_string(),
        report_channel: REPORT_CHANNEL.to_string(),
        allowed_roles: ALLOWED_ROLES.iter().map(|r| r.to_string()).collect(),
        report_lifetime: REPORT_LIFETIME,
        emoji: CHECK_EMOJI.to_string(),
        command_prefix: "!".to_string(),
        commands: vec![
            ReportCommand {
                name: "setados",
                title: "Registros Setados",
                filter: ReportFilter::FlagRaised,
            },
            ReportCommand {
                name: "pendentes",
                title: "Registros Pendentes",
                filter: ReportFilter::FlagLowered,
            },
            ReportCommand {
                name: "tudo",
                title: "Todos os Registros",
                filter: ReportFilter::All,
            },
        ],
        denial_message: "Você não tem permissão para usar este comando.".to_string(),
        records_file: RECORDS_FILE.into(),
        health_addr: TrackerConfig::default_health_addr(),
    }
}
