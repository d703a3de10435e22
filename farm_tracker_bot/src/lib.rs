//! Source code for the farm delivery bot: members post what they farmed and
//! how much, moderators mark deliveries as paid with a ✅.

/// The farm delivery record.
mod record;
pub use record::*;

/// Entry function that starts the bot.
mod entry;
pub use entry::*;

use std::time::Duration;

use ledger_bot_commons::config::{ReportCommand, ReportFilter, TrackerConfig};

/// Channel whose messages are farm deliveries.
pub static TRACKED_CHANNEL: &str = "📦┇entregar-farm";

/// Channel reports are posted to. Only visible to [`ALLOWED_ROLES`].
pub static REPORT_CHANNEL: &str = "relatorio-farm";

/// Roles that may run report commands.
pub static ALLOWED_ROLES: &[&str] = &[
    "👑┇00",
    "🥇┇01",
    "🥇┇02",
    "🥇┇03",
    "👨‍💼 ┇GERENTE GERAL",
];

/// Reports vanish after this long. Payouts take a while to go through.
pub const REPORT_LIFETIME: Duration = Duration::from_secs(30 * 60);

pub static CHECK_EMOJI: &str = "✅";

pub static RECORDS_FILE: &str = "farms.json";

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
                name: "pagos",
                title: "Farms Pagos",
                filter: ReportFilter::FlagRaised,
            },
            ReportCommand {
                name: "pendentes",
                title: "Farms Pendentes",
                filter: ReportFilter::FlagLowered,
            },
            ReportCommand {
                name: "tudo",
                title: "Todos os Farms",
                filter: ReportFilter::All,
            },
        ],
        denial_message: "Você não tem permissão para usar este comando.".to_string(),
        records_file: RECORDS_FILE.into(),
        health_addr: TrackerConfig::default_health_addr(),
    }
}
