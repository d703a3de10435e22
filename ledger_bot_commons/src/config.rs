use std::{
    net::{Ipv4Addr, SocketAddr},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no DISCORD_TOKEN in the environment and no \"{file}\" file: {source}")]
    NoToken {
        file: &'static str,
        source: std::io::Error,
    },
    #[error("{var} has an unusable value \"{value}\"")]
    BadValue { var: &'static str, value: String },
}

/// Which records a report command shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFilter {
    FlagRaised,
    FlagLowered,
    All,
}

impl ReportFilter {
    #[must_use]
    pub fn accepts(self, flag: bool) -> bool {
        match self {
            Self::FlagRaised => flag,
            Self::FlagLowered => !flag,
            Self::All => true,
        }
    }
}

/// A moderator command that posts a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportCommand {
    /// Callname without the prefix.
    pub name: &'static str,
    /// Title of the posted report.
    pub title: &'static str,
    pub filter: ReportFilter,
}

/// Everything a deployment is configured with. Fixed once the bot starts.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Name of the channel whose messages become records.
    pub tracked_channel: String,
    /// Name of the channel reports are posted to. Created if missing.
    pub report_channel: String,
    /// Roles allowed to run report commands, by exact name.
    pub allowed_roles: Vec<String>,
    /// How long a posted report stays up.
    pub report_lifetime: Duration,
    /// Reaction that raises a record's flag.
    pub emoji: String,
    pub command_prefix: String,
    pub commands: Vec<ReportCommand>,
    /// Sent back in place of a report to users without an allowed role.
    pub denial_message: String,
    pub records_file: PathBuf,
    pub health_addr: SocketAddr,
}

/// Port the health check listener uses unless `PORT` says otherwise.
pub const DEFAULT_HEALTH_PORT: u16 = 10000;

impl TrackerConfig {
    /// Replace values with ones from the environment, where set.
    ///
    /// Recognized: `TRACKED_CHANNEL`, `REPORT_CHANNEL`, `ALLOWED_ROLES`
    /// (comma-separated), `REPORT_LIFETIME_SECS`, `CHECK_EMOJI`, `RECORDS_FILE`
    /// and `PORT`.
    ///
    /// # Errors
    ///
    /// Errors if a numeric variable doesn't parse.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|var| std::env::var(var).ok())
    }

    fn with_overrides(
        mut self,
        lookup: impl Fn(&'static str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(value) = lookup("TRACKED_CHANNEL") {
            self.tracked_channel = value;
        }
        if let Some(value) = lookup("REPORT_CHANNEL") {
            self.report_channel = value;
        }
        if let Some(value) = lookup("ALLOWED_ROLES") {
            self.allowed_roles = value
                .split(',')
                .map(str::trim)
                .filter(|role| !role.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(value) = lookup("REPORT_LIFETIME_SECS") {
            self.report_lifetime = Duration::from_secs(parse_var("REPORT_LIFETIME_SECS", value)?);
        }
        if let Some(value) = lookup("CHECK_EMOJI") {
            self.emoji = value;
        }
        if let Some(value) = lookup("RECORDS_FILE") {
            self.records_file = value.into();
        }
        if let Some(value) = lookup("PORT") {
            self.health_addr.set_port(parse_var("PORT", value)?);
        }
        Ok(self)
    }

    /// Address the health check listener binds to by default.
    #[must_use]
    pub fn default_health_addr() -> SocketAddr {
        (Ipv4Addr::UNSPECIFIED, DEFAULT_HEALTH_PORT).into()
    }

    /// The report command with exactly this callname.
    #[must_use]
    pub fn command(&self, name: &str) -> Option<&ReportCommand> {
        self.commands.iter().find(|command| command.name == name)
    }
}

fn parse_var<T: FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::BadValue { var, value })
}

/// Load a `.env` file from the working directory or its parents into the
/// environment, if there is one. Variables already set are left alone.
///
/// Nothing is logged here: [`crate::start_everything`] calls this before the
/// logger exists, so `RUST_LOG` can come from `.env` too.
///
/// # Errors
///
/// Errors if a `.env` file exists but can't be read or parsed.
pub fn load_dotenv() -> Result<Option<PathBuf>, dotenvy::Error> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Get the bot token: `DISCORD_TOKEN` if set, otherwise the contents of the
/// `key` file, or `key_debug` in debug builds.
///
/// # Errors
///
/// Errors if neither is available.
pub fn load_token() -> Result<String, ConfigError> {
    if let Ok(token) = std::env::var("DISCORD_TOKEN") {
        return Ok(token.trim().to_string());
    }

    let file = match cfg!(debug_assertions) {
        true => "key_debug",
        false => "key",
    };
    std::fs::read_to_string(file)
        .map(|key| key.trim().to_string())
        .map_err(|source| ConfigError::NoToken { file, source })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config() -> TrackerConfig {
        TrackerConfig {
            tracked_channel: "pedir-set".to_string(),
            report_channel: "relatorio".to_string(),
            allowed_roles: vec!["mod".to_string()],
            report_lifetime: Duration::from_secs(300),
            emoji: "✅".to_string(),
            command_prefix: "!".to_string(),
            commands: vec![ReportCommand {
                name: "tudo",
                title: "Todos",
                filter: ReportFilter::All,
            }],
            denial_message: "no".to_string(),
            records_file: "registros.json".into(),
            health_addr: TrackerConfig::default_health_addr(),
        }
    }

    fn env(vars: &[(&'static str, &str)]) -> impl Fn(&'static str) -> Option<String> {
        let vars: HashMap<&'static str, String> =
            vars.iter().map(|(k, v)| (*k, v.to_string())).collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn nothing_set_changes_nothing() {
        let config = config().with_overrides(env(&[])).unwrap();
        assert_eq!(config.tracked_channel, "pedir-set");
        assert_eq!(config.health_addr.port(), 10000);
    }

    #[test]
    fn overrides() {
        let config = config()
            .with_overrides(env(&[
                ("TRACKED_CHANNEL", "entrada"),
                ("ALLOWED_ROLES", "👑┇00, gerente ,,"),
                ("REPORT_LIFETIME_SECS", "60"),
                ("RECORDS_FILE", "/tmp/x.json"),
                ("PORT", "8080"),
            ]))
            .unwrap();
        assert_eq!(config.tracked_channel, "entrada");
        assert_eq!(config.allowed_roles, vec!["👑┇00", "gerente"]);
        assert_eq!(config.report_lifetime, Duration::from_secs(60));
        assert_eq!(config.records_file, PathBuf::from("/tmp/x.json"));
        assert_eq!(config.health_addr.port(), 8080);
        assert_eq!(config.report_channel, "relatorio");
    }

    #[test]
    fn bad_numbers() {
        let result = config().with_overrides(env(&[("PORT", "ten thousand")]));
        assert!(matches!(
            result,
            Err(ConfigError::BadValue { var: "PORT", .. })
        ));
    }

    #[test]
    fn commands_match_exactly() {
        let config = config();
        assert_eq!(config.command("tudo").map(|c| c.title), Some("Todos"));
        assert!(config.command("TUDO").is_none());
        assert!(config.command("nada").is_none());
    }

    #[test]
    fn filters() {
        assert!(ReportFilter::FlagRaised.accepts(true));
        assert!(!ReportFilter::FlagRaised.accepts(false));
        assert!(ReportFilter::FlagLowered.accepts(false));
        assert!(ReportFilter::All.accepts(false));
    }
}
