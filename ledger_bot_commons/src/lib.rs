//! Shared guts of the submission ledger bots: they watch one Discord channel for
//! `key: value` submissions, keep them in a JSON file, and let moderators confirm
//! them with a checkmark reaction. Each bot crate only supplies its record type
//! and its constants.

use std::{ffi::OsString, future::Future};

/// Deployment configuration, fixed at startup.
pub mod config;

/// `key: value` message body parsing.
pub mod parsing;

/// The record trait both bots implement.
pub mod record;

/// Where records live.
pub mod store;

/// Typed chat events and the capability trait handlers talk to the chat through.
pub mod platform;

/// Event handling: submissions, reactions and report commands.
pub mod tracker;

/// Delayed deletion of report messages.
pub mod scheduler;

/// The little HTTP listener that keeps the hosting platform's health check happy.
pub mod health;

/// Entry function that wires everything up and starts the bot.
mod entry;
pub use entry::*;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

/// Load `.env`, initialize logging and run `closure` to completion on a
/// multi-threaded tokio runtime.
///
/// Logging uses [pretty_env_logger][] with the filters in `RUST_LOG`, which
/// may come from `.env`, or `default_filters` if it's unset. Timestamps are
/// left out under systemd, as the journal has its own.
///
/// # Panics
///
/// Panics if the tokio runtime can't be built.
///
/// [pretty_env_logger]: https://docs.rs/pretty_env_logger
pub fn start_everything(default_filters: &str, closure: impl Future<Output = ()>) {
    // Before the logger, so it sees RUST_LOG from .env.
    let dotenv = config::load_dotenv();

    init_logger(&log_filters(default_filters, std::env::var_os("RUST_LOG")));

    match dotenv {
        Ok(Some(path)) => log::info!("Loaded environment from {}", path.display()),
        Ok(None) => (),
        Err(e) => log::warn!("Failed to load .env file: {e}"),
    }

    log::info!("hi");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Could not build the tokio runtime!")
        .block_on(closure);
}

/// `RUST_LOG` if it's set to something usable, otherwise the defaults.
fn log_filters(default_filters: &str, rust_log: Option<OsString>) -> String {
    rust_log
        .and_then(|value| value.into_string().ok())
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default_filters.to_string())
}

fn init_logger(filters: &str) {
    let mut builder = match std::env::var_os("JOURNAL_STREAM") {
        Some(_) => pretty_env_logger::formatted_builder(),
        None => pretty_env_logger::formatted_timed_builder(),
    };
    builder.parse_filters(filters);

    if builder.try_init().is_err() {
        log::error!("Tried to init logger twice!");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_log_wins_over_defaults() {
        assert_eq!(log_filters("warn", None), "warn");
        assert_eq!(log_filters("warn", Some(OsString::from("  "))), "warn");
        assert_eq!(
            log_filters("warn", Some(OsString::from("set_tracker_bot=trace"))),
            "set_tracker_bot=trace"
        );
    }

    #[test]
    fn rust_log_can_come_from_dotenv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "RUST_LOG=ledger_bot_commons=trace\n").unwrap();

        std::env::remove_var("RUST_LOG");
        dotenvy::from_path(&path).unwrap();

        assert_eq!(
            log_filters("warn", std::env::var_os("RUST_LOG")),
            "ledger_bot_commons=trace"
        );
        std::env::remove_var("RUST_LOG");
    }
}
