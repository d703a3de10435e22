use std::sync::Arc;

use serenity::Client;
use tokio::task::JoinHandle;

use crate::{
    config::{load_token, TrackerConfig},
    health::{bind_health, serve_health},
    platform::discord::{intents, DiscordHandler},
    record::TrackedRecord,
    scheduler::DeletionScheduler,
    store::JsonFileStore,
    tracker::Tracker,
};

/// Run a tracker bot with records of type `R` until Ctrl-C.
///
/// `config` should already have its environment overrides applied. When run
/// under [`crate::start_everything`], `.env` is loaded by then.
///
/// # Panics
///
/// Panics if there's no bot token, the records file can't be opened, the
/// health check port can't be bound, or the client can't be built.
pub async fn run_tracker<R: TrackedRecord>(config: TrackerConfig) {
    log::info!("ASYNC WOOOO");

    let token = load_token().expect("Could not load the bot token!");

    let store: JsonFileStore<R> = JsonFileStore::open(&config.records_file)
        .await
        .expect("Could not open the records file!");

    let scheduler = DeletionScheduler::new();

    let listener = bind_health(config.health_addr)
        .await
        .expect("Could not bind the health check port!");
    let health = tokio::spawn(serve_health(listener, scheduler.shutdown_token()));

    log::info!(
        "Watching #{} for submissions, reports go to #{}",
        config.tracked_channel,
        config.report_channel
    );

    let tracker = Arc::new(Tracker::new(config, store, scheduler.clone()));

    log::info!("Creating the client...");

    let mut client = Client::builder(&token, intents())
        .event_handler(DiscordHandler::new(tracker))
        .await
        .expect("Failed to create the client!");

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {e}");
            return;
        }
        log::info!("Ctrl-C received, shutting down...");
        shard_manager.shutdown_all().await;
    });

    log::info!("Starting the client!");

    if let Err(e) = client.start().await {
        log::error!("Client stopped with an error: {e}");
    }

    // Pending report deletions and the health check go down with the client.
    scheduler.shutdown();
    join_logged("health check", health).await;

    log::info!("it appears we have been bonked.");
}

/// Wait for a background task, logging it if it panicked or was aborted.
/// Returns `true` if it finished normally.
async fn join_logged(name: &str, handle: JoinHandle<()>) -> bool {
    match handle.await {
        Ok(()) => true,
        Err(e) if e.is_panic() => {
            log::error!("The {name} task panicked: {e}");
            false
        }
        Err(e) => {
            log::warn!("The {name} task did not finish: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn background_task_results() {
        assert!(join_logged("fine", tokio::spawn(async {})).await);

        let panicking = tokio::spawn(async {
            panic!("oh no");
        });
        assert!(!join_logged("panicking", panicking).await);

        let aborted = tokio::spawn(std::future::pending::<()>());
        aborted.abort();
        assert!(!join_logged("aborted", aborted).await);
    }
}
