use ledger_bot_commons::run_tracker;

use crate::{default_config, SetRecord};

/// # Panics
///
/// Panics if the configuration is broken, or if the bot fails to start lol
pub async fn entry() {
    let config = default_config()
        .with_env_overrides()
        .expect("Broken configuration in the environment!");

    run_tracker::<SetRecord>(config).await;
}
