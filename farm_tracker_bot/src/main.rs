use ledger_bot_commons::*;

fn main() {
    start_everything(
        "WARN,farm_tracker_bot=debug,ledger_bot_commons=debug",
        farm_tracker_bot::entry(),
    );
}
