use ledger_bot_commons::*;

fn main() {
    start_everything(
        "WARN,set_tracker_bot=debug,ledger_bot_commons=debug",
        set_tracker_bot::entry(),
    );
}
