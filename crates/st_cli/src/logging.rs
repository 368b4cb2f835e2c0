use std::sync::Once;
use tracing::Level;

static INIT: Once = Once::new();

/// Install the fmt subscriber once. `verbose` lowers the level to debug.
pub fn init_logging(verbose: bool) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    INIT.call_once(|| {
        tracing_subscriber::fmt().with_max_level(level).with_target(false).init();
    });
}
