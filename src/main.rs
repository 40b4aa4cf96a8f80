//! Binary entry point that glues the MongoDB-backed record store to the TUI.
//! The bootstrapping pipeline is deliberately short: resolve configuration
//! from the environment, attempt the one connection the process will ever
//! hold, hydrate the initial app state, and drive the Ratatui event loop
//! until the user exits. A failed connection is not fatal here — the app
//! starts in a degraded, display-only mode and reports the reason.
use student_registry::{run_app, App, Store, StoreConfig};

/// Resolve configuration, connect (or record why we could not), and launch
/// the Ratatui event loop. Returning a `Result` bubbles up fatal terminal
/// setup problems instead of crashing silently; store failures never reach
/// this level.
fn main() -> anyhow::Result<()> {
    let config = StoreConfig::from_env();
    let store = Store::connect(config);

    let mut app = App::new(store);
    run_app(&mut app)
}
