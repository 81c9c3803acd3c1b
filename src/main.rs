//! Binary entry point that glues the SQLite-backed store to the TUI: resolve
//! paths, start logging, open the database, load the first view, and drive the
//! Ratatui event loop until the user exits.
use anyhow::Context;
use clap::Parser;
use tracing::info;

use expense_tracker::{logging, run_app, App, Cli, Config, Controller, ExpenseStore};

/// Returning a `Result` bubbles fatal start-up problems (an unwritable data
/// directory, a database that cannot be opened) to the terminal.
fn main() -> anyhow::Result<()> {
    let config = Config::resolve(Cli::parse())?;
    logging::init(&config.log_path)?;
    info!(db = %config.db_path.display(), "starting expense tracker");

    let store = ExpenseStore::open(&config.db_path).context("failed to open expense database")?;
    let mut controller = Controller::new(store);
    controller.load().context("failed to load expenses")?;

    let mut app = App::new(controller, config);
    let result = run_app(&mut app);
    info!("expense tracker closed");
    result
}
