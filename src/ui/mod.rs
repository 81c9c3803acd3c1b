//! Ratatui front-end. It owns only presentation state (selection, popups,
//! status line) and forwards every action to the [`crate::Controller`].

mod app;
mod forms;
mod helpers;
mod terminal;

pub use app::App;
pub use terminal::run_app;
