//! Core library surface for the Expense Tracker TUI application.
//!
//! The store, controller, and exporters carry all behavior; the `ui` module is
//! a thin front-end that only calls [`Controller`] and renders what it returns.
pub mod config;
pub mod controller;
pub mod db;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod ui;

pub use config::{Cli, Config};
pub use controller::Controller;
pub use db::ExpenseStore;
pub use error::TrackerError;
pub use export::{ExportKind, ExportReport};
pub use models::{Category, CategoryFilter, Expense, ExpenseFilter, NewExpense, SortColumn, SortOrder};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
