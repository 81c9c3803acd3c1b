//! Persistence module split across logical submodules.

mod connection;
mod expenses;

pub use connection::ExpenseStore;
