//! Runtime configuration: where the database, log file, and exports live.
//! Command-line flags win, then environment variables, then defaults under the
//! user's home directory.

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use directories::BaseDirs;

use crate::export::ExportKind;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".expense-tracker";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "expenses.db";
const LOG_FILE_NAME: &str = "expense-tracker.log";

/// Record, filter, and export personal expenses from the terminal.
#[derive(Debug, Parser)]
#[command(name = "expense-tracker", version)]
pub struct Cli {
    /// SQLite database file (created on first run)
    #[arg(long, env = "EXPENSE_TRACKER_DB")]
    pub db: Option<PathBuf>,

    /// Directory offered as the default destination for CSV and PDF exports
    #[arg(long, env = "EXPENSE_TRACKER_EXPORT_DIR")]
    pub export_dir: Option<PathBuf>,

    /// File that receives diagnostic logs
    #[arg(long, env = "EXPENSE_TRACKER_LOG")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub export_dir: PathBuf,
    pub log_path: PathBuf,
}

impl Config {
    /// Fill in every path the user did not supply.
    pub fn resolve(cli: Cli) -> Result<Self> {
        let data_dir = match (&cli.db, &cli.log_file) {
            (Some(_), Some(_)) => None,
            _ => Some(data_dir()?),
        };
        let in_data_dir = |name: &str| {
            data_dir
                .as_ref()
                .map(|dir| dir.join(name))
                .ok_or_else(|| anyhow!("data directory unavailable"))
        };

        let db_path = match cli.db {
            Some(path) => path,
            None => in_data_dir(DB_FILE_NAME)?,
        };
        let log_path = match cli.log_file {
            Some(path) => path,
            None => in_data_dir(LOG_FILE_NAME)?,
        };
        let export_dir = match cli.export_dir {
            Some(dir) => dir,
            None => env::current_dir().context("could not determine the working directory")?,
        };

        Ok(Self {
            db_path,
            export_dir,
            log_path,
        })
    }

    /// Suggested destination for an export, pre-filled in the save prompt.
    pub fn default_export_path(&self, kind: ExportKind) -> PathBuf {
        self.export_dir.join(kind.default_file_name())
    }
}

/// Resolve the application data directory inside the user's home.
fn data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}
