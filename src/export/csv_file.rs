use std::io::{Read, Write};

use anyhow::{Context, Result};
use csv::{QuoteStyle, ReaderBuilder, WriterBuilder};
use serde::Deserialize;

use super::EXPORT_COLUMNS;
use crate::models::Expense;

pub const CSV_HEADER: &str = "Amount,Category,Time";

/// One exported line, as read back from a CSV file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CsvRow {
    #[serde(rename = "Amount")]
    pub amount: f64,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Time")]
    pub time: String,
}

/// Write the header and one unquoted line per expense. Amounts use the
/// shortest text that parses back to the same `f64`.
pub fn write_csv<W: Write>(writer: W, expenses: &[Expense]) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Never)
        .from_writer(writer);

    wtr.write_record(EXPORT_COLUMNS)
        .context("failed to write CSV header")?;
    for expense in expenses {
        wtr.write_record([
            expense.amount.to_string().as_str(),
            expense.category.as_str(),
            expense.time.as_str(),
        ])
        .with_context(|| format!("failed to write CSV row for expense {}", expense.id))?;
    }
    wtr.flush().context("failed to flush CSV output")?;

    Ok(())
}

/// Parse a previously exported file.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<CsvRow>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let rows = rdr
        .deserialize()
        .collect::<Result<Vec<CsvRow>, _>>()
        .context("failed to parse CSV export")?;

    Ok(rows)
}
