//! Mediates every user action against the [`ExpenseStore`] and owns the view:
//! the rows currently on screen, each carrying its id so removal never asks the
//! user for one. The view is replaced wholesale after every store round trip and
//! is the only thing exports ever read.

use std::fs::File;
use std::path::Path;

use chrono::{Local, NaiveDateTime};
use tracing::{info, warn};

use crate::db::ExpenseStore;
use crate::error::TrackerError;
use crate::export::{render_pdf, with_pdf_suffix, write_atomically, write_csv, ExportKind, ExportReport};
use crate::models::{Expense, ExpenseFilter, NewExpense, SortColumn, SortOrder};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

pub struct Controller {
    store: ExpenseStore,
    view: Vec<Expense>,
    filter: ExpenseFilter,
    sort: Option<SortOrder>,
    /// Set when a change reached the store but the view could not be rebuilt.
    refresh_error: Option<TrackerError>,
}

impl Controller {
    /// Start with an empty view; call [`Controller::load`] to populate it.
    pub fn new(store: ExpenseStore) -> Self {
        Self {
            store,
            view: Vec::new(),
            filter: ExpenseFilter::all(),
            sort: None,
            refresh_error: None,
        }
    }

    pub fn view(&self) -> &[Expense] {
        &self.view
    }

    pub fn filter(&self) -> &ExpenseFilter {
        &self.filter
    }

    pub fn sort(&self) -> Option<SortOrder> {
        self.sort
    }

    pub fn store(&self) -> &ExpenseStore {
        &self.store
    }

    /// The reload failure left behind by the last committed add or remove, if
    /// any. The view still shows the rows from before that change.
    pub fn take_refresh_error(&mut self) -> Option<TrackerError> {
        self.refresh_error.take()
    }

    /// Re-run the active filter.
    pub fn load(&mut self) -> Result<(), TrackerError> {
        let filter = self.filter.clone();
        self.reload(filter)
    }

    /// Record a new expense stamped with the current local date and time.
    pub fn add(&mut self, amount_text: &str, category: &str) -> Result<Expense, TrackerError> {
        self.add_at(amount_text, category, Local::now().naive_local())
    }

    /// Record a new expense stamped with `now`. Any active filter is cleared
    /// afterwards so the new row is visible. Once the insert commits this
    /// returns `Ok`; a failed reload is left in [`Controller::take_refresh_error`].
    pub fn add_at(
        &mut self,
        amount_text: &str,
        category: &str,
        now: NaiveDateTime,
    ) -> Result<Expense, TrackerError> {
        let amount = parse_amount(amount_text).inspect_err(|err| warn!("{err}"))?;
        let new = NewExpense {
            amount,
            category: category.to_string(),
            date: now.format(DATE_FORMAT).to_string(),
            time: now.format(TIME_FORMAT).to_string(),
        };

        let id = self.store.insert(&new).map_err(storage_error)?;
        let expense = new.into_expense(id);
        info!(id, amount, category, "expense added");

        self.refresh_after_change();
        Ok(expense)
    }

    /// Delete the expense behind view row `selected`. Any active filter is
    /// cleared afterwards. Reload failures are handled as in `add_at`.
    pub fn remove(&mut self, selected: Option<usize>) -> Result<Expense, TrackerError> {
        let Some(expense) = selected.and_then(|idx| self.view.get(idx)).cloned() else {
            warn!("remove requested without a selected row");
            return Err(TrackerError::NoSelection);
        };

        let deleted = self
            .store
            .delete_by_id(expense.id)
            .map_err(storage_error)?;
        if deleted {
            info!(id = expense.id, "expense removed");
        } else {
            warn!(id = expense.id, "expense was already gone");
        }

        self.refresh_after_change();
        Ok(expense)
    }

    /// Replace the view with the rows matching `filter`. Returns the row count.
    pub fn apply_filter(&mut self, filter: ExpenseFilter) -> Result<usize, TrackerError> {
        self.reload(filter)?;
        info!(filter = %self.filter, rows = self.view.len(), "filter applied");
        Ok(self.view.len())
    }

    /// Order the view by `column`; choosing the active column again flips the
    /// direction. The order sticks across reloads.
    pub fn sort_by(&mut self, column: SortColumn) -> SortOrder {
        let order = match self.sort {
            Some(current) if current.column == column => SortOrder {
                column,
                descending: !current.descending,
            },
            _ => SortOrder {
                column,
                descending: false,
            },
        };
        self.sort = Some(order);
        self.apply_sort();
        order
    }

    /// Write the view as CSV. `None` means the user backed out of choosing a
    /// destination, which is not an error.
    pub fn export_csv(
        &self,
        destination: Option<&Path>,
    ) -> Result<Option<ExportReport>, TrackerError> {
        let Some(path) = destination else {
            return Ok(None);
        };

        write_atomically(path, |file: &mut File| write_csv(file, &self.view))
            .map_err(export_error)?;

        let report = ExportReport {
            kind: ExportKind::Csv,
            path: path.to_path_buf(),
            rows: self.view.len(),
            pages: None,
        };
        info!(path = %report.path.display(), rows = report.rows, "CSV export written");
        Ok(Some(report))
    }

    /// Write the view as a paginated PDF report, appending `.pdf` to the
    /// destination when it is missing. `None` is a cancelled save.
    pub fn export_pdf(
        &self,
        destination: Option<&Path>,
    ) -> Result<Option<ExportReport>, TrackerError> {
        let Some(path) = destination else {
            return Ok(None);
        };
        let path = with_pdf_suffix(path);

        let mut pages = 0;
        write_atomically(&path, |file: &mut File| {
            pages = render_pdf(file, &self.view)?;
            Ok(())
        })
        .map_err(export_error)?;

        let report = ExportReport {
            kind: ExportKind::Pdf,
            path,
            rows: self.view.len(),
            pages: Some(pages),
        };
        info!(path = %report.path.display(), rows = report.rows, pages, "PDF export written");
        Ok(Some(report))
    }

    /// Query with `filter` and swap the view in. On failure the previous view
    /// and filter stay as they were.
    fn reload(&mut self, filter: ExpenseFilter) -> Result<(), TrackerError> {
        let rows = self.store.query(&filter).map_err(storage_error)?;
        self.view = rows;
        self.filter = filter;
        self.refresh_error = None;
        self.apply_sort();
        Ok(())
    }

    fn refresh_after_change(&mut self) {
        if let Err(err) = self.reload(ExpenseFilter::all()) {
            self.refresh_error = Some(err);
        }
    }

    fn apply_sort(&mut self) {
        if let Some(order) = self.sort {
            self.view.sort_by(|a, b| order.compare(a, b));
        }
    }
}

/// Accept any finite number, surrounding whitespace ignored.
pub fn parse_amount(text: &str) -> Result<f64, TrackerError> {
    let trimmed = text.trim();
    match trimmed.parse::<f64>() {
        Ok(amount) if amount.is_finite() => Ok(amount),
        _ => Err(TrackerError::InvalidAmount(trimmed.to_string())),
    }
}

fn storage_error(err: anyhow::Error) -> TrackerError {
    warn!("storage failure: {err:#}");
    TrackerError::Storage(err)
}

fn export_error(err: anyhow::Error) -> TrackerError {
    warn!("export failure: {err:#}");
    TrackerError::Export(err)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::NaiveDate;

    use super::*;
    use crate::export::read_csv;
    use crate::models::CategoryFilter;

    fn controller() -> (tempfile::TempDir, Controller) {
        let dir = tempfile::tempdir().unwrap();
        let store = ExpenseStore::open(dir.path().join("expenses.db")).unwrap();
        let mut controller = Controller::new(store);
        controller.load().unwrap();
        (dir, controller)
    }

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn food_only() -> ExpenseFilter {
        ExpenseFilter::new(CategoryFilter::Only("Food".into()), "")
    }

    #[test]
    fn parse_amount_accepts_signed_and_padded_numbers() {
        assert_eq!(parse_amount(" 12.50 ").unwrap(), 12.5);
        assert_eq!(parse_amount("-3").unwrap(), -3.0);
        assert_eq!(parse_amount("0").unwrap(), 0.0);
        assert!(matches!(
            parse_amount("NaN"),
            Err(TrackerError::InvalidAmount(_))
        ));
        assert!(matches!(
            parse_amount("inf"),
            Err(TrackerError::InvalidAmount(_))
        ));
        assert!(matches!(parse_amount(""), Err(TrackerError::InvalidAmount(_))));
    }

    #[test]
    fn add_stamps_date_and_time() {
        let (_dir, mut controller) = controller();
        let expense = controller.add_at("4.20", "Food", at(9, 30, 15)).unwrap();

        assert_eq!(expense.date, "2024-05-01");
        assert_eq!(expense.time, "09:30:15");
        assert_eq!(controller.view(), &[expense]);
    }

    #[test]
    fn invalid_amount_creates_nothing() {
        let (_dir, mut controller) = controller();
        controller.add_at("1", "Food", at(8, 0, 0)).unwrap();

        let err = controller.add_at("abc", "Food", at(8, 0, 1)).unwrap_err();

        assert!(matches!(err, TrackerError::InvalidAmount(ref text) if text == "abc"));
        assert!(err.is_user_error());
        assert_eq!(controller.store().count().unwrap(), 1);
        assert_eq!(controller.view().len(), 1);
    }

    #[test]
    fn remove_without_selection_deletes_nothing() {
        let (_dir, mut controller) = controller();
        controller.add_at("1", "Food", at(8, 0, 0)).unwrap();

        assert!(matches!(
            controller.remove(None),
            Err(TrackerError::NoSelection)
        ));
        assert!(matches!(
            controller.remove(Some(5)),
            Err(TrackerError::NoSelection)
        ));
        assert_eq!(controller.store().count().unwrap(), 1);
    }

    #[test]
    fn add_and_remove_reset_the_filter() {
        let (_dir, mut controller) = controller();
        controller.add_at("1", "Food", at(8, 0, 0)).unwrap();
        controller.add_at("2", "Transport", at(8, 0, 1)).unwrap();

        controller.apply_filter(food_only()).unwrap();
        controller.add_at("3", "Shopping", at(8, 0, 2)).unwrap();
        assert!(controller.filter().is_all());
        assert_eq!(controller.view().len(), 3);

        controller.apply_filter(food_only()).unwrap();
        controller.remove(Some(0)).unwrap();
        assert!(controller.filter().is_all());
        assert_eq!(controller.view().len(), 2);
    }

    #[test]
    fn food_transport_scenario() {
        let (_dir, mut controller) = controller();
        controller.add_at("12.50", "Food", at(12, 0, 0)).unwrap();
        controller.add_at("7.00", "Transport", at(12, 5, 0)).unwrap();

        assert_eq!(controller.apply_filter(food_only()).unwrap(), 1);
        assert_eq!(controller.view()[0].amount, 12.5);

        controller.remove(Some(0)).unwrap();

        assert_eq!(controller.apply_filter(food_only()).unwrap(), 0);
        assert_eq!(controller.apply_filter(ExpenseFilter::all()).unwrap(), 1);
        assert_eq!(controller.view()[0].category, "Transport");
        assert_eq!(controller.view()[0].amount, 7.0);
    }

    #[test]
    fn sort_toggles_and_survives_reload() {
        let (_dir, mut controller) = controller();
        controller.add_at("5", "Food", at(8, 0, 0)).unwrap();
        controller.add_at("1", "Transport", at(8, 0, 1)).unwrap();
        controller.add_at("3", "Other", at(8, 0, 2)).unwrap();

        controller.sort_by(SortColumn::Amount);
        let amounts: Vec<f64> = controller.view().iter().map(|e| e.amount).collect();
        assert_eq!(amounts, vec![1.0, 3.0, 5.0]);

        let order = controller.sort_by(SortColumn::Amount);
        assert!(order.descending);
        controller.add_at("4", "Food", at(8, 0, 3)).unwrap();
        let amounts: Vec<f64> = controller.view().iter().map(|e| e.amount).collect();
        assert_eq!(amounts, vec![5.0, 4.0, 3.0, 1.0]);
    }

    #[test]
    fn storage_failure_keeps_previous_view() {
        let (dir, mut controller) = controller();
        controller.add_at("1", "Food", at(8, 0, 0)).unwrap();
        let before = controller.view().to_vec();

        let conn = rusqlite::Connection::open(dir.path().join("expenses.db")).unwrap();
        conn.execute("DROP TABLE expenses", []).unwrap();
        drop(conn);

        let err = controller.apply_filter(food_only()).unwrap_err();
        assert!(matches!(err, TrackerError::Storage(_)));
        assert!(!err.is_user_error());
        assert_eq!(controller.view(), before.as_slice());
        assert!(controller.filter().is_all());
    }

    /// A row whose amount is text cannot be read back as a number.
    fn break_reads(dir: &tempfile::TempDir) {
        let conn = rusqlite::Connection::open(dir.path().join("expenses.db")).unwrap();
        conn.execute(
            "INSERT INTO expenses (amount, category, date, time)
             VALUES ('oops', 'Food', '2024-05-01', '08:00:01')",
            [],
        )
        .unwrap();
    }

    #[test]
    fn committed_add_succeeds_when_reload_fails() {
        let (dir, mut controller) = controller();
        controller.add_at("1", "Food", at(8, 0, 0)).unwrap();
        let before = controller.view().to_vec();
        break_reads(&dir);

        let expense = controller.add_at("2", "Transport", at(8, 0, 2)).unwrap();

        assert_eq!(expense.amount, 2.0);
        assert_eq!(controller.store().count().unwrap(), 3);
        assert_eq!(controller.view(), before.as_slice());
        assert!(matches!(
            controller.take_refresh_error(),
            Some(TrackerError::Storage(_))
        ));
        assert!(controller.take_refresh_error().is_none());
    }

    #[test]
    fn committed_remove_succeeds_when_reload_fails() {
        let (dir, mut controller) = controller();
        controller.add_at("1", "Food", at(8, 0, 0)).unwrap();
        break_reads(&dir);

        let removed = controller.remove(Some(0)).unwrap();

        assert_eq!(removed.amount, 1.0);
        assert_eq!(controller.store().count().unwrap(), 1);
        assert!(controller.take_refresh_error().is_some());
    }

    #[test]
    fn successful_reload_clears_refresh_error() {
        let (dir, mut controller) = controller();
        break_reads(&dir);
        controller.add_at("1", "Food", at(8, 0, 0)).unwrap();

        let conn = rusqlite::Connection::open(dir.path().join("expenses.db")).unwrap();
        conn.execute("DELETE FROM expenses WHERE amount = 'oops'", [])
            .unwrap();
        drop(conn);

        controller.load().unwrap();
        assert!(controller.take_refresh_error().is_none());
        assert_eq!(controller.view().len(), 1);
    }

    #[test]
    fn csv_export_reads_the_view_not_the_store() {
        let (dir, mut controller) = controller();
        controller.add_at("12.5", "Food", at(9, 30, 15)).unwrap();
        controller.add_at("7", "Transport", at(10, 0, 0)).unwrap();
        controller.apply_filter(food_only()).unwrap();

        let dest = dir.path().join("out.csv");
        let report = controller.export_csv(Some(&dest)).unwrap().unwrap();
        assert_eq!(report.rows, 1);

        let rows = read_csv(fs::File::open(&dest).unwrap()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, 12.5);
        assert_eq!(rows[0].category, "Food");
        assert_eq!(rows[0].time, "09:30:15");
    }

    #[test]
    fn pdf_export_appends_suffix() {
        let (dir, mut controller) = controller();
        controller.add_at("12.5", "Food", at(9, 30, 15)).unwrap();

        let report = controller
            .export_pdf(Some(&dir.path().join("report")))
            .unwrap()
            .unwrap();

        assert_eq!(report.path, dir.path().join("report.pdf"));
        assert_eq!(report.pages, Some(1));
        assert!(fs::read(&report.path).unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn cancelled_exports_write_nothing() {
        let (dir, controller) = controller();

        assert!(controller.export_csv(None).unwrap().is_none());
        assert!(controller.export_pdf(None).unwrap().is_none());
        let files: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(files, vec![std::ffi::OsString::from("expenses.db")]);
    }

    #[test]
    fn export_to_missing_directory_is_reported() {
        let (dir, controller) = controller();
        let dest = dir.path().join("missing").join("out.csv");

        let err = controller.export_csv(Some(&dest)).unwrap_err();
        assert!(matches!(err, TrackerError::Export(_)));
    }
}
