use std::collections::HashSet;
use std::fs::File;

use chrono::NaiveDate;
use expense_tracker::export::read_csv;
use expense_tracker::{CategoryFilter, Controller, ExpenseFilter, ExpenseStore, TrackerError};

fn open_controller(dir: &tempfile::TempDir) -> Controller {
    let store = ExpenseStore::open(dir.path().join("expenses.db")).unwrap();
    let mut controller = Controller::new(store);
    controller.load().unwrap();
    controller
}

#[test]
fn data_survives_reopening_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let mut ids = HashSet::new();
    {
        let mut controller = open_controller(&dir);
        for (amount, category) in [("12.50", "Food"), ("7.00", "Transport"), ("-1", "Other")] {
            ids.insert(controller.add(amount, category).unwrap().id);
        }
    }

    let controller = open_controller(&dir);
    let view = controller.view();
    assert_eq!(view.len(), 3);
    assert_eq!(view.iter().map(|e| e.id).collect::<HashSet<_>>(), ids);
    for expense in view {
        assert!(NaiveDate::parse_from_str(&expense.date, "%Y-%m-%d").is_ok());
        assert_eq!(expense.time.len(), 8);
    }
}

#[test]
fn filter_remove_and_export_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = open_controller(&dir);

    controller.add("12.50", "Food").unwrap();
    controller.add("7.00", "Transport").unwrap();
    controller.add("3.25", "Shopping").unwrap();
    assert!(matches!(
        controller.add("twelve", "Food"),
        Err(TrackerError::InvalidAmount(_))
    ));
    assert!(matches!(controller.remove(None), Err(TrackerError::NoSelection)));
    assert_eq!(controller.store().count().unwrap(), 3);

    let food = ExpenseFilter::new(CategoryFilter::Only("Food".into()), "");
    assert_eq!(controller.apply_filter(food.clone()).unwrap(), 1);
    controller.remove(Some(0)).unwrap();
    assert_eq!(controller.apply_filter(food).unwrap(), 0);
    assert_eq!(controller.apply_filter(ExpenseFilter::all()).unwrap(), 2);

    let dest = dir.path().join("expenses.csv");
    controller.export_csv(Some(&dest)).unwrap();
    let rows = read_csv(File::open(&dest).unwrap()).unwrap();

    let exported: Vec<(f64, String, String)> = rows
        .into_iter()
        .map(|row| (row.amount, row.category, row.time))
        .collect();
    let shown: Vec<(f64, String, String)> = controller
        .view()
        .iter()
        .map(|e| (e.amount, e.category.clone(), e.time.clone()))
        .collect();
    assert_eq!(exported, shown);
}
