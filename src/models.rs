//! Domain models that mirror the SQLite schema and get passed between the store,
//! the controller, and the terminal front-end. They stay plain data holders so
//! the other layers can focus on persistence and presentation.

use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
/// One persisted expense row.
pub struct Expense {
    /// Primary key assigned by SQLite. The table never displays it, but remove
    /// flows need it to address the row.
    pub id: i64,
    pub amount: f64,
    /// Usually a [`Category`] label. The store accepts any text.
    pub category: String,
    /// `YYYY-MM-DD`, stamped at insertion.
    pub date: String,
    /// `HH:MM:SS`, stamped at insertion.
    pub time: String,
}

/// Values for an expense that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub amount: f64,
    pub category: String,
    pub date: String,
    pub time: String,
}

impl NewExpense {
    /// Attach the id handed out by the store.
    pub fn into_expense(self, id: i64) -> Expense {
        Expense {
            id,
            amount: self.amount,
            category: self.category,
            date: self.date,
            time: self.time,
        }
    }
}

/// The closed set of categories offered by the add form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Category {
    #[default]
    Food,
    Transport,
    Shopping,
    Other,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Food,
        Category::Transport,
        Category::Shopping,
        Category::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Transport => "Transport",
            Category::Shopping => "Shopping",
            Category::Other => "Other",
        }
    }

    /// Step through [`Category::ALL`], wrapping at both ends.
    pub fn cycle(self, offset: isize) -> Category {
        let len = Self::ALL.len() as isize;
        let idx = Self::ALL.iter().position(|c| *c == self).unwrap_or(0) as isize;
        Self::ALL[(idx + offset).rem_euclid(len) as usize]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Category constraint applied to a query. `All` is the "no constraint"
/// sentinel shown as "All" in the filter selector.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    pub const ALL_LABEL: &'static str = "All";

    /// Map a selector label to a filter; the sentinel label means no constraint.
    pub fn from_label(label: &str) -> Self {
        if label == Self::ALL_LABEL {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(label.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            CategoryFilter::All => Self::ALL_LABEL,
            CategoryFilter::Only(category) => category,
        }
    }

    /// Cycle through "All" followed by every [`Category`].
    pub fn cycle(&self, offset: isize) -> CategoryFilter {
        let choices: Vec<CategoryFilter> = std::iter::once(CategoryFilter::All)
            .chain(
                Category::ALL
                    .iter()
                    .map(|c| CategoryFilter::Only(c.label().to_string())),
            )
            .collect();
        let len = choices.len() as isize;
        let idx = choices.iter().position(|c| c == self).unwrap_or(0) as isize;
        choices[(idx + offset).rem_euclid(len) as usize].clone()
    }
}

impl From<Category> for CategoryFilter {
    fn from(category: Category) -> Self {
        CategoryFilter::Only(category.label().to_string())
    }
}

/// Combined predicate for [`crate::db::ExpenseStore::query`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExpenseFilter {
    pub category: CategoryFilter,
    /// Matched literally against the start of the `time` column. Empty means
    /// no time constraint.
    pub time_prefix: String,
}

impl ExpenseFilter {
    pub fn new(category: CategoryFilter, time_prefix: impl Into<String>) -> Self {
        Self {
            category,
            time_prefix: time_prefix.into(),
        }
    }

    /// The "all categories, no time filter" predicate.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_all(&self) -> bool {
        self.category == CategoryFilter::All && self.time_prefix.is_empty()
    }
}

impl fmt::Display for ExpenseFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Category: {}", self.category.label())?;
        if !self.time_prefix.is_empty() {
            write!(f, ", Time: {}*", self.time_prefix)?;
        }
        Ok(())
    }
}

/// Columns the table can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Amount,
    Category,
    /// Orders by date first so entries from different days stay chronological.
    Time,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub column: SortColumn,
    pub descending: bool,
}

impl SortOrder {
    pub fn compare(&self, a: &Expense, b: &Expense) -> Ordering {
        let ordering = match self.column {
            SortColumn::Amount => a.amount.total_cmp(&b.amount),
            SortColumn::Category => a.category.cmp(&b.category),
            SortColumn::Time => (&a.date, &a.time).cmp(&(&b.date, &b.time)),
        };
        let ordering = ordering.then_with(|| a.id.cmp(&b.id));
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}
