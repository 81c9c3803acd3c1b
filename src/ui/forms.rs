use std::path::{Path, PathBuf};

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::export::ExportKind;
use crate::models::{Category, CategoryFilter, Expense, ExpenseFilter};

/// Inputs of the "add expense" popup. The form outlives the popup so the chosen
/// category is still selected the next time it opens.
#[derive(Default, Clone)]
pub(crate) struct ExpenseForm {
    pub(crate) amount: String,
    pub(crate) category: Category,
    pub(crate) active: ExpenseField,
    pub(crate) error: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum ExpenseField {
    #[default]
    Amount,
    Category,
}

impl ExpenseForm {
    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            ExpenseField::Amount => ExpenseField::Category,
            ExpenseField::Category => ExpenseField::Amount,
        };
    }

    /// Amount text is free-form; parsing happens when the form is submitted.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        match self.active {
            ExpenseField::Amount if !ch.is_control() => {
                self.amount.push(ch);
                true
            }
            ExpenseField::Category if ch == ' ' => {
                self.category = self.category.cycle(1);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn backspace(&mut self) {
        if self.active == ExpenseField::Amount {
            self.amount.pop();
        }
    }

    pub(crate) fn cycle_category(&mut self, offset: isize) {
        self.category = self.category.cycle(offset);
    }

    /// Reset for the next entry, keeping the category.
    pub(crate) fn clear_amount(&mut self) {
        self.amount.clear();
        self.error = None;
        self.active = ExpenseField::Amount;
    }

    pub(crate) fn build_lines(&self) -> Vec<Line<'static>> {
        vec![
            field_line(
                "Amount",
                &self.amount,
                "<required>",
                self.active == ExpenseField::Amount,
            ),
            field_line(
                "Category",
                &format!("< {} >", self.category),
                "",
                self.active == ExpenseField::Category,
            ),
        ]
    }
}

/// Inputs of the filter popup. They are kept between uses, even when an add
/// or remove resets the active filter.
#[derive(Default, Clone)]
pub(crate) struct FilterForm {
    pub(crate) category: CategoryFilter,
    pub(crate) time_prefix: String,
    pub(crate) active: FilterField,
}

#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum FilterField {
    #[default]
    Category,
    TimePrefix,
}

impl FilterForm {
    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            FilterField::Category => FilterField::TimePrefix,
            FilterField::TimePrefix => FilterField::Category,
        };
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        match self.active {
            FilterField::TimePrefix if !ch.is_control() => {
                self.time_prefix.push(ch);
                true
            }
            FilterField::Category if ch == ' ' => {
                self.category = self.category.cycle(1);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn backspace(&mut self) {
        if self.active == FilterField::TimePrefix {
            self.time_prefix.pop();
        }
    }

    pub(crate) fn cycle_category(&mut self, offset: isize) {
        self.category = self.category.cycle(offset);
    }

    pub(crate) fn to_filter(&self) -> ExpenseFilter {
        ExpenseFilter::new(self.category.clone(), self.time_prefix.trim())
    }

    pub(crate) fn build_lines(&self) -> Vec<Line<'static>> {
        vec![
            field_line(
                "Category",
                &format!("< {} >", self.category.label()),
                "",
                self.active == FilterField::Category,
            ),
            field_line(
                "Time (HH:MM)",
                &self.time_prefix,
                "<any>",
                self.active == FilterField::TimePrefix,
            ),
        ]
    }
}

/// Destination prompt shown before an export, pre-filled with the default path.
#[derive(Clone)]
pub(crate) struct ExportPrompt {
    pub(crate) kind: ExportKind,
    pub(crate) path: String,
    pub(crate) error: Option<String>,
}

impl ExportPrompt {
    pub(crate) fn new(kind: ExportKind, default_path: &Path) -> Self {
        Self {
            kind,
            path: default_path.display().to_string(),
            error: None,
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.path.push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.path.pop();
    }

    /// `None` while the prompt holds nothing but whitespace.
    pub(crate) fn destination(&self) -> Option<PathBuf> {
        let trimmed = self.path.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(PathBuf::from(trimmed))
        }
    }

    pub(crate) fn build_line(&self) -> Line<'static> {
        field_line("File", &self.path, "<required>", true)
    }
}

/// Snapshot of the row awaiting removal, so the popup can describe it.
#[derive(Clone)]
pub(crate) struct ConfirmRemove {
    pub(crate) row: usize,
    pub(crate) expense: Expense,
}

/// Render `Name: value`, highlighting the focused field and dimming
/// placeholders.
fn field_line(name: &str, value: &str, placeholder: &str, is_active: bool) -> Line<'static> {
    let display = if value.is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    };

    let style = if is_active {
        Style::default().fg(Color::Yellow)
    } else if value.is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::raw(format!("{name}: ")),
        Span::styled(display, style),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_accepts_any_text_until_submit() {
        let mut form = ExpenseForm::default();
        for ch in "abc".chars() {
            assert!(form.push_char(ch));
        }
        assert_eq!(form.amount, "abc");
    }

    #[test]
    fn clearing_keeps_category() {
        let mut form = ExpenseForm::default();
        form.toggle_field();
        form.cycle_category(1);
        form.toggle_field();
        form.push_char('5');

        form.clear_amount();

        assert!(form.amount.is_empty());
        assert_eq!(form.category, Category::Transport);
    }

    #[test]
    fn filter_form_trims_prefix() {
        let mut form = FilterForm::default();
        form.cycle_category(1);
        form.toggle_field();
        for ch in " 09:3 ".chars() {
            form.push_char(ch);
        }

        let filter = form.to_filter();
        assert_eq!(filter.category, CategoryFilter::Only("Food".into()));
        assert_eq!(filter.time_prefix, "09:3");
    }

    #[test]
    fn blank_export_path_has_no_destination() {
        let mut prompt = ExportPrompt::new(ExportKind::Csv, Path::new("expenses.csv"));
        assert_eq!(prompt.destination(), Some(PathBuf::from("expenses.csv")));

        prompt.path = "   ".into();
        assert_eq!(prompt.destination(), None);
    }
}
