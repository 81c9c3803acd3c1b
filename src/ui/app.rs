use std::mem;
use std::path::Path;

use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};
use ratatui::Frame;
use tracing::error;

use crate::config::Config;
use crate::controller::Controller;
use crate::error::TrackerError;
use crate::export::ExportKind;
use crate::models::{ExpenseFilter, SortColumn};

use super::forms::{ConfirmRemove, ExpenseField, ExpenseForm, ExportPrompt, FilterField, FilterForm};
use super::helpers::{centered_rect, column_title, export_message, format_amount, plural};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 4;
/// Rows skipped by PageUp / PageDown.
const PAGE_STEP: isize = 10;

/// Popups layered over the table. Only one is open at a time.
enum Mode {
    Normal,
    AddingExpense(ExpenseForm),
    Filtering(FilterForm),
    ConfirmRemove(ConfirmRemove),
    Exporting(ExportPrompt),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Presentation state for the single expense screen. Everything that touches
/// the database goes through `controller`.
pub struct App {
    controller: Controller,
    config: Config,
    /// Index into the controller's view. Cleared whenever the view is rebuilt.
    selected: Option<usize>,
    mode: Mode,
    status: Option<StatusMessage>,
    expense_form: ExpenseForm,
    filter_form: FilterForm,
}

impl App {
    pub fn new(controller: Controller, config: Config) -> Self {
        Self {
            controller,
            config,
            selected: None,
            mode: Mode::Normal,
            status: None,
            expense_form: ExpenseForm::default(),
            filter_form: FilterForm::default(),
        }
    }

    /// Process one key press. Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::AddingExpense(form) => self.handle_add_expense(code, form),
            Mode::Filtering(form) => self.handle_filter(code, form),
            Mode::ConfirmRemove(confirm) => self.handle_confirm_remove(code, confirm),
            Mode::Exporting(prompt) => self.handle_export(code, prompt),
        };

        exit
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                *exit = true;
            }
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-PAGE_STEP),
            KeyCode::PageDown => self.move_selection(PAGE_STEP),
            KeyCode::Home => self.select_edge(false),
            KeyCode::End => self.select_edge(true),
            KeyCode::Char('a') | KeyCode::Char('A') | KeyCode::Char('+') => {
                self.clear_status();
                let mut form = self.expense_form.clone();
                form.active = ExpenseField::Amount;
                return Mode::AddingExpense(form);
            }
            KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Char('-') | KeyCode::Delete => {
                let row = self
                    .selected
                    .and_then(|idx| self.controller.view().get(idx).map(|e| (idx, e.clone())));
                match row {
                    Some((row, expense)) => {
                        self.clear_status();
                        return Mode::ConfirmRemove(ConfirmRemove { row, expense });
                    }
                    None => self.report_error(&TrackerError::NoSelection),
                }
            }
            KeyCode::Char('f') | KeyCode::Char('F') | KeyCode::Char('/') => {
                self.clear_status();
                return Mode::Filtering(self.filter_form.clone());
            }
            KeyCode::Char('x') | KeyCode::Char('X') => {
                self.filter_form = FilterForm::default();
                self.apply_filter(ExpenseFilter::all());
            }
            KeyCode::Char('r') | KeyCode::Char('R') => match self.controller.load() {
                Ok(()) => {
                    self.selected = None;
                    self.set_status(
                        format!("Reloaded {}.", plural(self.controller.view().len(), "expense")),
                        StatusKind::Info,
                    );
                }
                Err(err) => self.report_error(&err),
            },
            KeyCode::Char('1') => self.sort_by(SortColumn::Amount),
            KeyCode::Char('2') => self.sort_by(SortColumn::Category),
            KeyCode::Char('3') => self.sort_by(SortColumn::Time),
            KeyCode::Char('c') | KeyCode::Char('C') => {
                self.clear_status();
                return Mode::Exporting(self.export_prompt(ExportKind::Csv));
            }
            KeyCode::Char('p') | KeyCode::Char('P') => {
                self.clear_status();
                return Mode::Exporting(self.export_prompt(ExportKind::Pdf));
            }
            _ => {}
        }
        Mode::Normal
    }

    fn handle_add_expense(&mut self, code: KeyCode, mut form: ExpenseForm) -> Mode {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Add expense cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Left if form.active == ExpenseField::Category => form.cycle_category(-1),
            KeyCode::Right if form.active == ExpenseField::Category => form.cycle_category(1),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.controller.add(&form.amount, form.category.label()) {
                Ok(expense) => {
                    self.selected = None;
                    self.set_status(
                        format!(
                            "Added {} ({}) at {}.",
                            format_amount(expense.amount),
                            expense.category,
                            expense.time
                        ),
                        StatusKind::Info,
                    );
                    self.report_refresh_error();
                    form.clear_amount();
                    keep_open = false;
                }
                Err(err) => {
                    form.error = Some(err.to_string());
                    self.report_error(&err);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Mode::AddingExpense(form)
        } else {
            self.expense_form = form;
            Mode::Normal
        }
    }

    fn handle_filter(&mut self, code: KeyCode, mut form: FilterForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Filter unchanged.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter => {
                let filter = form.to_filter();
                self.filter_form = form;
                self.apply_filter(filter);
                Mode::Normal
            }
            KeyCode::Tab | KeyCode::BackTab => {
                form.toggle_field();
                Mode::Filtering(form)
            }
            KeyCode::Left if form.active == FilterField::Category => {
                form.cycle_category(-1);
                Mode::Filtering(form)
            }
            KeyCode::Right if form.active == FilterField::Category => {
                form.cycle_category(1);
                Mode::Filtering(form)
            }
            KeyCode::Backspace => {
                form.backspace();
                Mode::Filtering(form)
            }
            KeyCode::Char(ch) => {
                form.push_char(ch);
                Mode::Filtering(form)
            }
            _ => Mode::Filtering(form),
        }
    }

    fn handle_confirm_remove(&mut self, code: KeyCode, confirm: ConfirmRemove) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Removal cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.controller.remove(Some(confirm.row)) {
                    Ok(expense) => {
                        self.selected = None;
                        self.set_status(
                            format!(
                                "Removed {} ({}).",
                                format_amount(expense.amount),
                                expense.category
                            ),
                            StatusKind::Info,
                        );
                        self.report_refresh_error();
                    }
                    Err(err) => self.report_error(&err),
                }
                Mode::Normal
            }
            _ => Mode::ConfirmRemove(confirm),
        }
    }

    fn handle_export(&mut self, code: KeyCode, mut prompt: ExportPrompt) -> Mode {
        match code {
            KeyCode::Esc => {
                // A cancelled save is not worth a message.
                self.run_export(prompt.kind, None);
                self.clear_status();
                Mode::Normal
            }
            KeyCode::Enter => {
                let Some(destination) = prompt.destination() else {
                    prompt.error = Some("Enter a file name or press Esc.".to_string());
                    return Mode::Exporting(prompt);
                };
                if self.run_export(prompt.kind, Some(destination.as_path())) {
                    Mode::Normal
                } else {
                    prompt.error = self.status.as_ref().map(|status| status.text.clone());
                    Mode::Exporting(prompt)
                }
            }
            KeyCode::Backspace => {
                prompt.backspace();
                Mode::Exporting(prompt)
            }
            KeyCode::Char(ch) => {
                if prompt.push_char(ch) {
                    prompt.error = None;
                }
                Mode::Exporting(prompt)
            }
            _ => Mode::Exporting(prompt),
        }
    }

    /// Returns `false` when the export failed and the prompt should stay open.
    fn run_export(&mut self, kind: ExportKind, destination: Option<&Path>) -> bool {
        let result = match kind {
            ExportKind::Csv => self.controller.export_csv(destination),
            ExportKind::Pdf => self.controller.export_pdf(destination),
        };
        match result {
            Ok(Some(report)) => {
                self.set_status(export_message(&report), StatusKind::Info);
                true
            }
            Ok(None) => true,
            Err(err) => {
                self.report_error(&err);
                false
            }
        }
    }

    fn apply_filter(&mut self, filter: ExpenseFilter) {
        match self.controller.apply_filter(filter) {
            Ok(rows) => {
                self.selected = None;
                self.set_status(
                    format!("Showing {}.", plural(rows, "expense")),
                    StatusKind::Info,
                );
            }
            Err(err) => self.report_error(&err),
        }
    }

    fn sort_by(&mut self, column: SortColumn) {
        let selected_id = self.selected_id();
        self.controller.sort_by(column);
        self.selected =
            selected_id.and_then(|id| self.controller.view().iter().position(|e| e.id == id));
    }

    fn export_prompt(&self, kind: ExportKind) -> ExportPrompt {
        ExportPrompt::new(kind, &self.config.default_export_path(kind))
    }

    fn selected_id(&self) -> Option<i64> {
        self.selected
            .and_then(|idx| self.controller.view().get(idx))
            .map(|e| e.id)
    }

    fn move_selection(&mut self, offset: isize) {
        let len = self.controller.view().len();
        if len == 0 {
            self.selected = None;
            return;
        }
        let next = match self.selected {
            None if offset < 0 => len as isize - 1,
            None => 0,
            Some(current) => (current as isize + offset).clamp(0, len as isize - 1),
        };
        self.selected = Some(next as usize);
    }

    fn select_edge(&mut self, last: bool) {
        let len = self.controller.view().len();
        self.selected = match (len, last) {
            (0, _) => None,
            (_, false) => Some(0),
            (_, true) => Some(len - 1),
        };
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    /// The change itself went through; only the list on screen is out of date.
    fn report_refresh_error(&mut self) {
        if let Some(err) = self.controller.take_refresh_error() {
            error!("list refresh failed: {err}");
            self.set_status(
                format!("Saved, but the list could not be refreshed ({err}). Press r to retry."),
                StatusKind::Error,
            );
        }
    }

    fn report_error(&mut self, err: &TrackerError) {
        if !err.is_user_error() {
            error!("{err}");
        }
        self.set_status(err.to_string(), StatusKind::Error);
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        self.draw_table(frame, content_area);

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::AddingExpense(form) => self.draw_expense_form(frame, area, form),
            Mode::Filtering(form) => self.draw_filter_form(frame, area, form),
            Mode::ConfirmRemove(confirm) => self.draw_confirm_remove(frame, area, confirm),
            Mode::Exporting(prompt) => self.draw_export_prompt(frame, area, prompt),
            Mode::Normal => {}
        }
    }

    fn draw_table(&self, frame: &mut Frame, area: Rect) {
        let view = self.controller.view();
        let sort = self.controller.sort();
        let header_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);

        let header = Row::new(vec![
            Cell::from(column_title("Amount", SortColumn::Amount, sort)),
            Cell::from(column_title("Category", SortColumn::Category, sort)),
            Cell::from("Date"),
            Cell::from(column_title("Time", SortColumn::Time, sort)),
        ])
        .style(header_style);

        let rows = view.iter().map(|expense| {
            Row::new(vec![
                Cell::from(Line::from(format_amount(expense.amount)).alignment(Alignment::Right)),
                Cell::from(expense.category.clone()),
                Cell::from(expense.date.clone()),
                Cell::from(expense.time.clone()),
            ])
        });

        let title = format!(
            " Expense Tracker | {} | {} ",
            self.controller.filter(),
            plural(view.len(), "expense")
        );

        let table = Table::new(
            rows,
            [
                Constraint::Length(12),
                Constraint::Length(12),
                Constraint::Length(12),
                Constraint::Min(10),
            ],
        )
        .header(header)
        .column_spacing(3)
        .block(Block::default().title(title).borders(Borders::ALL))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

        let mut state = TableState::default().with_selected(self.selected);
        frame.render_stateful_widget(table, area, &mut state);

        if view.is_empty() {
            let inner = Block::default().borders(Borders::ALL).inner(area);
            if inner.height > 2 {
                let message = Paragraph::new(Span::styled(
                    "No expenses to show. Press A to add one.",
                    Style::default().fg(Color::DarkGray),
                ))
                .alignment(Alignment::Center);
                let line = Rect {
                    y: inner.y + 2,
                    height: 1,
                    ..inner
                };
                frame.render_widget(message, line);
            }
        }
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let mut lines = vec![status_line];
        lines.extend(self.footer_instructions());

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Vec<Line<'static>> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let hint = |pairs: &[(&'static str, &'static str)]| {
            let mut spans = Vec::with_capacity(pairs.len() * 2);
            for (key, label) in pairs {
                spans.push(Span::styled(*key, key_style));
                spans.push(Span::raw(format!(" {label}   ")));
            }
            Line::from(spans)
        };

        match &self.mode {
            Mode::Normal => vec![
                hint(&[
                    ("[↑↓]", "Select"),
                    ("[A]", "Add"),
                    ("[D]", "Remove"),
                    ("[F]", "Filter"),
                    ("[X]", "Clear Filter"),
                ]),
                hint(&[
                    ("[1/2/3]", "Sort Amount/Category/Time"),
                    ("[C]", "Export CSV"),
                    ("[P]", "Export PDF"),
                    ("[Q]", "Quit"),
                ]),
            ],
            Mode::AddingExpense(_) | Mode::Filtering(_) => vec![hint(&[
                ("[Tab]", "Switch Field"),
                ("[←→]", "Change Category"),
                ("[Enter]", "Confirm"),
                ("[Esc]", "Cancel"),
            ])],
            Mode::ConfirmRemove(_) => vec![hint(&[("[Y]", "Remove"), ("[N/Esc]", "Keep")])],
            Mode::Exporting(_) => vec![hint(&[("[Enter]", "Save"), ("[Esc]", "Cancel")])],
        }
    }

    fn draw_expense_form(&self, frame: &mut Frame, area: Rect, form: &ExpenseForm) {
        let popup_area = centered_rect(50, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Add Expense").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = form.build_lines();
        lines.push(Line::from(""));
        lines.push(form_hint(form.error.as_deref()));

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        if form.active == ExpenseField::Amount {
            let prefix = "Amount: ".len() as u16;
            frame.set_cursor_position((
                inner.x + prefix + form.amount.chars().count() as u16,
                inner.y,
            ));
        }
    }

    fn draw_filter_form(&self, frame: &mut Frame, area: Rect, form: &FilterForm) {
        let popup_area = centered_rect(50, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Filter Expenses")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = form.build_lines();
        lines.push(Line::from(""));
        lines.push(form_hint(None));

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        if form.active == FilterField::TimePrefix {
            let prefix = "Time (HH:MM): ".len() as u16;
            frame.set_cursor_position((
                inner.x + prefix + form.time_prefix.chars().count() as u16,
                inner.y + 1,
            ));
        }
    }

    fn draw_confirm_remove(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmRemove) {
        let popup_area = centered_rect(50, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Confirm Removal")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let expense = &confirm.expense;
        let lines = vec![
            Line::from(format!(
                "Remove {} ({}) recorded {} {}?",
                format_amount(expense.amount),
                expense.category,
                expense.date,
                expense.time
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_export_prompt(&self, frame: &mut Frame, area: Rect, prompt: &ExportPrompt) {
        let popup_area = centered_rect(70, 30, area);
        frame.render_widget(Clear, popup_area);

        let title = format!("Export {}", prompt.kind.label());
        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            prompt.build_line(),
            Line::from(format!(
                "{} in the current view.",
                plural(self.controller.view().len(), "expense")
            )),
            Line::from(""),
            form_hint(prompt.error.as_deref()),
        ];

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
        frame.render_widget(paragraph, inner);

        let prefix = "File: ".len() as u16;
        let cursor_x = (inner.x + prefix + prompt.path.chars().count() as u16)
            .min(inner.x + inner.width.saturating_sub(1));
        frame.set_cursor_position((cursor_x, inner.y));
    }
}

/// Red error text when present, otherwise the usual key reminder.
fn form_hint(error: Option<&str>) -> Line<'static> {
    match error {
        Some(error) => Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        )),
        None => Line::from(Span::styled(
            "Enter to confirm • Tab to switch • Esc to cancel",
            Style::default().fg(Color::Gray),
        )),
    }
}
