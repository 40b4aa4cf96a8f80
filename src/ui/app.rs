use std::mem;

use anyhow::Result;
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};
use ratatui::Frame;

use crate::db::{
    delete_student, insert_student, list_students, search_students, update_student, Store,
    StoreError,
};
use crate::models::Student;

use super::forms::{ConfirmStudentDelete, StudentField, StudentForm};
use super::helpers::{centered_rect, surface_error};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Rows jumped by PageUp/PageDown in the record table.
const PAGE_JUMP: isize = 5;

/// Fine-grained input modes layered over the single screen. Keeping this
/// explicit makes it easy to reason about which widget owns the keyboard and
/// what Enter/Esc should do.
enum Mode {
    /// Table navigation plus the action keys.
    Browse,
    /// Keystrokes land in the detail form.
    EditingForm,
    /// Collecting a search query in the inline popup.
    Searching(SearchState),
    /// Waiting on the delete confirmation.
    ConfirmDelete(ConfirmStudentDelete),
}

/// State for an active inline search.
struct SearchState {
    query: String,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer: confirmations, validation warnings,
/// and connection/store failures.
enum StatusKind {
    Info,
    Warn,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Warn => Style::default().fg(Color::Yellow),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI. The selection context
/// (row index plus the selected record's id) and the form contents live here
/// explicitly rather than as ambient globals, so every handler works off the
/// same view-model.
pub struct App {
    store: Store,
    students: Vec<Student>,
    selected: Option<usize>,
    selected_id: Option<String>,
    form: StudentForm,
    search_query: Option<String>,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    /// Hydrate the initial state. With a live store the first listing runs
    /// here; without one the failure is recorded once and every later data
    /// action re-reports it.
    pub fn new(store: Store) -> Self {
        let mut app = Self {
            store,
            students: Vec::new(),
            selected: None,
            selected_id: None,
            form: StudentForm::default(),
            search_query: None,
            mode: Mode::Browse,
            status: None,
        };

        if app.store.is_connected() {
            app.reload(None);
        } else {
            let failure = app.store.status_line();
            app.set_status(failure, StatusKind::Error);
        }

        app
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Browse);

        self.mode = match mode {
            Mode::Browse => self.handle_browse_key(code, &mut exit)?,
            Mode::EditingForm => self.handle_form_key(code)?,
            Mode::Searching(state) => self.handle_search_key(code, state)?,
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm)?,
        };

        Ok(exit)
    }

    fn handle_browse_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') => {
                *exit = true;
            }
            KeyCode::Esc | KeyCode::Char('c') => {
                self.clear_form();
                self.clear_status();
            }
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-PAGE_JUMP),
            KeyCode::PageDown => self.move_selection(PAGE_JUMP),
            KeyCode::Home => self.select_first(),
            KeyCode::End => self.select_last(),
            KeyCode::Enter | KeyCode::Char('e') => {
                self.clear_status();
                return Ok(Mode::EditingForm);
            }
            KeyCode::Char('+') => {
                // Compose a brand new record: drop the selection so Enter in
                // the form inserts instead of updating.
                self.clear_form();
                self.clear_status();
                return Ok(Mode::EditingForm);
            }
            KeyCode::Char('a') => {
                self.add_record();
            }
            KeyCode::Char('u') => {
                self.update_record();
            }
            KeyCode::Char('d') | KeyCode::Char('-') => {
                if let Some(confirm) = self.request_delete() {
                    self.clear_status();
                    return Ok(Mode::ConfirmDelete(confirm));
                }
            }
            KeyCode::Char('r') => {
                // Refresh is the empty search: same rows, same selection
                // preservation rules.
                self.run_search("");
            }
            KeyCode::Char('f') | KeyCode::Char('/') => {
                self.clear_status();
                return Ok(Mode::Searching(SearchState {
                    query: String::new(),
                }));
            }
            _ => {}
        }
        Ok(Mode::Browse)
    }

    fn handle_form_key(&mut self, code: KeyCode) -> Result<Mode> {
        match code {
            KeyCode::Esc => Ok(Mode::Browse),
            KeyCode::Tab => {
                self.form.toggle_field();
                Ok(Mode::EditingForm)
            }
            KeyCode::BackTab => {
                self.form.previous_field();
                Ok(Mode::EditingForm)
            }
            KeyCode::Backspace => {
                self.form.backspace();
                Ok(Mode::EditingForm)
            }
            KeyCode::Enter => {
                let saved = if self.selected_id.is_some() {
                    self.update_record()
                } else {
                    self.add_record()
                };
                if saved {
                    Ok(Mode::Browse)
                } else {
                    Ok(Mode::EditingForm)
                }
            }
            KeyCode::Char(ch) => {
                if self.form.push_char(ch) {
                    self.form.error = None;
                }
                Ok(Mode::EditingForm)
            }
            _ => Ok(Mode::EditingForm),
        }
    }

    fn handle_search_key(&mut self, code: KeyCode, mut state: SearchState) -> Result<Mode> {
        match code {
            KeyCode::Esc => Ok(Mode::Browse),
            KeyCode::Enter => {
                self.run_search(&state.query);
                Ok(Mode::Browse)
            }
            KeyCode::Backspace => {
                state.query.pop();
                Ok(Mode::Searching(state))
            }
            KeyCode::Char(ch) if !ch.is_control() => {
                state.query.push(ch);
                Ok(Mode::Searching(state))
            }
            _ => Ok(Mode::Searching(state)),
        }
    }

    fn handle_confirm_delete(
        &mut self,
        code: KeyCode,
        confirm: ConfirmStudentDelete,
    ) -> Result<Mode> {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                self.perform_delete(&confirm);
                Ok(Mode::Browse)
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Browse)
            }
            _ => Ok(Mode::ConfirmDelete(confirm)),
        }
    }

    // === record actions ===

    /// Validate and insert. Returns whether the write went through; on any
    /// failure the form contents stay intact for another attempt.
    fn add_record(&mut self) -> bool {
        let fields = match self.form.parse_inputs() {
            Ok(fields) => fields,
            Err(err) => {
                let message = surface_error(&err);
                self.form.error = Some(message.clone());
                self.set_status(message, StatusKind::Warn);
                return false;
            }
        };

        match insert_student(&self.store, &fields) {
            Ok(()) => {
                self.reload(None);
                self.set_status("Record added.", StatusKind::Info);
                true
            }
            Err(err) => {
                self.report_store_error(&err);
                false
            }
        }
    }

    /// Validate and update the selected record, keeping the selection on the
    /// same id after the reload when the row still exists.
    fn update_record(&mut self) -> bool {
        let Some(id) = self.selected_id.clone() else {
            self.set_status("Select a record to update.", StatusKind::Warn);
            return false;
        };

        let fields = match self.form.parse_inputs() {
            Ok(fields) => fields,
            Err(err) => {
                let message = surface_error(&err);
                self.form.error = Some(message.clone());
                self.set_status(message, StatusKind::Warn);
                return false;
            }
        };

        match update_student(&self.store, &id, &fields) {
            Ok(matched) => {
                self.reload(Some(id));
                let message = if matched {
                    "Record updated."
                } else {
                    "Record no longer exists; list refreshed."
                };
                self.set_status(message, StatusKind::Info);
                true
            }
            Err(err) => {
                self.report_store_error(&err);
                false
            }
        }
    }

    fn request_delete(&mut self) -> Option<ConfirmStudentDelete> {
        match (self.selected, self.selected_id.clone()) {
            (Some(idx), Some(id)) => Some(ConfirmStudentDelete::new(id, &self.students[idx])),
            _ => {
                self.set_status("Select a record to delete.", StatusKind::Warn);
                None
            }
        }
    }

    fn perform_delete(&mut self, confirm: &ConfirmStudentDelete) {
        match delete_student(&self.store, &confirm.id) {
            Ok(deleted) => {
                self.reload(None);
                let message = if deleted {
                    "Record deleted."
                } else {
                    "Record no longer exists; list refreshed."
                };
                self.set_status(message, StatusKind::Info);
            }
            Err(err) => self.report_store_error(&err),
        }
    }

    /// Replace the full row set with an unfiltered listing, then restore the
    /// selection context. `focus` names the id to keep selected; `None`
    /// clears both the selection and the form.
    fn reload(&mut self, focus: Option<String>) {
        match list_students(&self.store) {
            Ok(students) => {
                self.students = students;
                self.search_query = None;
                self.restore_selection(focus);
            }
            Err(err) => self.report_store_error(&err),
        }
    }

    /// Execute a search (or the full listing, for a blank query) and replace
    /// the rows. The form and the selected id survive untouched; only the
    /// row index is re-derived, and it goes away when the selected record is
    /// not among the matches.
    fn run_search(&mut self, query: &str) {
        match search_students(&self.store, query) {
            Ok(students) => {
                self.students = students;
                let trimmed = query.trim();
                self.search_query = if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                };

                let focus = self.selected_id.clone();
                self.selected = focus.as_deref().and_then(|id| self.position_of(id));

                let message = match &self.search_query {
                    Some(q) => format!("{} record(s) match \"{q}\".", self.students.len()),
                    None => format!("Showing all {} record(s).", self.students.len()),
                };
                self.set_status(message, StatusKind::Info);
            }
            Err(err) => self.report_store_error(&err),
        }
    }

    fn restore_selection(&mut self, focus: Option<String>) {
        if let Some(id) = focus {
            if let Some(idx) = self.position_of(&id) {
                self.selected = Some(idx);
                self.sync_form_with_selection();
                return;
            }
        }
        self.clear_form();
    }

    fn position_of(&self, id: &str) -> Option<usize> {
        self.students
            .iter()
            .position(|student| student.id_hex().as_deref() == Some(id))
    }

    /// Copy the row under the selection into the detail form and record its
    /// id as the selected id.
    fn sync_form_with_selection(&mut self) {
        if let Some(student) = self.selected.and_then(|idx| self.students.get(idx)).cloned() {
            self.selected_id = student.id_hex();
            self.form = StudentForm::from_student(&student);
        }
    }

    fn clear_form(&mut self) {
        self.selected = None;
        self.selected_id = None;
        self.form.clear();
    }

    fn move_selection(&mut self, offset: isize) {
        if self.students.is_empty() {
            return;
        }
        let len = self.students.len() as isize;
        let next = match self.selected {
            Some(current) => (current as isize + offset).clamp(0, len - 1),
            None if offset >= 0 => 0,
            None => len - 1,
        };
        self.selected = Some(next as usize);
        self.sync_form_with_selection();
    }

    fn select_first(&mut self) {
        if !self.students.is_empty() {
            self.selected = Some(0);
            self.sync_form_with_selection();
        }
    }

    fn select_last(&mut self) {
        if !self.students.is_empty() {
            self.selected = Some(self.students.len() - 1);
            self.sync_form_with_selection();
        }
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

    fn report_store_error(&mut self, err: &StoreError) {
        self.set_status(err.to_string(), StatusKind::Error);
    }

    // === rendering ===

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(6),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        self.draw_header(frame, chunks[0]);
        self.draw_form_panel(frame, chunks[1]);
        self.draw_table(frame, chunks[2]);
        self.draw_footer(frame, chunks[3]);

        match &self.mode {
            Mode::Searching(state) => self.draw_search_bar(frame, area, state),
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            _ => {}
        }
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let connection_style = if self.store.is_connected() {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::Red)
        };
        let connection_line = Line::from(Span::styled(self.store.status_line(), connection_style));

        let filter_line = match &self.search_query {
            Some(query) => Line::from(Span::styled(
                format!("Filter: \"{query}\" — press r to show all"),
                Style::default().fg(Color::Gray),
            )),
            None => Line::from(""),
        };

        let paragraph = Paragraph::new(vec![connection_line, filter_line]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn draw_form_panel(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().title("Student Details").borders(Borders::ALL);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let mut lines = vec![
            self.form.build_line("Name", StudentField::Name),
            self.form.build_line("Email", StudentField::Email),
            self.form.build_line("Age", StudentField::Age),
        ];

        if let Some(error) = &self.form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else if matches!(self.mode, Mode::EditingForm) {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch field • Esc when done",
                Style::default().fg(Color::Gray),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Press e to edit the form, + to compose a new record",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        if matches!(self.mode, Mode::EditingForm) {
            let (prefix, row) = match self.form.active {
                StudentField::Name => ("Name: ", 0),
                StudentField::Email => ("Email: ", 1),
                StudentField::Age => ("Age: ", 2),
            };
            let cursor_x =
                inner.x + prefix.len() as u16 + self.form.value_len(self.form.active) as u16;
            frame.set_cursor_position((cursor_x, inner.y + row));
        }
    }

    fn draw_table(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(format!("Records ({})", self.students.len()))
            .borders(Borders::ALL);

        if self.students.is_empty() {
            let message =
                Paragraph::new("No records to show. Press + to add one, r to refresh.")
                    .block(block)
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true });
            frame.render_widget(message, area);
            return;
        }

        let header = Row::new(["ID", "Name", "Email", "Age"])
            .style(Style::default().add_modifier(Modifier::BOLD));
        let rows: Vec<Row> = self
            .students
            .iter()
            .map(|student| {
                Row::new(vec![
                    Cell::from(student.id_hex().unwrap_or_default()),
                    Cell::from(student.name.clone()),
                    Cell::from(student.email.clone()),
                    Cell::from(student.age.to_string()),
                ])
            })
            .collect();

        let widths = [
            Constraint::Length(26),
            Constraint::Min(16),
            Constraint::Min(20),
            Constraint::Length(6),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .row_highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            .highlight_symbol("▶ ");

        let mut table_state = TableState::default();
        table_state.select(self.selected);
        frame.render_stateful_widget(table, area, &mut table_state);
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

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        match &self.mode {
            Mode::Browse => Line::from(vec![
                Span::styled("[↑↓]", key_style),
                Span::raw(" Select   "),
                Span::styled("[a]", key_style),
                Span::raw(" Add   "),
                Span::styled("[u]", key_style),
                Span::raw(" Update   "),
                Span::styled("[d]", key_style),
                Span::raw(" Delete   "),
                Span::styled("[c]", key_style),
                Span::raw(" Clear   "),
                Span::styled("[f]", key_style),
                Span::raw(" Search   "),
                Span::styled("[r]", key_style),
                Span::raw(" Show all   "),
                Span::styled("[q]", key_style),
                Span::raw(" Quit"),
            ]),
            Mode::EditingForm => Line::from(vec![
                Span::styled("[Tab]", key_style),
                Span::raw(" Switch field   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Save   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Done"),
            ]),
            Mode::Searching(_) => Line::from(vec![
                Span::styled("[Enter]", key_style),
                Span::raw(" Run search   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Cancel"),
            ]),
            Mode::ConfirmDelete(_) => Line::from(vec![
                Span::styled("[y]", key_style),
                Span::raw(" Delete   "),
                Span::styled("[n]", key_style),
                Span::raw(" Keep"),
            ]),
        }
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, state: &SearchState) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title("Search (name/email)");
        let paragraph = Paragraph::new(Span::raw(format!("Search: {}", state.query)))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + "Search: ".len() as u16 + state.query.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmStudentDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Confirm Deletion")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!("Delete {}?", confirm.summary)),
            Line::from("This permanently removes the record."),
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
}
