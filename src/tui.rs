use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEventKind,
    },
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};
use std::io::{self, stdout, Stdout};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::client::{SubmitError, Submitter};
use crate::form::{FormController, SubmitStart};
use crate::input::{self, frame_style, label_line, render_error, slot_rows, FieldInput, FIELD_HEIGHT};
use crate::models::{CvFile, Field};
use crate::overlay::{centered, Entrance, StatusOverlay};
use crate::picker::{FilePicker, PickerOutcome};
use crate::selector::{OptionSelector, SelectorEvent, SelectorState};

const TICK: Duration = Duration::from_millis(50);
const FORM_WIDTH: u16 = 72;
const SUBMIT_HEIGHT: u16 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Field(Field),
    Submit,
}

const FOCUS_RING: [Focus; 9] = [
    Focus::Field(Field::FullName),
    Focus::Field(Field::Email),
    Focus::Field(Field::DateOfBirth),
    Focus::Field(Field::WhatsappNumber),
    Focus::Field(Field::Linkedin),
    Focus::Field(Field::JobPosition),
    Focus::Field(Field::Cv),
    Focus::Field(Field::Portfolio),
    Focus::Submit,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scroll {
    /// Scroll just enough to show the focused slot.
    Reveal,
    /// Put the focused slot in the middle of the viewport.
    Center,
}

/// Offset and height of every slot in form coordinates.
fn slot_layout() -> Vec<(Focus, u16, u16)> {
    let mut slots = Vec::with_capacity(FOCUS_RING.len());
    let mut y = 0;
    for focus in FOCUS_RING {
        let height = match focus {
            Focus::Field(_) => FIELD_HEIGHT,
            Focus::Submit => {
                y += 1;
                SUBMIT_HEIGHT
            }
        };
        slots.push((focus, y, height));
        y += height;
    }
    slots
}

fn content_height() -> u16 {
    slot_layout()
        .last()
        .map(|(_, y, h)| y + h)
        .unwrap_or(0)
}

struct AppState {
    form: FormController,
    positions: Vec<String>,
    focus: Focus,
    selector: SelectorState,
    picker: Option<FilePicker>,
    notice: Option<String>,
    scroll: u16,
    scroll_request: Option<Scroll>,
    viewport: Rect,
    slots: Vec<(Focus, Rect)>,
    overlay_area: Rect,
    entrance: Entrance,
    submitter: Arc<dyn Submitter>,
    outcome_tx: Sender<Result<(), SubmitError>>,
    outcome_rx: Receiver<Result<(), SubmitError>>,
    should_quit: bool,
}

impl AppState {
    fn new(positions: Vec<String>, submitter: Arc<dyn Submitter>) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::channel();
        Self {
            form: FormController::new(),
            positions,
            focus: FOCUS_RING[0],
            selector: SelectorState::default(),
            picker: None,
            notice: None,
            scroll: 0,
            scroll_request: None,
            viewport: Rect::default(),
            slots: Vec::new(),
            overlay_area: Rect::default(),
            entrance: Entrance::default(),
            submitter,
            outcome_tx,
            outcome_rx,
            should_quit: false,
        }
    }

    fn focus_on(&mut self, focus: Focus, scroll: Scroll) {
        if focus != Focus::Field(Field::JobPosition) {
            self.selector.close();
        }
        self.focus = focus;
        self.scroll_request = Some(scroll);
    }

    fn focus_next(&mut self) {
        let index = FOCUS_RING.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus_on(FOCUS_RING[(index + 1) % FOCUS_RING.len()], Scroll::Reveal);
    }

    fn focus_prev(&mut self) {
        let index = FOCUS_RING.iter().position(|f| *f == self.focus).unwrap_or(0);
        let prev = (index + FOCUS_RING.len() - 1) % FOCUS_RING.len();
        self.focus_on(FOCUS_RING[prev], Scroll::Reveal);
    }

    fn apply_scroll(&mut self) {
        let height = self.viewport.height;
        let max = content_height().saturating_sub(height);
        if let Some(request) = self.scroll_request.take() {
            if let Some((_, y, h)) = slot_layout().into_iter().find(|(f, _, _)| *f == self.focus) {
                match request {
                    Scroll::Reveal => {
                        if y < self.scroll {
                            self.scroll = y;
                        } else if y + h > self.scroll + height {
                            self.scroll = (y + h).saturating_sub(height);
                        }
                    }
                    Scroll::Center => self.scroll = (y + h / 2).saturating_sub(height / 2),
                }
            }
        }
        self.scroll = self.scroll.min(max);
    }

    fn submit(&mut self) {
        match self.form.begin_submit() {
            SubmitStart::Busy => {}
            SubmitStart::Invalid(field) => self.focus_on(Focus::Field(field), Scroll::Center),
            SubmitStart::Ready(record) => {
                self.entrance.unmount();
                let submitter = Arc::clone(&self.submitter);
                let tx = self.outcome_tx.clone();
                thread::spawn(move || {
                    let outcome = submitter.submit(&record);
                    // The receiver is gone if the form was closed meanwhile.
                    let _ = tx.send(outcome);
                });
            }
        }
    }

    fn drain_outcomes(&mut self, now: Instant) {
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            self.form.finish_submit(outcome);
            self.entrance.mount(now);
        }
    }

    fn dismiss(&mut self) {
        self.form.dismiss_status();
        self.entrance.unmount();
    }

    fn open_picker(&mut self) {
        let start = self
            .form
            .record()
            .cv
            .as_ref()
            .and_then(|cv| cv.path.parent().map(PathBuf::from))
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        match FilePicker::open(&start) {
            Ok(picker) => {
                self.notice = None;
                self.picker = Some(picker);
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot open file picker");
                self.notice = Some(format!("{:#}", e));
            }
        }
    }

    fn on_pick(&mut self, file: Option<CvFile>) {
        self.picker = None;
        self.form.on_file_change(file);
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        if !self.form.status().is_idle() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                self.dismiss();
            }
            return;
        }

        if let Some(picker) = self.picker.as_mut() {
            match picker.on_key(&key) {
                PickerOutcome::Pending => {}
                PickerOutcome::Cancelled => self.on_pick(None),
                PickerOutcome::Picked(file) => self.on_pick(Some(file)),
            }
            return;
        }

        if self.selector.is_open() {
            if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
                self.selector.close();
                self.on_form_key(key);
                return;
            }
            let value = self.form.record().job_position.clone();
            match self.selector.on_key(&self.positions, &value, &key) {
                SelectorEvent::Selected(option) => self.form.on_field_change(Field::JobPosition, option),
                SelectorEvent::Ignored => self.on_form_key(key),
                SelectorEvent::Toggled | SelectorEvent::Dismissed => {}
            }
            return;
        }

        self.on_form_key(key);
    }

    fn on_form_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
            self.submit();
            return;
        }

        match key.code {
            KeyCode::Tab | KeyCode::Down => self.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.focus_prev(),
            KeyCode::Esc => self.should_quit = true,
            _ => match self.focus {
                Focus::Submit => {
                    if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
                        self.submit();
                    }
                }
                Focus::Field(Field::JobPosition) => {
                    let value = self.form.record().job_position.clone();
                    if let SelectorEvent::Selected(option) =
                        self.selector.on_key(&self.positions, &value, &key)
                    {
                        self.form.on_field_change(Field::JobPosition, option);
                    }
                }
                Focus::Field(Field::Cv) => {
                    if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
                        self.open_picker();
                    }
                }
                Focus::Field(field) => {
                    if key.code == KeyCode::Enter {
                        self.focus_next();
                        return;
                    }
                    let (Some(kind), Some(current)) = (field.input_kind(), self.form.record().text(field))
                    else {
                        return;
                    };
                    if let Some(value) = input::edit(kind, current, &key) {
                        self.form.on_field_change(field, value);
                    }
                }
            },
        }
    }

    fn on_click(&mut self, column: u16, row: u16) {
        let pos = Position::new(column, row);

        if !self.form.status().is_idle() {
            if StatusOverlay::close_button(self.overlay_area).contains(pos) {
                self.dismiss();
            }
            return;
        }
        if self.picker.is_some() {
            return;
        }

        let value = self.form.record().job_position.clone();
        match self.selector.on_click(&self.positions, &value, column, row) {
            SelectorEvent::Selected(option) => {
                self.form.on_field_change(Field::JobPosition, option);
                return;
            }
            SelectorEvent::Toggled => {
                self.focus_on(Focus::Field(Field::JobPosition), Scroll::Reveal);
                return;
            }
            SelectorEvent::Ignored | SelectorEvent::Dismissed => {}
        }

        let Some(focus) = self
            .slots
            .iter()
            .find(|(_, area)| area.contains(pos))
            .map(|(focus, _)| *focus)
        else {
            return;
        };
        self.focus_on(focus, Scroll::Reveal);
        match focus {
            Focus::Submit => self.submit(),
            Focus::Field(Field::Cv) => self.open_picker(),
            Focus::Field(_) => {}
        }
    }
}

pub fn run_form(positions: Vec<String>, submitter: Arc<dyn Submitter>) -> Result<()> {
    let mut state = AppState::new(positions, submitter);
    let mut terminal = setup_terminal()?;

    let result = run_loop(&mut terminal, &mut state);
    let restored = restore_terminal();

    if state.form.is_submitting() {
        tracing::info!("closed with a submission in flight");
    }
    result.and(restored)
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let setup = (|| -> io::Result<_> {
        stdout().execute(EnterAlternateScreen)?;
        stdout().execute(EnableMouseCapture)?;
        Terminal::new(CrosstermBackend::new(stdout()))
    })();
    match setup {
        Ok(terminal) => Ok(terminal),
        Err(e) => {
            if let Err(restore) = restore_terminal() {
                tracing::warn!(error = %restore, "terminal restore after failed setup");
            }
            Err(e.into())
        }
    }
}

fn restore_terminal() -> Result<()> {
    run_all(&[
        &disable_raw_mode,
        &|| stdout().execute(DisableMouseCapture).map(|_| ()),
        &|| stdout().execute(LeaveAlternateScreen).map(|_| ()),
    ])
    .context("Failed to restore the terminal")
}

/// Runs every step even when an earlier one fails and returns the first error.
fn run_all(steps: &[&dyn Fn() -> io::Result<()>]) -> io::Result<()> {
    let mut first = Ok(());
    for step in steps {
        let outcome = step();
        if first.is_ok() {
            first = outcome;
        }
    }
    first
}

fn run_loop<B: Backend>(terminal: &mut Terminal<B>, state: &mut AppState) -> Result<()> {
    loop {
        state.drain_outcomes(Instant::now());
        terminal.draw(|frame| draw(frame, state))?;
        if state.should_quit {
            break;
        }

        if !event::poll(TICK)? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => state.on_key(key),
            Event::Mouse(mouse) => {
                if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
                    state.on_click(mouse.column, mouse.row);
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn draw(frame: &mut Frame, state: &mut AppState) {
    let now = Instant::now();
    let screen = frame.area();
    let [header, body, footer] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(2)])
        .areas(screen);

    let title = Paragraph::new(vec![
        Line::styled(
            "Join Our Team",
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        )
        .centered(),
        Line::styled(
            "Fill out the form below to apply for available positions",
            Style::default().fg(Color::Gray),
        )
        .centered(),
    ]);
    frame.render_widget(title, header);

    let width = body.width.min(FORM_WIDTH);
    state.viewport = Rect::new(body.x + (body.width - width) / 2, body.y, width, body.height);
    state.apply_scroll();
    draw_form(frame, state);

    if let Some(picker) = &state.picker {
        frame.render_widget(picker, centered(screen, 70, 20));
    }

    if !state.form.status().is_idle() {
        let overlay = StatusOverlay {
            status: state.form.status(),
            visible: state.entrance.is_visible(now),
        };
        state.overlay_area = overlay.area(screen);
        frame.render_widget(overlay, screen);
    } else {
        state.overlay_area = Rect::default();
    }

    let help = " tab/↑↓:move  enter:edit/select  ctrl-s:submit  click:focus  esc:quit";
    let status_line = match (&state.notice, state.form.is_submitting()) {
        (Some(notice), _) => Line::styled(format!(" {}", notice), Style::default().fg(Color::Red)),
        (None, true) => Line::styled(" Submitting application...", Style::default().fg(Color::Yellow)),
        (None, false) => Line::from(""),
    };
    frame.render_widget(
        Paragraph::new(vec![
            Line::styled(help, Style::default().fg(Color::DarkGray)),
            status_line,
        ]),
        footer,
    );
}

fn draw_form(frame: &mut Frame, state: &mut AppState) {
    let viewport = state.viewport;
    let modal = state.picker.is_some() || !state.form.status().is_idle();
    let record = state.form.record();
    let errors = state.form.errors();
    let mut selector_area = None;
    let mut cursor = None;

    state.slots.clear();
    for (focus, y, height) in slot_layout() {
        if y < state.scroll || y + height > state.scroll + viewport.height {
            continue;
        }
        let area = Rect::new(viewport.x, viewport.y + y - state.scroll, viewport.width, height);
        state.slots.push((focus, area));
        let focused = state.focus == focus;

        match focus {
            Focus::Submit => draw_submit(frame, area, state.form.is_submitting(), focused),
            Focus::Field(Field::JobPosition) => selector_area = Some(area),
            Focus::Field(Field::Cv) => {
                draw_cv(frame, area, record.cv.as_ref(), errors.get(Field::Cv), focused)
            }
            Focus::Field(field) => {
                let (Some(kind), Some(value)) = (field.input_kind(), record.text(field)) else {
                    continue;
                };
                let widget = FieldInput {
                    id: field.id(),
                    label: field.label(),
                    kind,
                    value,
                    required: field.is_required(),
                    placeholder: field.placeholder(),
                    error: errors.get(field),
                    focused,
                };
                if focused && !modal {
                    cursor = Some(widget.cursor(area));
                }
                frame.render_widget(widget, area);
            }
        }
    }

    // The selector goes last so its list covers the fields below it.
    let selector = OptionSelector {
        label: Field::JobPosition.label(),
        options: &state.positions,
        value: &record.job_position,
        required: true,
        placeholder: Field::JobPosition.placeholder().unwrap_or(""),
        error: errors.get(Field::JobPosition),
        focused: state.focus == Focus::Field(Field::JobPosition),
    };
    match selector_area {
        Some(area) => {
            frame.render_stateful_widget(&selector, area, &mut state.selector);
            selector.render_popup(viewport, frame.buffer_mut(), &mut state.selector);
        }
        None => state.selector.hide(),
    }

    if let Some(position) = cursor {
        frame.set_cursor_position(position);
    }
}

fn draw_cv(frame: &mut Frame, area: Rect, cv: Option<&CvFile>, error: Option<&str>, focused: bool) {
    let [label_area, box_area, error_area] = slot_rows(area);
    frame.render_widget(label_line(Field::Cv.label(), true, focused), label_area);

    let content = match cv {
        Some(cv) => Line::from(vec![
            Span::styled(cv.file_name.as_str(), Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(format!("  {}", cv.display_size()), Style::default().fg(Color::DarkGray)),
        ]),
        None => Line::styled(
            Field::Cv.placeholder().unwrap_or(""),
            Style::default().fg(Color::DarkGray),
        ),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(frame_style(error.is_some(), focused))
        .title_bottom(
            Line::styled(" .pdf .doc .docx ", Style::default().fg(Color::DarkGray)).right_aligned(),
        );
    frame.render_widget(Paragraph::new(content).block(block), box_area);
    render_error(error, error_area, frame.buffer_mut());
}

fn draw_submit(frame: &mut Frame, area: Rect, submitting: bool, focused: bool) {
    let (label, style) = if submitting {
        ("Submitting...", Style::default().fg(Color::DarkGray))
    } else if focused {
        (
            "Submit Application",
            Style::default().fg(Color::White).bg(Color::Magenta).add_modifier(Modifier::BOLD),
        )
    } else {
        ("Submit Application", Style::default().fg(Color::Magenta))
    };
    let button = Paragraph::new(Line::from(label).centered())
        .style(style)
        .block(Block::default().borders(Borders::ALL).border_style(style));
    frame.render_widget(button, area);
}
