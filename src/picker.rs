use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};
use std::path::{Path, PathBuf};

use crate::models::CvFile;

/// Extensions suggested by the picker. Other files can still be chosen.
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["pdf", "doc", "docx"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Parent,
    Dir(String),
    File(String),
}

#[derive(Debug, PartialEq, Eq)]
pub enum PickerOutcome {
    /// Still browsing.
    Pending,
    /// Closed without a file.
    Cancelled,
    Picked(CvFile),
}

pub fn is_accepted(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| ACCEPTED_EXTENSIONS.iter().any(|a| a.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// Directory browser standing in for a native file dialog.
#[derive(Debug)]
pub struct FilePicker {
    dir: PathBuf,
    entries: Vec<Entry>,
    selected: usize,
    show_all: bool,
    typed: Option<String>,
    note: Option<String>,
}

impl FilePicker {
    pub fn open(dir: &Path) -> Result<Self> {
        let mut picker = Self {
            dir: dir.to_path_buf(),
            entries: Vec::new(),
            selected: 0,
            show_all: false,
            typed: None,
            note: None,
        };
        picker.refresh()?;
        Ok(picker)
    }

    #[cfg(test)]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[cfg(test)]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn refresh(&mut self) -> Result<()> {
        let mut dirs = Vec::new();
        let mut files = Vec::new();
        let read = std::fs::read_dir(&self.dir)
            .with_context(|| format!("Cannot list {}", self.dir.display()))?;
        for entry in read.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            let path = entry.path();
            if path.is_dir() {
                dirs.push(name);
            } else if self.show_all || is_accepted(&path) {
                files.push(name);
            }
        }
        dirs.sort_by_key(|d| d.to_lowercase());
        files.sort_by_key(|f| f.to_lowercase());

        self.entries.clear();
        if self.dir.parent().is_some() {
            self.entries.push(Entry::Parent);
        }
        self.entries.extend(dirs.into_iter().map(Entry::Dir));
        self.entries.extend(files.into_iter().map(Entry::File));
        self.selected = self.selected.min(self.entries.len().saturating_sub(1));
        Ok(())
    }

    fn change_dir(&mut self, dir: PathBuf) {
        let previous = std::mem::replace(&mut self.dir, dir);
        self.selected = 0;
        if let Err(e) = self.refresh() {
            self.note = Some(format!("{:#}", e));
            self.dir = previous;
            let _ = self.refresh();
        }
    }

    pub fn toggle_filter(&mut self) {
        self.show_all = !self.show_all;
        if let Err(e) = self.refresh() {
            self.note = Some(format!("{:#}", e));
        }
    }

    fn pick(&mut self, path: &Path) -> PickerOutcome {
        match CvFile::from_path(path) {
            Ok(file) => PickerOutcome::Picked(file),
            Err(e) => {
                self.note = Some(format!("{:#}", e));
                PickerOutcome::Pending
            }
        }
    }

    /// Enter on the highlighted entry.
    pub fn activate(&mut self) -> PickerOutcome {
        match self.entries.get(self.selected).cloned() {
            Some(Entry::Parent) => {
                if let Some(parent) = self.dir.parent().map(Path::to_path_buf) {
                    self.change_dir(parent);
                }
                PickerOutcome::Pending
            }
            Some(Entry::Dir(name)) => {
                let dir = self.dir.join(name);
                self.change_dir(dir);
                PickerOutcome::Pending
            }
            Some(Entry::File(name)) => {
                let path = self.dir.join(name);
                self.pick(&path)
            }
            None => PickerOutcome::Pending,
        }
    }

    pub fn on_key(&mut self, key: &KeyEvent) -> PickerOutcome {
        self.note = None;
        if let Some(typed) = self.typed.as_mut() {
            match key.code {
                KeyCode::Esc => self.typed = None,
                KeyCode::Backspace => {
                    typed.pop();
                }
                KeyCode::Char(c) => typed.push(c),
                KeyCode::Enter => {
                    let raw = typed.trim().to_string();
                    let path = self.dir.join(raw);
                    if path.is_dir() {
                        self.typed = None;
                        self.change_dir(path);
                    } else {
                        let outcome = self.pick(&path);
                        if matches!(outcome, PickerOutcome::Picked(_)) {
                            self.typed = None;
                        }
                        return outcome;
                    }
                }
                _ => {}
            }
            return PickerOutcome::Pending;
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return PickerOutcome::Cancelled,
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.entries.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
            KeyCode::Backspace | KeyCode::Left | KeyCode::Char('h') => {
                if let Some(parent) = self.dir.parent().map(Path::to_path_buf) {
                    self.change_dir(parent);
                }
            }
            KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => return self.activate(),
            KeyCode::Char('a') => self.toggle_filter(),
            KeyCode::Char('/') => self.typed = Some(String::new()),
            _ => {}
        }
        PickerOutcome::Pending
    }
}

impl Widget for &FilePicker {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let filter = if self.show_all {
            "all files"
        } else {
            ".pdf, .doc, .docx"
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta))
            .title(format!(" Choose CV ({}) ", filter))
            .title_bottom(
                Line::from(" enter:open  h:up  a:all files  /:type path  esc:cancel ")
                    .style(Style::default().fg(Color::DarkGray)),
            );
        let inner = block.inner(area);
        block.render(area, buf);

        let [path_area, list_area, note_area] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0), Constraint::Length(1)])
            .areas(inner);

        let header = match &self.typed {
            Some(typed) => Line::from(vec![
                Span::styled("path: ", Style::default().fg(Color::Cyan)),
                Span::raw(format!("{}_", typed)),
            ]),
            None => Line::styled(
                self.dir.display().to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        };
        Paragraph::new(header).render(path_area, buf);

        let items: Vec<ListItem> = self
            .entries
            .iter()
            .map(|entry| match entry {
                Entry::Parent => ListItem::new(".."),
                Entry::Dir(name) => ListItem::new(Line::styled(
                    format!("{}/", name),
                    Style::default().fg(Color::Cyan),
                )),
                Entry::File(name) => ListItem::new(name.as_str()),
            })
            .collect();
        let mut list_state = ListState::default();
        list_state.select(Some(self.selected));
        StatefulWidget::render(
            List::new(items)
                .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
                .highlight_symbol("> "),
            list_area,
            buf,
            &mut list_state,
        );

        if let Some(note) = &self.note {
            Paragraph::new(note.as_str())
                .style(Style::default().fg(Color::Red))
                .render(note_area, buf);
        }
    }
}
