use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};

use crate::input::{frame_style, label_line, render_error, slot_rows};

/// Open/closed state of the option list plus the areas drawn last frame,
/// used to hit-test clicks.
#[derive(Debug, Default)]
pub struct SelectorState {
    open: bool,
    highlighted: usize,
    /// Carries the list's scroll offset between frames.
    scroll: ListState,
    region: Rect,
    button: Rect,
    list: Rect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorEvent {
    /// The key or click was not for the selector.
    Ignored,
    /// Open state changed or highlight moved; no value change.
    Toggled,
    /// Closed by Esc or a press outside the component; no value change.
    Dismissed,
    /// An option was picked; the list is closed.
    Selected(String),
}

impl SelectorState {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn toggle(&mut self, options: &[String], value: &str) {
        self.open = !self.open;
        if self.open {
            self.highlighted = options.iter().position(|o| o == value).unwrap_or(0);
            self.scroll = ListState::default();
        }
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Forgets the drawn areas, for frames where the selector is scrolled out of view.
    pub fn hide(&mut self) {
        self.open = false;
        self.region = Rect::default();
        self.button = Rect::default();
        self.list = Rect::default();
    }

    fn select(&mut self, options: &[String], index: usize) -> SelectorEvent {
        self.open = false;
        match options.get(index) {
            Some(option) => SelectorEvent::Selected(option.clone()),
            None => SelectorEvent::Toggled,
        }
    }

    /// Mouse press at `(column, row)`. A press outside the component while open closes it.
    pub fn on_click(&mut self, options: &[String], value: &str, column: u16, row: u16) -> SelectorEvent {
        let pos = Position::new(column, row);
        if self.button.contains(pos) {
            self.toggle(options, value);
            return SelectorEvent::Toggled;
        }
        if !self.open {
            return SelectorEvent::Ignored;
        }
        if self.list.contains(pos) {
            // one row of border on top; the list may be scrolled
            let index = self.scroll.offset() + row.saturating_sub(self.list.y + 1) as usize;
            if row > self.list.y && row < self.list.bottom().saturating_sub(1) {
                return self.select(options, index);
            }
            return SelectorEvent::Ignored;
        }
        if self.region.contains(pos) {
            return SelectorEvent::Ignored;
        }
        self.close();
        SelectorEvent::Dismissed
    }

    pub fn on_key(&mut self, options: &[String], value: &str, key: &KeyEvent) -> SelectorEvent {
        if !self.open {
            return match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => {
                    self.toggle(options, value);
                    SelectorEvent::Toggled
                }
                _ => SelectorEvent::Ignored,
            };
        }
        match key.code {
            KeyCode::Esc => {
                self.close();
                SelectorEvent::Dismissed
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.highlighted + 1 < options.len() {
                    self.highlighted += 1;
                }
                SelectorEvent::Toggled
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.highlighted = self.highlighted.saturating_sub(1);
                SelectorEvent::Toggled
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.select(options, self.highlighted),
            KeyCode::Tab | KeyCode::BackTab => {
                self.close();
                SelectorEvent::Ignored
            }
            _ => SelectorEvent::Toggled,
        }
    }
}

pub struct OptionSelector<'a> {
    pub label: &'a str,
    pub options: &'a [String],
    pub value: &'a str,
    pub required: bool,
    pub placeholder: &'a str,
    pub error: Option<&'a str>,
    pub focused: bool,
}

impl OptionSelector<'_> {
    fn list_area(&self, button: Rect, bounds: Rect) -> Rect {
        let wanted = self.options.len() as u16 + 2;
        let below = bounds.bottom().saturating_sub(button.bottom());
        let height = wanted.min(below.max(3));
        if below >= height {
            Rect::new(button.x, button.bottom(), button.width, height)
        } else {
            let above = button.y.saturating_sub(bounds.y);
            let height = wanted.min(above);
            Rect::new(button.x, button.y.saturating_sub(height), button.width, height)
        }
    }

    /// Draws the option list over whatever was rendered below the button.
    /// Called after the rest of the form so the popup stays on top.
    pub fn render_popup(&self, bounds: Rect, buf: &mut Buffer, state: &mut SelectorState) {
        if !state.open || state.button.area() == 0 {
            return;
        }
        let area = self.list_area(state.button, bounds);
        state.list = area;

        let items: Vec<ListItem> = self
            .options
            .iter()
            .map(|option| {
                let style = if option == self.value {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(Line::styled(option.as_str(), style))
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Magenta)),
            )
            .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
            .highlight_symbol("> ");

        state.scroll.select(Some(state.highlighted));

        Clear.render(area, buf);
        StatefulWidget::render(list, area, buf, &mut state.scroll);
    }
}

impl StatefulWidget for &OptionSelector<'_> {
    type State = SelectorState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut SelectorState) {
        let [label_area, button_area, error_area] = slot_rows(area);
        state.region = area;
        state.button = button_area;
        if !state.open {
            state.list = Rect::default();
        }

        label_line(self.label, self.required, self.focused).render(label_area, buf);

        let arrow = if state.open { "▲" } else { "▼" };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(frame_style(self.error.is_some(), self.focused))
            .title_top(Line::from(format!(" {} ", arrow)).right_aligned());

        let content = if self.value.is_empty() {
            Span::styled(self.placeholder, Style::default().fg(Color::DarkGray))
        } else {
            Span::raw(self.value)
        };
        Paragraph::new(Line::from(content))
            .block(block)
            .render(button_area, buf);

        render_error(self.error, error_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::tests::buffer_lines;
    use crate::input::FIELD_HEIGHT;
    use crossterm::event::KeyModifiers;

    fn options() -> Vec<String> {
        vec!["Software Engineer".to_string(), "Data Analyst".to_string(), "UI/UX Designer".to_string()]
    }

    /// Renders the selector at rows 0..5 and the popup below it within a 40x20 screen.
    fn render(options: &[String], value: &str, state: &mut SelectorState) -> Vec<String> {
        let screen = Rect::new(0, 0, 40, 20);
        let mut buf = Buffer::empty(screen);
        let selector = OptionSelector {
            label: "Applying for Position",
            options,
            value,
            required: true,
            placeholder: "Select a position",
            error: None,
            focused: true,
        };
        (&selector).render(Rect::new(0, 0, 40, FIELD_HEIGHT), &mut buf, state);
        selector.render_popup(screen, &mut buf, state);
        buffer_lines(&buf)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_starts_closed_and_shows_placeholder() {
        let mut state = SelectorState::default();
        let lines = render(&options(), "", &mut state);
        assert!(!state.is_open());
        assert!(lines[2].contains("Select a position"));
        assert!(!lines.iter().any(|l| l.contains("Data Analyst")));
    }

    #[test]
    fn test_click_button_toggles() {
        let opts = options();
        let mut state = SelectorState::default();
        render(&opts, "", &mut state);

        assert_eq!(state.on_click(&opts, "", 5, 2), SelectorEvent::Toggled);
        assert!(state.is_open());
        let lines = render(&opts, "", &mut state);
        assert!(lines.iter().any(|l| l.contains("Data Analyst")));

        assert_eq!(state.on_click(&opts, "", 5, 2), SelectorEvent::Toggled);
        assert!(!state.is_open());
    }

    #[test]
    fn test_click_option_selects_and_closes() {
        let opts = options();
        let mut state = SelectorState::default();
        render(&opts, "", &mut state);
        state.on_click(&opts, "", 5, 2);
        let lines = render(&opts, "", &mut state);

        // button occupies rows 1..4, list border at row 4, options from row 5
        assert!(lines[6].contains("Data Analyst"));
        assert_eq!(
            state.on_click(&opts, "", 5, 6),
            SelectorEvent::Selected("Data Analyst".to_string())
        );
        assert!(!state.is_open());
    }

    #[test]
    fn test_click_in_scrolled_list_picks_the_drawn_option() {
        let opts: Vec<String> = (1..=6).map(|i| format!("A{}", i)).collect();
        let screen = Rect::new(0, 0, 40, 8);
        let selector = OptionSelector {
            label: "Applying for Position",
            options: &opts,
            value: "A4",
            required: true,
            placeholder: "Select a position",
            error: None,
            focused: true,
        };
        let mut state = SelectorState::default();
        let draw = |state: &mut SelectorState| {
            let mut buf = Buffer::empty(screen);
            (&selector).render(Rect::new(0, 0, 40, FIELD_HEIGHT), &mut buf, state);
            selector.render_popup(screen, &mut buf, state);
            buffer_lines(&buf)
        };
        draw(&mut state);
        state.on_click(&opts, "A4", 5, 2);
        let lines = draw(&mut state);

        // only two option rows fit; the list scrolls to keep A4 in view
        assert!(lines[5].contains("A3"));
        assert!(lines[6].contains("A4"));
        assert_eq!(state.on_click(&opts, "A4", 5, 6), SelectorEvent::Selected("A4".to_string()));

        state.on_click(&opts, "A4", 5, 2);
        draw(&mut state);
        assert_eq!(state.on_click(&opts, "A4", 5, 5), SelectorEvent::Selected("A3".to_string()));
    }

    #[test]
    fn test_click_outside_closes_without_selecting() {
        let opts = options();
        let mut state = SelectorState::default();
        render(&opts, "Data Analyst", &mut state);
        state.on_click(&opts, "Data Analyst", 5, 2);
        render(&opts, "Data Analyst", &mut state);

        assert_eq!(state.on_click(&opts, "Data Analyst", 5, 18), SelectorEvent::Dismissed);
        assert!(!state.is_open());
    }

    #[test]
    fn test_click_outside_while_closed_is_ignored() {
        let opts = options();
        let mut state = SelectorState::default();
        render(&opts, "", &mut state);
        assert_eq!(state.on_click(&opts, "", 5, 18), SelectorEvent::Ignored);
        assert!(!state.is_open());
    }

    #[test]
    fn test_hide_drops_hit_areas() {
        let opts = options();
        let mut state = SelectorState::default();
        render(&opts, "", &mut state);
        state.on_click(&opts, "", 5, 2);
        state.hide();
        assert!(!state.is_open());
        assert_eq!(state.on_click(&opts, "", 5, 2), SelectorEvent::Ignored);
    }

    #[test]
    fn test_keyboard_navigation() {
        let opts = options();
        let mut state = SelectorState::default();
        assert_eq!(state.on_key(&opts, "", &key(KeyCode::Char('x'))), SelectorEvent::Ignored);
        assert_eq!(state.on_key(&opts, "", &key(KeyCode::Enter)), SelectorEvent::Toggled);
        assert!(state.is_open());

        state.on_key(&opts, "", &key(KeyCode::Down));
        state.on_key(&opts, "", &key(KeyCode::Down));
        state.on_key(&opts, "", &key(KeyCode::Down));
        assert_eq!(
            state.on_key(&opts, "", &key(KeyCode::Enter)),
            SelectorEvent::Selected("UI/UX Designer".to_string())
        );
        assert!(!state.is_open());
    }

    #[test]
    fn test_escape_closes_and_reopen_highlights_current_value() {
        let opts = options();
        let mut state = SelectorState::default();
        state.on_key(&opts, "Data Analyst", &key(KeyCode::Enter));
        assert_eq!(state.on_key(&opts, "Data Analyst", &key(KeyCode::Esc)), SelectorEvent::Dismissed);
        assert!(!state.is_open());

        state.on_key(&opts, "Data Analyst", &key(KeyCode::Char(' ')));
        assert_eq!(
            state.on_key(&opts, "Data Analyst", &key(KeyCode::Enter)),
            SelectorEvent::Selected("Data Analyst".to_string())
        );
    }
}
