use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

use crate::models::InputKind;

/// Rows taken by a labeled field: label, boxed value, error line.
pub const FIELD_HEIGHT: u16 = 5;

const DATE_LEN: usize = 10;

/// Applies a key press to a field value. Returns the new value when the key edits it.
pub fn edit(kind: InputKind, value: &str, key: &KeyEvent) -> Option<String> {
    if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
        return None;
    }
    match key.code {
        KeyCode::Backspace => {
            let mut next = value.to_string();
            next.pop()?;
            Some(next)
        }
        KeyCode::Char(c) if accepts(kind, value, c) => {
            let mut next = value.to_string();
            next.push(c);
            Some(next)
        }
        _ => None,
    }
}

fn accepts(kind: InputKind, value: &str, c: char) -> bool {
    if c.is_control() {
        return false;
    }
    match kind {
        InputKind::Date => (c.is_ascii_digit() || c == '-') && value.chars().count() < DATE_LEN,
        InputKind::Tel => c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')'),
        InputKind::Email | InputKind::Url => !c.is_whitespace(),
        InputKind::Text => true,
    }
}

/// Label line with a required marker.
pub fn label_line(label: &str, required: bool, focused: bool) -> Line<'_> {
    let style = if focused {
        Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    let mut spans = vec![Span::styled(label, style)];
    if required {
        spans.push(Span::styled(" *", Style::default().fg(Color::Red)));
    }
    Line::from(spans)
}

/// Border style shared by the boxed controls.
pub fn frame_style(has_error: bool, focused: bool) -> Style {
    if has_error {
        Style::default().fg(Color::Red)
    } else if focused {
        Style::default().fg(Color::Magenta)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

/// Renders the error line; the row is always reserved.
pub fn render_error(error: Option<&str>, area: Rect, buf: &mut Buffer) {
    Paragraph::new(error.unwrap_or(""))
        .style(Style::default().fg(Color::Red))
        .render(area, buf);
}

/// Splits a field slot into label, box and error rows.
pub fn slot_rows(area: Rect) -> [Rect; 3] {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(3), Constraint::Length(1)])
        .areas(area)
}

pub struct FieldInput<'a> {
    pub id: &'a str,
    pub label: &'a str,
    pub kind: InputKind,
    pub value: &'a str,
    pub required: bool,
    pub placeholder: Option<&'a str>,
    pub error: Option<&'a str>,
    pub focused: bool,
}

impl FieldInput<'_> {
    /// Where the terminal cursor goes when this field has focus.
    pub fn cursor(&self, area: Rect) -> Position {
        let [_, input, _] = slot_rows(area);
        let width = self.value.chars().count() as u16;
        let max_x = input.right().saturating_sub(2);
        Position::new((input.x + 1 + width).min(max_x), input.y + 1)
    }
}

impl Widget for FieldInput<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [label_area, input_area, error_area] = slot_rows(area);

        label_line(self.label, self.required, self.focused).render(label_area, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(frame_style(self.error.is_some(), self.focused))
            .title_bottom(Line::from(Span::styled(
                format!(" {} ", self.id),
                Style::default().fg(Color::DarkGray),
            )).right_aligned());

        let content = if self.value.is_empty() {
            Span::styled(
                self.placeholder.unwrap_or(""),
                Style::default().fg(Color::DarkGray),
            )
        } else if self.error.is_some() {
            Span::styled(self.value, Style::default().fg(Color::LightRed))
        } else {
            Span::raw(self.value)
        };

        // Keep the tail visible when the value is wider than the box.
        let inner_width = input_area.width.saturating_sub(2) as usize;
        let chars = self.value.chars().count();
        let scroll = if self.focused && chars >= inner_width {
            (chars + 1 - inner_width) as u16
        } else {
            0
        };

        Paragraph::new(Line::from(content))
            .block(block)
            .scroll((0, scroll))
            .render(input_area, buf);

        render_error(self.error, error_area, buf);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn buffer_lines(buf: &Buffer) -> Vec<String> {
        let width = buf.area.width as usize;
        buf.content
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn render(input: FieldInput) -> Vec<String> {
        let area = Rect::new(0, 0, 40, FIELD_HEIGHT);
        let mut buf = Buffer::empty(area);
        input.render(area, &mut buf);
        buffer_lines(&buf)
    }

    fn field<'a>(value: &'a str, error: Option<&'a str>) -> FieldInput<'a> {
        FieldInput {
            id: "fullName",
            label: "Full Name",
            kind: InputKind::Text,
            value,
            required: true,
            placeholder: Some("Enter your full name"),
            error,
            focused: false,
        }
    }

    #[test]
    fn test_edit_appends_and_deletes() {
        assert_eq!(edit(InputKind::Text, "An", &key(KeyCode::Char('a'))), Some("Ana".to_string()));
        assert_eq!(edit(InputKind::Text, "Ana", &key(KeyCode::Backspace)), Some("An".to_string()));
        assert_eq!(edit(InputKind::Text, "", &key(KeyCode::Backspace)), None);
        assert_eq!(edit(InputKind::Text, "Ana", &key(KeyCode::Left)), None);
        let ctrl = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL);
        assert_eq!(edit(InputKind::Text, "Ana", &ctrl), None);
    }

    #[test]
    fn test_edit_filters_by_kind() {
        assert_eq!(edit(InputKind::Date, "1995", &key(KeyCode::Char('x'))), None);
        assert_eq!(edit(InputKind::Date, "1995", &key(KeyCode::Char('-'))), Some("1995-".to_string()));
        assert_eq!(edit(InputKind::Date, "1995-04-12", &key(KeyCode::Char('1'))), None);
        assert_eq!(edit(InputKind::Tel, "+62", &key(KeyCode::Char(' '))), Some("+62 ".to_string()));
        assert_eq!(edit(InputKind::Tel, "+62", &key(KeyCode::Char('a'))), None);
        assert_eq!(edit(InputKind::Email, "a", &key(KeyCode::Char(' '))), None);
        assert_eq!(edit(InputKind::Text, "Ana", &key(KeyCode::Char(' '))), Some("Ana ".to_string()));
    }

    #[test]
    fn test_render_shows_label_placeholder_and_reserved_error_row() {
        let lines = render(field("", None));
        assert!(lines[0].starts_with("Full Name *"));
        assert!(lines[2].contains("Enter your full name"));
        assert_eq!(lines[4].trim(), "");
    }

    #[test]
    fn test_render_shows_value_and_error() {
        let lines = render(field("Ana", Some("Full Name is required")));
        assert!(lines[2].contains("Ana"));
        assert!(!lines[2].contains("Enter your full name"));
        assert!(lines[4].starts_with("Full Name is required"));
    }

    #[test]
    fn test_optional_label_has_no_marker() {
        let mut input = field("", None);
        input.required = false;
        let lines = render(input);
        assert!(!lines[0].contains('*'));
    }

    #[test]
    fn test_cursor_follows_value() {
        let input = field("Ana", None);
        let pos = input.cursor(Rect::new(2, 10, 40, FIELD_HEIGHT));
        assert_eq!(pos, Position::new(2 + 1 + 3, 12));
    }
}
