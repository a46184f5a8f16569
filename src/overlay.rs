use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use std::time::{Duration, Instant};

use crate::models::{Segment, SubmissionStatus};

pub const ENTRANCE_DELAY: Duration = Duration::from_millis(120);

const WIDTH: u16 = 56;

/// Tracks when the overlay was mounted so it can fade in.
#[derive(Debug, Default)]
pub struct Entrance {
    mounted_at: Option<Instant>,
}

impl Entrance {
    pub fn mount(&mut self, now: Instant) {
        self.mounted_at = Some(now);
    }

    pub fn unmount(&mut self) {
        self.mounted_at = None;
    }

    pub fn is_visible(&self, now: Instant) -> bool {
        self.mounted_at
            .map(|at| now.duration_since(at) >= ENTRANCE_DELAY)
            .unwrap_or(false)
    }
}

pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

pub struct StatusOverlay<'a> {
    pub status: &'a SubmissionStatus,
    pub visible: bool,
}

impl StatusOverlay<'_> {
    fn message_lines(&self, width: usize) -> Vec<Line<'static>> {
        let Some(message) = self.status.message() else {
            return Vec::new();
        };
        let mut lines = Vec::new();
        for segment in &message.segments {
            match segment {
                Segment::Text(text) => {
                    for line in textwrap::fill(text.trim(), width).lines() {
                        lines.push(Line::from(line.to_string()));
                    }
                }
                Segment::Link { label, url } => {
                    lines.push(Line::styled(
                        label.clone(),
                        Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
                    ));
                    // URLs have no break points; cut them to the box width.
                    let chars: Vec<char> = url.chars().collect();
                    for chunk in chars.chunks(width.max(1)) {
                        lines.push(Line::styled(
                            chunk.iter().collect::<String>(),
                            Style::default().fg(Color::Magenta).add_modifier(Modifier::UNDERLINED),
                        ));
                    }
                }
            }
        }
        lines
    }

    /// Modal area for a screen; also the click target for dismissal.
    pub fn area(&self, screen: Rect) -> Rect {
        let inner_width = WIDTH.saturating_sub(4) as usize;
        let body = self.message_lines(inner_width).len() as u16;
        // borders, icon, heading, blank, body, blank, close button
        centered(screen, WIDTH, body + 8)
    }

    /// Row of the close button inside `area`.
    pub fn close_button(area: Rect) -> Rect {
        Rect::new(area.x + 1, area.bottom().saturating_sub(2), area.width.saturating_sub(2), 1)
    }
}

impl Widget for StatusOverlay<'_> {
    fn render(self, screen: Rect, buf: &mut Buffer) {
        let (icon, heading, accent) = match self.status {
            SubmissionStatus::Idle => return,
            SubmissionStatus::Success(_) => ("✔", "Success!", Color::Green),
            SubmissionStatus::Error(_) => ("✘", "Submission Failed", Color::Red),
        };
        let area = self.area(screen);
        let dim = !self.visible;
        let accent_style = if dim {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(accent).add_modifier(Modifier::BOLD)
        };

        let mut lines = vec![
            Line::styled(icon, accent_style).centered(),
            Line::styled(heading, accent_style).centered(),
            Line::from(""),
        ];
        let body_width = area.width.saturating_sub(4) as usize;
        lines.extend(self.message_lines(body_width).into_iter().map(Line::centered));
        lines.push(Line::from(""));

        Clear.render(area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(accent_style);
        let mut body = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
        if dim {
            body = body.style(Style::default().fg(Color::DarkGray));
        }
        body.render(area, buf);

        Paragraph::new(Line::styled(
            "[ Close ]",
            Style::default().fg(Color::White).bg(Color::Magenta),
        ).centered())
        .render(Self::close_button(area), buf);
    }
}
