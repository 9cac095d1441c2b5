//! Mission screen: step tracker, live log, and the editable briefing.

use std::cell::Cell;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Padding, Paragraph, Wrap};

use crate::mission::{CloseReason, ConnectionState, MissionSnapshot};
use crate::model::{EventKind, LogRecord, MissionConfig, StepState, StepStatus};
use crate::tui::app::MissionAction;

pub struct MissionScreen {
    config: MissionConfig,
    /// Operator's working copy while editing the briefing.
    draft: Option<String>,
    scroll_offset: usize,
    /// Furthest offset the briefing could scroll to at the last draw.
    max_scroll: Cell<usize>,
}

impl MissionScreen {
    pub fn new(config: MissionConfig) -> Self {
        Self {
            config,
            draft: None,
            scroll_offset: 0,
            max_scroll: Cell::new(0),
        }
    }

    pub fn is_editing(&self) -> bool {
        self.draft.is_some()
    }

    /// Start editing from the document as it stands now.
    pub fn begin_edit(&mut self, snapshot: &MissionSnapshot) {
        self.draft = Some(snapshot.document.clone());
    }

    pub fn cancel_edit(&mut self) {
        self.draft = None;
    }

    /// Finish editing and hand the text over to the run.
    pub fn save_edit(&mut self) -> Option<MissionAction> {
        self.draft.take().map(MissionAction::SaveDocument)
    }

    pub fn on_char(&mut self, c: char) {
        if let Some(draft) = &mut self.draft {
            draft.push(c);
        }
    }

    pub fn on_backspace(&mut self) {
        if let Some(draft) = &mut self.draft {
            draft.pop();
        }
    }

    pub fn on_scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }

    pub fn on_scroll_down(&mut self) {
        self.scroll_offset = (self.scroll_offset + 1).min(self.max_scroll.get());
    }

    pub fn render(&self, frame: &mut Frame, snapshot: &MissionSnapshot) {
        let area = frame.area();

        let chunks = Layout::vertical([
            Constraint::Length(3), // header
            Constraint::Min(0),    // body
            Constraint::Length(1), // help
        ])
        .split(area);

        let muted = Style::default().fg(Color::DarkGray);
        let highlight = Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);

        let (status, status_style) = connection_label(snapshot.connection);
        let header = Paragraph::new(Line::from(vec![
            Span::styled(&self.config.topic, highlight),
            Span::styled(
                format!(
                    "  {} · {} · {} · {}  ",
                    self.config.content_type.as_str(),
                    self.config.target_group,
                    self.config.language,
                    self.config.region
                ),
                muted,
            ),
            Span::styled(status, status_style),
        ]))
        .block(Block::default().padding(Padding::new(2, 0, 1, 0)));
        frame.render_widget(header, chunks[0]);

        let [left, right] =
            Layout::horizontal([Constraint::Length(30), Constraint::Min(0)]).areas(chunks[1]);
        let [log_area, doc_area] =
            Layout::vertical([Constraint::Percentage(40), Constraint::Percentage(60)]).areas(right);

        render_steps(frame, left, &snapshot.steps);
        render_log(frame, log_area, &snapshot.records);
        self.render_document(frame, doc_area, snapshot);

        let hint = if self.is_editing() {
            " type to edit  ⏎ newline  ctrl-s save  esc discard"
        } else if snapshot.running {
            " e edit  ↑↓ scroll  s stop  q quit"
        } else {
            " e edit  ↑↓ scroll  esc new mission  q quit"
        };
        let help = Paragraph::new(Line::from(vec![Span::styled(hint, muted)]));
        frame.render_widget(help, chunks[2]);
    }

    fn render_document(&self, frame: &mut Frame, area: Rect, snapshot: &MissionSnapshot) {
        let (title, text) = match &self.draft {
            Some(draft) => (" Briefing (editing) ", format!("{draft}█")),
            None if snapshot.document_received || !snapshot.document.is_empty() => {
                (" Briefing ", snapshot.document.clone())
            }
            None => (" Briefing ", "Waiting for the briefing…".to_string()),
        };

        let style = if self.is_editing() {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::Gray)
        };
        let lines: Vec<Line> = text.lines().map(|l| Line::styled(l.to_string(), style)).collect();

        let visible = area.height.saturating_sub(2) as usize;
        self.max_scroll.set(lines.len().saturating_sub(visible));
        let offset = self.scroll_offset.min(self.max_scroll.get());
        let offset = u16::try_from(offset).unwrap_or(u16::MAX);

        let document = Paragraph::new(lines)
            .block(Block::bordered().title(title).padding(Padding::horizontal(1)))
            .wrap(Wrap { trim: false })
            .scroll((offset, 0));
        frame.render_widget(document, area);
    }
}

fn render_steps(frame: &mut Frame, area: Rect, steps: &[StepStatus]) {
    let lines: Vec<Line> = steps
        .iter()
        .map(|s| {
            let (marker, style) = match s.state {
                StepState::Pending => ("○", Style::default().fg(Color::DarkGray)),
                StepState::Running => (
                    "●",
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ),
                StepState::Completed => ("✓", Style::default().fg(Color::Green)),
                StepState::Error => ("✗", Style::default().fg(Color::Red)),
            };
            Line::from(vec![
                Span::styled(format!("{marker} "), style),
                Span::styled(s.label(), style),
            ])
        })
        .collect();

    let tracker = Paragraph::new(lines).block(
        Block::bordered()
            .title(" Steps ")
            .padding(Padding::new(1, 1, 1, 0)),
    );
    frame.render_widget(tracker, area);
}

/// The newest records that fit, oldest at the top.
fn render_log(frame: &mut Frame, area: Rect, records: &[LogRecord]) {
    let visible = area.height.saturating_sub(2) as usize;
    let start = records.len().saturating_sub(visible);

    let lines: Vec<Line> = records[start..]
        .iter()
        .map(|r| {
            Line::from(vec![
                Span::styled(
                    format!("{} ", r.local_time()),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(r.content.clone(), record_style(&r.kind)),
            ])
        })
        .collect();

    let log = Paragraph::new(lines).block(
        Block::bordered()
            .title(" Log ")
            .padding(Padding::horizontal(1)),
    );
    frame.render_widget(log, area);
}

fn record_style(kind: &EventKind) -> Style {
    match kind {
        EventKind::Status => Style::default().fg(Color::Cyan),
        EventKind::Error => Style::default().fg(Color::Red),
        EventKind::Complete => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
        EventKind::Data => Style::default().fg(Color::Magenta),
        EventKind::Log | EventKind::Unrecognized(_) => Style::default().fg(Color::Gray),
    }
}

fn connection_label(connection: ConnectionState) -> (&'static str, Style) {
    match connection {
        ConnectionState::Idle => ("idle", Style::default().fg(Color::DarkGray)),
        ConnectionState::Open => ("connecting", Style::default().fg(Color::Yellow)),
        ConnectionState::Active => ("live", Style::default().fg(Color::Green)),
        ConnectionState::Closed(CloseReason::Completed) => {
            ("complete", Style::default().fg(Color::Green))
        }
        ConnectionState::Closed(CloseReason::ConnectionLost) => {
            ("connection lost", Style::default().fg(Color::Red))
        }
        ConnectionState::Closed(CloseReason::Stopped) => {
            ("stopped", Style::default().fg(Color::DarkGray))
        }
    }
}
