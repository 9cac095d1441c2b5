//! Setup screen: mission parameters and the start control.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, List, ListItem, Padding, Paragraph};

use crate::config::MissionDefaults;
use crate::model::{ContentType, MissionConfig};
use crate::tui::app::SetupAction;

/// Form rows, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Topic,
    ContentType,
    TargetGroup,
    Language,
    Region,
    Start,
}

const FIELDS: [Field; 6] = [
    Field::Topic,
    Field::ContentType,
    Field::TargetGroup,
    Field::Language,
    Field::Region,
    Field::Start,
];

impl Field {
    fn label(self) -> &'static str {
        match self {
            Self::Topic => "Topic",
            Self::ContentType => "Content type",
            Self::TargetGroup => "Target group",
            Self::Language => "Language",
            Self::Region => "Region",
            Self::Start => "Start mission",
        }
    }
}

pub struct SetupScreen {
    topic: String,
    content_type: ContentType,
    target_group: String,
    language: String,
    region: String,
    selected: usize,
}

impl SetupScreen {
    pub fn new(defaults: &MissionDefaults) -> Self {
        Self {
            topic: String::new(),
            content_type: defaults.content_type,
            target_group: defaults.target_group.clone(),
            language: defaults.language.clone(),
            region: defaults.region.clone(),
            selected: 0,
        }
    }

    /// The mission these parameters describe.
    pub fn config(&self) -> MissionConfig {
        MissionConfig {
            topic: self.topic.trim().to_string(),
            content_type: self.content_type,
            target_group: self.target_group.clone(),
            language: self.language.clone(),
            region: self.region.clone(),
        }
    }

    fn field(&self) -> Field {
        FIELDS[self.selected]
    }

    pub fn move_up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 < FIELDS.len() {
            self.selected += 1;
        }
    }

    pub fn on_left(&mut self) {
        if self.field() == Field::ContentType {
            self.content_type = self.content_type.prev();
        }
    }

    pub fn on_right(&mut self) {
        if self.field() == Field::ContentType {
            self.content_type = self.content_type.next();
        }
    }

    pub fn on_char(&mut self, c: char) {
        if let Some(text) = self.text_mut() {
            text.push(c);
        }
    }

    pub fn on_backspace(&mut self) {
        if let Some(text) = self.text_mut() {
            text.pop();
        }
    }

    /// Enter moves to the next row; on the start row it asks to start.
    pub fn on_enter(&mut self) -> Option<SetupAction> {
        if self.field() == Field::Start {
            return Some(SetupAction::Start(self.config()));
        }
        self.move_down();
        None
    }

    fn text_mut(&mut self) -> Option<&mut String> {
        match self.field() {
            Field::Topic => Some(&mut self.topic),
            Field::TargetGroup => Some(&mut self.target_group),
            Field::Language => Some(&mut self.language),
            Field::Region => Some(&mut self.region),
            Field::ContentType | Field::Start => None,
        }
    }

    fn value(&self, field: Field) -> &str {
        match field {
            Field::Topic => &self.topic,
            Field::ContentType => self.content_type.as_str(),
            Field::TargetGroup => &self.target_group,
            Field::Language => &self.language,
            Field::Region => &self.region,
            Field::Start => "",
        }
    }

    /// Draw the form. `can_start` dims the start row when starting is refused.
    pub fn render(&self, frame: &mut Frame, can_start: bool) {
        let area = frame.area();

        let chunks = Layout::vertical([
            Constraint::Length(3), // title
            Constraint::Min(0),    // form
            Constraint::Length(1), // help
        ])
        .split(area);

        let muted = Style::default().fg(Color::DarkGray);
        let normal = Style::default().fg(Color::Gray);
        let highlight = Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);

        let title = Paragraph::new(Line::from(vec![
            Span::styled("genseo", highlight),
            Span::styled("  new mission", muted),
        ]))
        .block(Block::default().padding(Padding::new(2, 0, 1, 0)));
        frame.render_widget(title, chunks[0]);

        let items: Vec<ListItem> = FIELDS
            .iter()
            .enumerate()
            .map(|(i, &field)| {
                let focused = i == self.selected;
                let pointer = if focused { "› " } else { "  " };
                let style = if focused { highlight } else { normal };

                if field == Field::Start {
                    let style = if can_start { style } else { muted };
                    return ListItem::new(vec![
                        Line::default(),
                        Line::from(vec![
                            Span::styled(pointer, style),
                            Span::styled(format!("[ {} ]", field.label()), style),
                        ]),
                    ]);
                }

                let mut spans = vec![
                    Span::styled(pointer, style),
                    Span::styled(format!("{:<14}", field.label()), muted),
                ];
                match field {
                    Field::ContentType if focused => {
                        spans.push(Span::styled(format!("‹ {} ›", self.value(field)), style));
                    }
                    Field::ContentType => spans.push(Span::styled(self.value(field), style)),
                    _ => {
                        spans.push(Span::styled(self.value(field), style));
                        if focused {
                            spans.push(Span::styled("█", muted));
                        }
                    }
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let list = List::new(items).block(Block::default().padding(Padding::new(2, 2, 0, 0)));
        frame.render_widget(list, chunks[1]);

        let hint = if can_start || self.topic.trim().is_empty() {
            " ↑↓ move  ←→ content type  ⏎ next/start  esc quit"
        } else {
            " a mission is still running  esc quit"
        };
        let help = Paragraph::new(Line::from(vec![Span::styled(hint, muted)]));
        frame.render_widget(help, chunks[2]);
    }
}
