//! What the conversation panel shows: user lines and assistant messages
//! addressed by [`MessageId`], so streamed tokens and updates land in place.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::message::{Element, MessageId, OutgoingMessage};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Author {
    User,
    Assistant,
}

#[derive(Clone, Debug)]
pub struct ChatEntry {
    pub id: Option<MessageId>,
    pub author: Author,
    pub content: String,
    pub elements: Vec<Element>,
}

#[derive(Debug, Default)]
pub struct Conversation {
    entries: Vec<ChatEntry>,
}

impl Conversation {
    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn push_user(&mut self, content: &str) {
        self.entries.push(ChatEntry {
            id: None,
            author: Author::User,
            content: content.to_string(),
            elements: Vec::new(),
        });
    }

    pub fn push_message(&mut self, id: MessageId, message: OutgoingMessage) {
        self.entries.push(ChatEntry {
            id: Some(id),
            author: Author::Assistant,
            content: message.content,
            elements: message.elements,
        });
    }

    /// Append a streamed token; unknown ids are ignored.
    pub fn append(&mut self, id: MessageId, token: &str) {
        if let Some(entry) = self.find_mut(id) {
            entry.content.push_str(token);
        }
    }

    /// Replace a message's content; unknown ids are ignored.
    pub fn replace(&mut self, id: MessageId, content: &str) {
        if let Some(entry) = self.find_mut(id) {
            entry.content = content.to_string();
        }
    }

    fn find_mut(&mut self, id: MessageId) -> Option<&mut ChatEntry> {
        self.entries.iter_mut().rev().find(|e| e.id == Some(id))
    }

    pub fn render(&self, assistant_name: &str) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for entry in &self.entries {
            let (label, color) = match entry.author {
                Author::User => ("You".to_string(), Color::Green),
                Author::Assistant => (assistant_name.to_string(), Color::Magenta),
            };
            lines.push(Line::from(Span::styled(
                format!("{label}:"),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )));
            for text in entry.content.lines() {
                lines.push(Line::from(format!("  {text}")));
            }
            for element in &entry.elements {
                lines.push(Line::from(Span::styled(
                    format!("  {}", describe_element(element)),
                    Style::default().fg(Color::Blue),
                )));
            }
            lines.push(Line::default());
        }
        lines
    }
}

/// Images are not drawn in the terminal, only referenced.
fn describe_element(element: &Element) -> String {
    match element {
        Element::Image {
            name,
            path,
            display,
        } => format!(
            "[image: {name} → {} ({})]",
            path.display(),
            display.as_str()
        ),
    }
}
