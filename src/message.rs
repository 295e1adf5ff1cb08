//! Messages pushed to the host chat UI.

use std::path::PathBuf;

/// A message the assistant asks the host UI to display.
#[derive(Clone, Debug, PartialEq)]
pub struct OutgoingMessage {
    pub content: String,
    pub elements: Vec<Element>,
}

impl OutgoingMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            elements: Vec::new(),
        }
    }

    pub fn with_element(mut self, element: Element) -> Self {
        self.elements.push(element);
        self
    }
}

/// Rich attachment carried by an [`OutgoingMessage`].
#[derive(Clone, Debug, PartialEq)]
pub enum Element {
    Image {
        name: String,
        path: PathBuf,
        display: Display,
    },
}

/// How the host should lay out an attachment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Display {
    Inline,
}

impl Display {
    pub fn as_str(&self) -> &'static str {
        match self {
            Display::Inline => "inline",
        }
    }
}

/// Opaque handle of a message already shown by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub u64);
