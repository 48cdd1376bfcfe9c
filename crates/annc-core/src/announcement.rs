//! Announcement text format.
//!
//! An operator writes a broadcast as free text:
//!
//! ```text
//! /broadcast
//! Title
//! body line
//! https://example.com/banner.jpg
//! Label|https://example.com,Other|https://example.org
//! ```
//!
//! The first line after the command is the title. Every other line is
//! classified on its own by [`LINE_CLASSIFIERS`], first match wins.

use tracing::debug;

use crate::messaging::types::{LinkButton, LinkKeyboard};

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("announcement needs a title line and at least one content line")]
    InsufficientContent,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Announcement {
    pub title: Option<String>,
    pub body: Vec<String>,
    pub image: Option<String>,
    pub buttons: Vec<Vec<LinkButton>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LineKind {
    Image,
    ButtonRow,
}

type Classifier = (LineKind, fn(&str) -> bool);

/// Ordered classifier list. Lines matching none of these are body text.
const LINE_CLASSIFIERS: &[Classifier] = &[
    (LineKind::Image, is_image_line),
    (LineKind::ButtonRow, is_button_line),
];

fn is_image_line(line: &str) -> bool {
    line.starts_with("http") && (line.contains(".jpg") || line.contains(".png"))
}

fn is_button_line(line: &str) -> bool {
    line.contains('|')
}

fn classify(line: &str) -> Option<LineKind> {
    LINE_CLASSIFIERS
        .iter()
        .find(|(_, matches)| matches(line))
        .map(|(kind, _)| *kind)
}

impl Announcement {
    /// Parse the text of a `/<command>` message.
    ///
    /// A first line invoking `/<command>` (optionally `@botname`) is dropped
    /// whole, arguments included. The next line is the title when non-empty.
    pub fn parse(text: &str, command: &str) -> Result<Self, ParseError> {
        let mut lines: Vec<&str> = text
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .collect();

        if lines.first().is_some_and(|l| is_command_line(l, command)) {
            lines.remove(0);
        }

        if lines.len() < 2 {
            return Err(ParseError::InsufficientContent);
        }

        let title = Some(lines[0])
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        let mut out = Announcement {
            title,
            ..Default::default()
        };

        for raw in &lines[1..] {
            let line = raw.trim();
            match classify(line) {
                Some(LineKind::Image) => {
                    if out.image.is_none() {
                        out.image = Some(line.to_string());
                    } else {
                        debug!(image = line, "extra announcement image dropped");
                    }
                }
                Some(LineKind::ButtonRow) => {
                    let row = parse_button_row(line);
                    if !row.is_empty() {
                        out.buttons.push(row);
                    }
                }
                None => out.body.push(line.to_string()),
            }
        }

        Ok(out)
    }

    /// Message text (or photo caption): the title, one blank line, then the body.
    pub fn rendered_text(&self) -> String {
        let body = self.body.join("\n");
        match &self.title {
            Some(title) => format!("{title}\n\n{body}"),
            None => body,
        }
    }

    pub fn keyboard(&self) -> Option<LinkKeyboard> {
        if self.buttons.is_empty() {
            return None;
        }
        Some(LinkKeyboard::new(self.buttons.clone()))
    }
}

fn is_command_line(line: &str, command: &str) -> bool {
    let Some(rest) = line.trim_start().strip_prefix('/') else {
        return false;
    };
    let Some(name) = rest.get(..command.len()) else {
        return false;
    };
    if !name.eq_ignore_ascii_case(command) {
        return false;
    }
    // `/broadcast@my_bot ...`; rejects `/broadcaster` when looking for `/broadcast`.
    let rest = &rest[command.len()..];
    rest.is_empty() || rest.starts_with('@') || rest.starts_with(char::is_whitespace)
}

/// `a|x, b|y` into one row. Entries without `|` or with an empty side are dropped.
fn parse_button_row(line: &str) -> Vec<LinkButton> {
    line.split(',')
        .filter_map(|entry| {
            let (label, target) = entry.trim().split_once('|')?;
            let (label, target) = (label.trim(), target.trim());
            if label.is_empty() || target.is_empty() {
                debug!(entry, "malformed button entry dropped");
                return None;
            }
            Some(LinkButton::url(label, target))
        })
        .collect()
}
