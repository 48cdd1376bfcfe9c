/// Inline button opening a URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkButton {
    pub label: String,
    pub url: String,
}

impl LinkButton {
    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// Inline keyboard of link buttons, rendered row by row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkKeyboard {
    pub rows: Vec<Vec<LinkButton>>,
}

impl LinkKeyboard {
    pub fn new(rows: Vec<Vec<LinkButton>>) -> Self {
        Self { rows }
    }

    /// Convenience for "one button per row" layouts.
    pub fn one_per_row(buttons: Vec<LinkButton>) -> Self {
        Self {
            rows: buttons.into_iter().map(|b| vec![b]).collect(),
        }
    }
}

/// Reply keyboard button. Plain buttons send their label back as text; a
/// web-app button opens the page and its submission arrives as web app data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplyButton {
    pub label: String,
    pub web_app: Option<String>,
}

impl ReplyButton {
    pub fn text(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            web_app: None,
        }
    }

    pub fn web_app(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            web_app: Some(url.into()),
        }
    }
}

/// Persistent reply keyboard (the bottom menu).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplyKeyboard {
    pub rows: Vec<Vec<ReplyButton>>,
    pub resize: bool,
    pub one_time: bool,
}

/// Length limits of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub max_message_len: usize,
    pub max_caption_len: usize,
}
