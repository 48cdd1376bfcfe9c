//! Telegram adapter (teloxide).
//!
//! This crate implements the `annc-core` MessagingPort over Telegram Bot API
//! and wires the command/menu handlers into a long-polling dispatcher.

use async_trait::async_trait;

use reqwest::Url;
use teloxide::{
    prelude::*,
    types::{
        ButtonRequest, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, KeyboardButton,
        KeyboardMarkup, ParseMode, WebAppInfo,
    },
};

pub mod handlers;
pub mod router;

use annc_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{LinkKeyboard, MessagingCapabilities, ReplyKeyboard},
    },
    Result,
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    fn sent(chat_id: ChatId, msg: &Message) -> MessageRef {
        MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        }
    }
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| Error::External(format!("invalid url {raw:?}: {e}")))
}

/// `http(s)` references are fetched by Telegram; anything else is uploaded from disk.
pub fn input_file(image: &str) -> Result<InputFile> {
    if image.starts_with("http") {
        return Ok(InputFile::url(parse_url(image)?));
    }
    Ok(InputFile::file(image))
}

pub fn inline_markup(keyboard: &LinkKeyboard) -> Result<InlineKeyboardMarkup> {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::with_capacity(keyboard.rows.len());
    for row in &keyboard.rows {
        let mut buttons = Vec::with_capacity(row.len());
        for b in row {
            buttons.push(InlineKeyboardButton::url(b.label.clone(), parse_url(&b.url)?));
        }
        rows.push(buttons);
    }
    Ok(InlineKeyboardMarkup::new(rows))
}

pub fn reply_markup(keyboard: &ReplyKeyboard) -> Result<KeyboardMarkup> {
    let mut rows: Vec<Vec<KeyboardButton>> = Vec::with_capacity(keyboard.rows.len());
    for row in &keyboard.rows {
        let mut buttons = Vec::with_capacity(row.len());
        for b in row {
            let mut button = KeyboardButton::new(b.label.clone());
            if let Some(url) = &b.web_app {
                button = button.request(ButtonRequest::WebApp(WebAppInfo {
                    url: parse_url(url)?,
                }));
            }
            buttons.push(button);
        }
        rows.push(buttons);
    }
    let mut markup = KeyboardMarkup::new(rows);
    if keyboard.resize {
        markup = markup.resize_keyboard(true);
    }
    if keyboard.one_time {
        markup = markup.one_time_keyboard(true);
    }
    Ok(markup)
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            max_message_len: 4096,
            max_caption_len: 1024,
        }
    }

    async fn send_message(
        &self,
        chat_id: ChatId,
        html: &str,
        keyboard: Option<&LinkKeyboard>,
    ) -> Result<MessageRef> {
        let mut req = self
            .bot
            .send_message(Self::tg_chat(chat_id), html.to_string())
            .parse_mode(ParseMode::Html);
        if let Some(kb) = keyboard {
            req = req.reply_markup(inline_markup(kb)?);
        }
        let msg = req.await.map_err(Self::map_err)?;
        Ok(Self::sent(chat_id, &msg))
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        image: &str,
        caption: &str,
        keyboard: Option<&LinkKeyboard>,
    ) -> Result<MessageRef> {
        let mut req = self
            .bot
            .send_photo(Self::tg_chat(chat_id), input_file(image)?)
            .caption(caption.to_string())
            .parse_mode(ParseMode::Html);
        if let Some(kb) = keyboard {
            req = req.reply_markup(inline_markup(kb)?);
        }
        let msg = req.await.map_err(Self::map_err)?;
        Ok(Self::sent(chat_id, &msg))
    }

    async fn edit_text(&self, msg: MessageRef, html: &str) -> Result<()> {
        self.bot
            .edit_message_text(
                Self::tg_chat(msg.chat_id),
                Self::tg_msg_id(msg.message_id),
                html.to_string(),
            )
            .parse_mode(ParseMode::Html)
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn send_reply_keyboard(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: &ReplyKeyboard,
    ) -> Result<MessageRef> {
        let msg = self
            .bot
            .send_message(Self::tg_chat(chat_id), text.to_string())
            .reply_markup(reply_markup(keyboard)?)
            .await
            .map_err(Self::map_err)?;
        Ok(Self::sent(chat_id, &msg))
    }
}
