//! Telegram update handlers.
//!
//! Each handler is a small adapter that:
//! - extracts chat/user/text from the update
//! - calls into `annc-core` (store, parser, dispatcher, menu)
//! - replies through the messaging port

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use crate::router::AppState;

mod commands;
mod menu;
mod web_app;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if matches!(msg.kind, teloxide::types::MessageKind::WebAppData(_)) {
        return web_app::handle_web_app_data(msg, state).await;
    }

    if let Some(text) = msg.text() {
        if text.starts_with('/') {
            return commands::handle_command(msg, state).await;
        }
        return menu::handle_menu_selection(msg, state).await;
    }

    // Photos, stickers, service messages: nothing to do.
    Ok(())
}
