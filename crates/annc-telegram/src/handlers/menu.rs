use std::sync::Arc;

use teloxide::prelude::*;
use tracing::warn;

use annc_core::{
    domain::ChatId,
    formatting::escape_html,
    menu::{MenuReply, UNKNOWN_SELECTION_TEXT},
};

use crate::router::AppState;

pub async fn handle_menu_selection(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let chat_id = ChatId(msg.chat.id.0);

    let Some(entry) = state.menu.lookup(text) else {
        let _ = state
            .messenger
            .send_html(chat_id, UNKNOWN_SELECTION_TEXT)
            .await;
        return Ok(());
    };

    let sent = match &entry.reply {
        MenuReply::Photo {
            image,
            caption,
            keyboard,
        } => {
            state
                .messenger
                .send_photo(
                    chat_id,
                    &image.to_string_lossy(),
                    &escape_html(caption),
                    Some(keyboard),
                )
                .await
        }
        MenuReply::Form { prompt, keyboard } => {
            state
                .messenger
                .send_reply_keyboard(chat_id, prompt, keyboard)
                .await
        }
    };

    if let Err(e) = sent {
        warn!(chat_id = chat_id.0, label = entry.label.as_str(), "menu reply failed: {e}");
    }

    Ok(())
}
