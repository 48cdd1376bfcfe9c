use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{error, info};

use annc_core::{domain::ChatId, webapp::FormSubmission};

use crate::router::AppState;

const SUBMITTED_TEXT: &str = "✅ 您的信息已成功提交！";
const SUBMIT_FAILED_TEXT: &str = "❌ 数据提交失败，请稍后重试。";

pub async fn handle_web_app_data(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let teloxide::types::MessageKind::WebAppData(teloxide::types::MessageWebAppData {
        web_app_data: data,
    }) = &msg.kind
    else {
        return Ok(());
    };
    let chat_id = ChatId(msg.chat.id.0);

    let reply = match forward_submission(&data.data, &state).await {
        Ok(()) => {
            info!(chat_id = chat_id.0, "form submission forwarded");
            SUBMITTED_TEXT
        }
        Err(e) => {
            error!(chat_id = chat_id.0, "error processing web app data: {e}");
            SUBMIT_FAILED_TEXT
        }
    };

    // The form keyboard replaced the menu; bring the menu back with the reply.
    let _ = state
        .messenger
        .send_reply_keyboard(chat_id, reply, &state.menu.reply_keyboard())
        .await;
    Ok(())
}

async fn forward_submission(payload: &str, state: &AppState) -> annc_core::Result<()> {
    let form = FormSubmission::parse(payload)?;
    if !state.notifier.notify(&form.to_html()).await? {
        return Err(annc_core::Error::Config(
            "no operator chat configured for form submissions".to_string(),
        ));
    }
    Ok(())
}
