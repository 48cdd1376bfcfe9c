use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{info, warn};

use annc_core::{
    announcement::Announcement,
    dispatch::{DeliveryError, DeliveryOutcome},
    domain::{ChatId, UserId},
    menu::WELCOME_TEXT,
    security::is_operator,
};

use crate::router::AppState;

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

const HELP_TEXT: &str = "<b>可用命令</b>\n\
/start - 注册并显示服务菜单\n\
/broadcast - 向所有注册用户发送公告\n\
/edit - 修改最近一次发送的公告\n\
/help - 显示此帮助";

const NOT_OPERATOR_TEXT: &str = "⛔ 你没有权限执行此命令。";
const REGISTER_FAILED_TEXT: &str = "❌ 注册失败，请稍后重试。";
const STORE_FAILED_TEXT: &str = "❌ 读取用户列表失败，请稍后重试。";

/// The two announcement commands share one flow and differ only in wording
/// and which dispatcher pass they run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AnnouncementCommand {
    Broadcast,
    Edit,
}

impl AnnouncementCommand {
    fn name(self) -> &'static str {
        match self {
            Self::Broadcast => "broadcast",
            Self::Edit => "edit",
        }
    }

    fn usage(self) -> &'static str {
        match self {
            Self::Broadcast => {
                "⚠️ 请输入公告内容格式:\n\n\
                 <b>标题 (加粗)</b>\n\
                 主要内容\n\
                 (可选) 图片URL 或 图片文件名\n\
                 (可选) 按钮格式: <code>按钮文本|链接</code>"
            }
            Self::Edit => {
                "⚠️ 请输入公告内容格式:\n\n\
                 <b>标题 (加粗)</b>\n\
                 修改后的内容"
            }
        }
    }

    fn no_recipients(self) -> &'static str {
        match self {
            Self::Broadcast => "❌ 没有注册用户，无法发送公告。",
            Self::Edit => "❌ 没有注册用户，无法编辑公告。",
        }
    }

    fn summary(self, outcome: &DeliveryOutcome) -> String {
        let verb = match self {
            Self::Broadcast => "发送",
            Self::Edit => "更新",
        };
        format!(
            "✅ 公告已{verb}！成功: {}，失败: {}",
            outcome.success, outcome.failure
        )
    }
}

pub async fn handle_command(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let chat_id = ChatId(msg.chat.id.0);
    let (cmd, _args) = parse_command(text);

    match cmd.as_str() {
        "start" => handle_start(chat_id, &state).await,
        "broadcast" | "edit" => {
            let command = if cmd == "edit" {
                AnnouncementCommand::Edit
            } else {
                AnnouncementCommand::Broadcast
            };
            let user_id = msg.from().map(|u| UserId(u.id.0 as i64));
            if !is_operator(user_id, &state.cfg.broadcast_operators) {
                warn!(chat_id = chat_id.0, command = command.name(), "operator command refused");
                let _ = state.messenger.send_html(chat_id, NOT_OPERATOR_TEXT).await;
                return Ok(());
            }
            handle_announcement(chat_id, text, command, &state).await
        }
        _ => {
            let _ = state.messenger.send_html(chat_id, HELP_TEXT).await;
        }
    }

    Ok(())
}

async fn handle_start(chat_id: ChatId, state: &AppState) {
    match state.store.register_if_absent(chat_id).await {
        Ok(true) => info!(chat_id = chat_id.0, "registered new recipient"),
        Ok(false) => {}
        Err(e) => {
            warn!(chat_id = chat_id.0, "registration failed: {e}");
            let _ = state.messenger.send_html(chat_id, REGISTER_FAILED_TEXT).await;
            return;
        }
    }

    let keyboard = state.menu.reply_keyboard();
    if let Err(e) = state
        .messenger
        .send_reply_keyboard(chat_id, WELCOME_TEXT, &keyboard)
        .await
    {
        warn!(chat_id = chat_id.0, "failed to send menu: {e}");
    }
}

async fn handle_announcement(
    chat_id: ChatId,
    text: &str,
    command: AnnouncementCommand,
    state: &AppState,
) {
    let reply = match run_announcement(text, command, state).await {
        Ok(outcome) => command.summary(&outcome),
        Err(reply) => reply.to_string(),
    };
    let _ = state.messenger.send_html(chat_id, &reply).await;
}

/// Returns the tally, or the operator-facing text for an upfront failure.
async fn run_announcement(
    text: &str,
    command: AnnouncementCommand,
    state: &AppState,
) -> Result<DeliveryOutcome, &'static str> {
    let recipients = match state.dispatcher.recipients().await {
        Ok(ids) if ids.is_empty() => return Err(command.no_recipients()),
        Ok(ids) => ids,
        Err(e) => {
            warn!(command = command.name(), "{e}");
            return Err(STORE_FAILED_TEXT);
        }
    };

    let announcement = Announcement::parse(text, command.name()).map_err(|_| command.usage())?;

    let result = match command {
        AnnouncementCommand::Broadcast => {
            state
                .dispatcher
                .broadcast(&announcement, &recipients)
                .await
        }
        AnnouncementCommand::Edit => state.dispatcher.edit(&announcement, &recipients).await,
    };

    result.map_err(|e| match e {
        DeliveryError::NoRecipients => command.no_recipients(),
        DeliveryError::Store(_) => STORE_FAILED_TEXT,
    })
}
