use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::types::{LinkKeyboard, MessagingCapabilities, ReplyKeyboard},
    Result,
};

/// Outbound messaging port.
///
/// Every call is a single remote request; implementations must not retry.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    async fn send_message(
        &self,
        chat_id: ChatId,
        html: &str,
        keyboard: Option<&LinkKeyboard>,
    ) -> Result<MessageRef>;

    /// Send a photo with a caption. `image` is either an `http(s)` URL or a
    /// local file path.
    async fn send_photo(
        &self,
        chat_id: ChatId,
        image: &str,
        caption: &str,
        keyboard: Option<&LinkKeyboard>,
    ) -> Result<MessageRef>;

    async fn edit_text(&self, msg: MessageRef, html: &str) -> Result<()>;

    async fn send_reply_keyboard(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: &ReplyKeyboard,
    ) -> Result<MessageRef>;

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        self.send_message(chat_id, html, None).await
    }
}
