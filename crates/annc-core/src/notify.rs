use std::sync::Arc;

use tracing::warn;

use crate::{domain::ChatId, messaging::port::MessagingPort, Result};

/// Operator notification sink (form submissions and similar side-channel reports).
///
/// Distinct from the broadcast recipient set.
pub struct OperatorNotifier {
    messenger: Arc<dyn MessagingPort>,
    chat_id: Option<ChatId>,
}

impl OperatorNotifier {
    pub fn new(messenger: Arc<dyn MessagingPort>, chat_id: Option<ChatId>) -> Self {
        Self { messenger, chat_id }
    }

    /// Returns `Ok(false)` when no operator chat is configured.
    pub async fn notify(&self, html: &str) -> Result<bool> {
        let Some(chat_id) = self.chat_id else {
            warn!("operator notification dropped: OPERATOR_CHAT_ID is not set");
            return Ok(false);
        };
        self.messenger.send_html(chat_id, html).await?;
        Ok(true)
    }
}
