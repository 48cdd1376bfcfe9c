//! Recipient store: registered chats and the last announcement delivered to each.
//!
//! Two independent key spaces keyed by chat id. Every call is atomic at the key
//! level; nothing is transactional across calls.

use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageId},
    Result,
};

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

/// Collection holding registered chats.
pub const USER_COLLECTION: &str = "telegram_users";
/// Collection holding the last delivered announcement per chat.
pub const MESSAGE_COLLECTION: &str = "sent_messages";

#[async_trait]
pub trait RecipientStore: Send + Sync {
    /// Returns `true` when the chat was not registered before.
    async fn register_if_absent(&self, chat_id: ChatId) -> Result<bool>;

    /// Snapshot of every registered chat, in ascending key order.
    async fn list_all(&self) -> Result<Vec<ChatId>>;

    async fn record_delivery(&self, chat_id: ChatId, message_id: MessageId) -> Result<()>;

    async fn lookup_delivery(&self, chat_id: ChatId) -> Result<Option<MessageId>>;
}
