use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{ChatId, MessageId},
    store::RecipientStore,
    Result,
};

#[derive(Default)]
struct Inner {
    users: BTreeSet<ChatId>,
    deliveries: BTreeMap<ChatId, MessageId>,
}

/// In-process store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecipientStore for MemoryStore {
    async fn register_if_absent(&self, chat_id: ChatId) -> Result<bool> {
        Ok(self.inner.lock().await.users.insert(chat_id))
    }

    async fn list_all(&self) -> Result<Vec<ChatId>> {
        Ok(self.inner.lock().await.users.iter().copied().collect())
    }

    async fn record_delivery(&self, chat_id: ChatId, message_id: MessageId) -> Result<()> {
        self.inner
            .lock()
            .await
            .deliveries
            .insert(chat_id, message_id);
        Ok(())
    }

    async fn lookup_delivery(&self, chat_id: ChatId) -> Result<Option<MessageId>> {
        Ok(self.inner.lock().await.deliveries.get(&chat_id).copied())
    }
}
