use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::warn;

use crate::{
    domain::{ChatId, MessageId},
    errors::Error,
    store::RecipientStore,
    Result,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
struct UserDoc {
    chat_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    registered_at: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct SentDoc {
    message_id: i32,
}

/// On-disk layout: one object per collection, documents keyed by chat id.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct StoreFileData {
    #[serde(default)]
    telegram_users: BTreeMap<String, UserDoc>,
    #[serde(default)]
    sent_messages: BTreeMap<String, SentDoc>,
}

/// Document store persisted as a single JSON file.
///
/// The whole document is rewritten (temp file + rename) after each mutation.
pub struct JsonFileStore {
    path: PathBuf,
    data: Mutex<StoreFileData>,
}

impl JsonFileStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = load_store_file(&path).await?.unwrap_or_default();
        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }
}

async fn load_store_file(path: &Path) -> Result<Option<StoreFileData>> {
    if !tokio::fs::try_exists(path).await? {
        return Ok(None);
    }
    let txt = tokio::fs::read_to_string(path).await?;
    if txt.trim().is_empty() {
        return Ok(None);
    }
    let data: StoreFileData = serde_json::from_str(&txt)
        .map_err(|e| Error::Store(format!("corrupt store file {}: {e}", path.display())))?;
    Ok(Some(data))
}

async fn save_store_file(path: &Path, data: &StoreFileData) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir).await?;
    }
    let txt = serde_json::to_string_pretty(data)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, txt).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl RecipientStore for JsonFileStore {
    async fn register_if_absent(&self, chat_id: ChatId) -> Result<bool> {
        let mut data = self.data.lock().await;
        if data.telegram_users.contains_key(&chat_id.key()) {
            return Ok(false);
        }
        let mut next = data.clone();
        next.telegram_users.insert(
            chat_id.key(),
            UserDoc {
                chat_id: chat_id.0,
                registered_at: Some(Utc::now().to_rfc3339()),
            },
        );
        save_store_file(&self.path, &next).await?;
        *data = next;
        Ok(true)
    }

    async fn list_all(&self) -> Result<Vec<ChatId>> {
        let data = self.data.lock().await;
        let mut out = Vec::with_capacity(data.telegram_users.len());
        for key in data.telegram_users.keys() {
            match ChatId::from_key(key) {
                Some(id) => out.push(id),
                None => warn!(key = key.as_str(), "skipping non-numeric chat id in store"),
            }
        }
        Ok(out)
    }

    async fn record_delivery(&self, chat_id: ChatId, message_id: MessageId) -> Result<()> {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        next.sent_messages.insert(
            chat_id.key(),
            SentDoc {
                message_id: message_id.0,
            },
        );
        save_store_file(&self.path, &next).await?;
        *data = next;
        Ok(())
    }

    async fn lookup_delivery(&self, chat_id: ChatId) -> Result<Option<MessageId>> {
        let data = self.data.lock().await;
        Ok(data
            .sent_messages
            .get(&chat_id.key())
            .map(|d| MessageId(d.message_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_file(prefix: &str) -> PathBuf {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let pid = std::process::id();
        PathBuf::from(format!("/tmp/{prefix}-{pid}-{ts}/store.json"))
    }

    #[tokio::test]
    async fn missing_file_opens_empty() {
        let path = tmp_file("annc-store-empty");
        let store = JsonFileStore::open(&path).await.unwrap();
        assert!(store.list_all().await.unwrap().is_empty());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn survives_reopen() {
        let path = tmp_file("annc-store-reopen");
        {
            let store = JsonFileStore::open(&path).await.unwrap();
            assert!(store.register_if_absent(ChatId(42)).await.unwrap());
            assert!(!store.register_if_absent(ChatId(42)).await.unwrap());
            store.record_delivery(ChatId(42), MessageId(9)).await.unwrap();
        }

        let store = JsonFileStore::open(&path).await.unwrap();
        assert_eq!(store.list_all().await.unwrap(), vec![ChatId(42)]);
        assert_eq!(
            store.lookup_delivery(ChatId(42)).await.unwrap(),
            Some(MessageId(9))
        );
        assert_eq!(store.lookup_delivery(ChatId(43)).await.unwrap(), None);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn reads_documents_without_registration_time() {
        let path = tmp_file("annc-store-legacy");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            r#"{
              "telegram_users": {"1799744741": {"chat_id": 1799744741}, "bogus": {"chat_id": 0}},
              "sent_messages": {"1799744741": {"message_id": 77}}
            }"#,
        )
        .unwrap();

        let store = JsonFileStore::open(&path).await.unwrap();
        assert_eq!(store.list_all().await.unwrap(), vec![ChatId(1799744741)]);
        assert_eq!(
            store.lookup_delivery(ChatId(1799744741)).await.unwrap(),
            Some(MessageId(77))
        );

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn corrupt_file_is_a_store_error() {
        let path = tmp_file("annc-store-corrupt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();

        let err = JsonFileStore::open(&path).await.err().unwrap();
        assert!(matches!(err, Error::Store(_)));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn failed_write_leaves_state_unchanged() {
        let path = tmp_file("annc-store-unwritable");
        let root = path.parent().unwrap().to_path_buf();
        let path = root.join("data").join("store.json");
        std::fs::create_dir_all(&root).unwrap();

        let store = JsonFileStore::open(&path).await.unwrap();
        // A plain file where the data directory should be makes every save fail.
        std::fs::write(root.join("data"), "").unwrap();

        assert!(store.register_if_absent(ChatId(7)).await.is_err());
        assert!(store.record_delivery(ChatId(7), MessageId(3)).await.is_err());
        assert!(store.list_all().await.unwrap().is_empty());
        assert_eq!(store.lookup_delivery(ChatId(7)).await.unwrap(), None);

        std::fs::remove_file(root.join("data")).unwrap();
        assert!(store.register_if_absent(ChatId(7)).await.unwrap());

        let reopened = JsonFileStore::open(&path).await.unwrap();
        assert_eq!(reopened.list_all().await.unwrap(), vec![ChatId(7)]);

        let _ = std::fs::remove_dir_all(root);
    }
}
