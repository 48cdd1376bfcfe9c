//! Fan-out of announcements to every registered chat.
//!
//! One pass walks the recipient snapshot sequentially. Each recipient yields a
//! `Result<(), RecipientFailure>` that is logged and folded into a
//! [`DeliveryOutcome`]; a failed recipient never aborts the pass.

use std::{fmt, sync::Arc};

use tracing::{info, warn};

use crate::{
    announcement::Announcement,
    domain::{ChatId, MessageRef},
    errors::Error,
    messaging::{port::MessagingPort, types::LinkKeyboard},
    store::RecipientStore,
};

/// Whole-operation failures, reported to the operator instead of a tally.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("no registered recipients")]
    NoRecipients,

    #[error("could not read recipients: {0}")]
    Store(#[source] Error),
}

/// Why a single recipient was counted as a failure.
#[derive(Debug, thiserror::Error)]
pub enum RecipientFailure {
    #[error("send failed: {0}")]
    Send(#[source] Error),

    #[error("no previously delivered message to edit")]
    MissingRecord,

    #[error("store failed: {0}")]
    Store(#[source] Error),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub success: usize,
    pub failure: usize,
}

impl DeliveryOutcome {
    /// Fold one recipient's result into the tally.
    pub fn record(&mut self, chat_id: ChatId, result: Result<(), RecipientFailure>) {
        match result {
            Ok(()) => self.success += 1,
            Err(e) => {
                warn!(chat_id = chat_id.0, error = %e, "announcement delivery failed");
                self.failure += 1;
            }
        }
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "success={}, failure={}", self.success, self.failure)
    }
}

/// Broadcast and edit passes over injected messaging + store capabilities.
pub struct AnnouncementDispatcher {
    messenger: Arc<dyn MessagingPort>,
    store: Arc<dyn RecipientStore>,
}

impl AnnouncementDispatcher {
    pub fn new(messenger: Arc<dyn MessagingPort>, store: Arc<dyn RecipientStore>) -> Self {
        Self { messenger, store }
    }

    /// Snapshot of the current recipient set.
    pub async fn recipients(&self) -> Result<Vec<ChatId>, DeliveryError> {
        self.store.list_all().await.map_err(DeliveryError::Store)
    }

    /// Send the announcement to every recipient and remember each message id.
    pub async fn broadcast(
        &self,
        announcement: &Announcement,
        recipients: &[ChatId],
    ) -> Result<DeliveryOutcome, DeliveryError> {
        if recipients.is_empty() {
            return Err(DeliveryError::NoRecipients);
        }

        let text = announcement.rendered_text();
        let keyboard = announcement.keyboard();
        self.warn_if_too_long(&text, announcement.image.is_some());

        let mut outcome = DeliveryOutcome::default();
        for &chat_id in recipients {
            let result = self
                .deliver(chat_id, announcement.image.as_deref(), &text, keyboard.as_ref())
                .await;
            outcome.record(chat_id, result);
        }

        info!(recipients = recipients.len(), %outcome, "broadcast finished");
        Ok(outcome)
    }

    /// Edit the last delivered announcement of every recipient in place.
    pub async fn edit(
        &self,
        announcement: &Announcement,
        recipients: &[ChatId],
    ) -> Result<DeliveryOutcome, DeliveryError> {
        if recipients.is_empty() {
            return Err(DeliveryError::NoRecipients);
        }

        let text = announcement.rendered_text();
        self.warn_if_too_long(&text, false);

        let mut outcome = DeliveryOutcome::default();
        for &chat_id in recipients {
            let result = self.edit_one(chat_id, &text).await;
            outcome.record(chat_id, result);
        }

        info!(recipients = recipients.len(), %outcome, "edit finished");
        Ok(outcome)
    }

    async fn deliver(
        &self,
        chat_id: ChatId,
        image: Option<&str>,
        text: &str,
        keyboard: Option<&LinkKeyboard>,
    ) -> Result<(), RecipientFailure> {
        let sent = match image {
            Some(image) => {
                self.messenger
                    .send_photo(chat_id, image, text, keyboard)
                    .await
            }
            None => self.messenger.send_message(chat_id, text, keyboard).await,
        }
        .map_err(RecipientFailure::Send)?;

        self.store
            .record_delivery(chat_id, sent.message_id)
            .await
            .map_err(RecipientFailure::Store)
    }

    async fn edit_one(&self, chat_id: ChatId, text: &str) -> Result<(), RecipientFailure> {
        let message_id = self
            .store
            .lookup_delivery(chat_id)
            .await
            .map_err(RecipientFailure::Store)?
            .ok_or(RecipientFailure::MissingRecord)?;

        self.messenger
            .edit_text(
                MessageRef {
                    chat_id,
                    message_id,
                },
                text,
            )
            .await
            .map_err(RecipientFailure::Send)
    }

    fn warn_if_too_long(&self, text: &str, as_caption: bool) {
        let caps = self.messenger.capabilities();
        let limit = if as_caption {
            caps.max_caption_len
        } else {
            caps.max_message_len
        };
        let len = text.chars().count();
        if len > limit {
            warn!(len, limit, "announcement text exceeds messenger limit");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MessageId;
    use crate::messaging::types::{MessagingCapabilities, ReplyKeyboard};
    use crate::store::MemoryStore;
    use crate::Result;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[derive(Clone, Debug, PartialEq, Eq)]
    enum Call {
        Message {
            chat_id: ChatId,
            text: String,
            rows: usize,
        },
        Photo {
            chat_id: ChatId,
            image: String,
            caption: String,
            rows: usize,
        },
        Edit {
            msg: MessageRef,
            text: String,
        },
    }

    #[derive(Default)]
    struct FakeMessenger {
        next_id: Mutex<i32>,
        failing: HashSet<ChatId>,
        calls: Mutex<Vec<Call>>,
    }

    impl FakeMessenger {
        fn failing(ids: &[i64]) -> Self {
            Self {
                failing: ids.iter().map(|&id| ChatId(id)).collect(),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn alloc(&self, chat_id: ChatId) -> Result<MessageRef> {
            if self.failing.contains(&chat_id) {
                return Err(Error::External("telegram error: chat not found".into()));
            }
            let mut guard = self.next_id.lock().unwrap();
            *guard += 1;
            Ok(MessageRef {
                chat_id,
                message_id: MessageId(100 + *guard),
            })
        }
    }

    #[async_trait]
    impl MessagingPort for FakeMessenger {
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
            self.calls.lock().unwrap().push(Call::Message {
                chat_id,
                text: html.to_string(),
                rows: keyboard.map(|k| k.rows.len()).unwrap_or(0),
            });
            self.alloc(chat_id)
        }

        async fn send_photo(
            &self,
            chat_id: ChatId,
            image: &str,
            caption: &str,
            keyboard: Option<&LinkKeyboard>,
        ) -> Result<MessageRef> {
            self.calls.lock().unwrap().push(Call::Photo {
                chat_id,
                image: image.to_string(),
                caption: caption.to_string(),
                rows: keyboard.map(|k| k.rows.len()).unwrap_or(0),
            });
            self.alloc(chat_id)
        }

        async fn edit_text(&self, msg: MessageRef, html: &str) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Edit {
                msg,
                text: html.to_string(),
            });
            self.alloc(msg.chat_id).map(|_| ())
        }

        async fn send_reply_keyboard(
            &self,
            chat_id: ChatId,
            _text: &str,
            _keyboard: &ReplyKeyboard,
        ) -> Result<MessageRef> {
            self.alloc(chat_id)
        }
    }

    fn announcement(text: &str) -> Announcement {
        Announcement::parse(text, "broadcast").unwrap()
    }

    fn setup(failing: &[i64]) -> (Arc<FakeMessenger>, Arc<MemoryStore>, AnnouncementDispatcher) {
        let messenger = Arc::new(FakeMessenger::failing(failing));
        let store = Arc::new(MemoryStore::new());
        let dispatcher = AnnouncementDispatcher::new(messenger.clone(), store.clone());
        (messenger, store, dispatcher)
    }

    #[tokio::test]
    async fn broadcast_without_recipients_makes_no_calls() {
        let (messenger, _store, dispatcher) = setup(&[]);
        let err = dispatcher
            .broadcast(&announcement("T\nbody"), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::NoRecipients));

        let err = dispatcher
            .edit(&announcement("T\nbody"), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::NoRecipients));
        assert!(messenger.calls().is_empty());
    }

    #[tokio::test]
    async fn broadcast_tallies_failures_and_records_successes() {
        let (messenger, store, dispatcher) = setup(&[2, 4]);
        let recipients: Vec<ChatId> = (1..=5).map(ChatId).collect();

        let outcome = dispatcher
            .broadcast(&announcement("T\nbody\nA|https://a.example"), &recipients)
            .await
            .unwrap();

        assert_eq!(outcome, DeliveryOutcome { success: 3, failure: 2 });
        assert_eq!(messenger.calls().len(), 5);

        let mut recorded = 0;
        for chat_id in &recipients {
            if store.lookup_delivery(*chat_id).await.unwrap().is_some() {
                recorded += 1;
            }
        }
        assert_eq!(recorded, 3);
        assert_eq!(store.lookup_delivery(ChatId(2)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn broadcast_records_returned_message_id() {
        let (messenger, store, dispatcher) = setup(&[]);
        dispatcher
            .broadcast(&announcement("T\nbody"), &[ChatId(9)])
            .await
            .unwrap();

        assert_eq!(
            store.lookup_delivery(ChatId(9)).await.unwrap(),
            Some(MessageId(101))
        );
        assert_eq!(
            messenger.calls(),
            vec![Call::Message {
                chat_id: ChatId(9),
                text: "T\n\nbody".to_string(),
                rows: 0,
            }]
        );
    }

    #[tokio::test]
    async fn broadcast_with_image_sends_photo_with_caption() {
        let (messenger, _store, dispatcher) = setup(&[]);
        dispatcher
            .broadcast(
                &announcement("T\nbody\nhttps://img.example/a.png"),
                &[ChatId(1), ChatId(2)],
            )
            .await
            .unwrap();

        let calls = messenger.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0],
            Call::Photo {
                chat_id: ChatId(1),
                image: "https://img.example/a.png".to_string(),
                caption: "T\n\nbody".to_string(),
                rows: 0,
            }
        );
    }

    #[tokio::test]
    async fn photo_broadcast_carries_button_rows() {
        let (messenger, _store, dispatcher) = setup(&[]);
        dispatcher
            .broadcast(
                &announcement("T\nbody\nhttps://img.example/a.jpg\nA|https://a\nB|https://b"),
                &[ChatId(1)],
            )
            .await
            .unwrap();

        assert_eq!(
            messenger.calls(),
            vec![Call::Photo {
                chat_id: ChatId(1),
                image: "https://img.example/a.jpg".to_string(),
                caption: "T\n\nbody".to_string(),
                rows: 2,
            }]
        );
    }

    /// Accepts reads but refuses to record deliveries for the given chats.
    struct UnwritableStore {
        inner: MemoryStore,
        refused: HashSet<ChatId>,
    }

    #[async_trait]
    impl RecipientStore for UnwritableStore {
        async fn register_if_absent(&self, chat_id: ChatId) -> Result<bool> {
            self.inner.register_if_absent(chat_id).await
        }

        async fn list_all(&self) -> Result<Vec<ChatId>> {
            self.inner.list_all().await
        }

        async fn record_delivery(&self, chat_id: ChatId, message_id: MessageId) -> Result<()> {
            if self.refused.contains(&chat_id) {
                return Err(Error::Store("disk full".into()));
            }
            self.inner.record_delivery(chat_id, message_id).await
        }

        async fn lookup_delivery(&self, chat_id: ChatId) -> Result<Option<MessageId>> {
            self.inner.lookup_delivery(chat_id).await
        }
    }

    #[tokio::test]
    async fn unrecorded_delivery_counts_as_failure() {
        let messenger = Arc::new(FakeMessenger::default());
        let store = Arc::new(UnwritableStore {
            inner: MemoryStore::new(),
            refused: [ChatId(2)].into_iter().collect(),
        });
        let dispatcher = AnnouncementDispatcher::new(messenger.clone(), store.clone());

        let outcome = dispatcher
            .broadcast(&announcement("T\nbody"), &[ChatId(1), ChatId(2), ChatId(3)])
            .await
            .unwrap();

        assert_eq!(outcome, DeliveryOutcome { success: 2, failure: 1 });
        // The message itself went out to every recipient.
        assert_eq!(messenger.calls().len(), 3);
        assert_eq!(store.lookup_delivery(ChatId(2)).await.unwrap(), None);
        assert_eq!(
            store.lookup_delivery(ChatId(3)).await.unwrap(),
            Some(MessageId(103))
        );
    }

    #[tokio::test]
    async fn edit_skips_recipients_without_record() {
        let (messenger, store, dispatcher) = setup(&[]);
        store.record_delivery(ChatId(1), MessageId(55)).await.unwrap();

        let outcome = dispatcher
            .edit(&announcement("New\ntext"), &[ChatId(1), ChatId(2)])
            .await
            .unwrap();

        assert_eq!(outcome, DeliveryOutcome { success: 1, failure: 1 });
        assert_eq!(
            messenger.calls(),
            vec![Call::Edit {
                msg: MessageRef {
                    chat_id: ChatId(1),
                    message_id: MessageId(55),
                },
                text: "New\n\ntext".to_string(),
            }]
        );
        assert_eq!(store.lookup_delivery(ChatId(2)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn edit_counts_platform_errors() {
        let (_messenger, store, dispatcher) = setup(&[3]);
        store.record_delivery(ChatId(3), MessageId(1)).await.unwrap();
        store.record_delivery(ChatId(4), MessageId(2)).await.unwrap();

        let outcome = dispatcher
            .edit(&announcement("T\nbody"), &[ChatId(3), ChatId(4)])
            .await
            .unwrap();
        assert_eq!(outcome, DeliveryOutcome { success: 1, failure: 1 });
        // Edits never touch the delivery records.
        assert_eq!(
            store.lookup_delivery(ChatId(4)).await.unwrap(),
            Some(MessageId(2))
        );
    }

    #[tokio::test]
    async fn edit_ignores_image_and_button_lines() {
        let (messenger, store, dispatcher) = setup(&[]);
        store.record_delivery(ChatId(1), MessageId(5)).await.unwrap();

        dispatcher
            .edit(
                &announcement("T\nbody\nhttps://img.example/a.jpg\nA|https://a.example"),
                &[ChatId(1)],
            )
            .await
            .unwrap();

        assert!(matches!(
            &messenger.calls()[0],
            Call::Edit { text, .. } if text == "T\n\nbody"
        ));
    }

    #[tokio::test]
    async fn recipients_come_from_store() {
        let (_messenger, store, dispatcher) = setup(&[]);
        store.register_if_absent(ChatId(5)).await.unwrap();
        store.register_if_absent(ChatId(3)).await.unwrap();
        assert_eq!(
            dispatcher.recipients().await.unwrap(),
            vec![ChatId(3), ChatId(5)]
        );
    }

    #[test]
    fn outcome_display() {
        let o = DeliveryOutcome { success: 4, failure: 1 };
        assert_eq!(o.to_string(), "success=4, failure=1");
    }
}
