use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::{info, warn};

use annc_core::{
    config::Config, dispatch::AnnouncementDispatcher, domain::ChatId, menu::Menu,
    messaging::port::MessagingPort, notify::OperatorNotifier, store::RecipientStore,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub messenger: Arc<dyn MessagingPort>,
    pub store: Arc<dyn RecipientStore>,
    pub dispatcher: Arc<AnnouncementDispatcher>,
    pub notifier: Arc<OperatorNotifier>,
    pub menu: Arc<Menu>,
}

impl AppState {
    pub fn new(
        cfg: Arc<Config>,
        messenger: Arc<dyn MessagingPort>,
        store: Arc<dyn RecipientStore>,
    ) -> Self {
        let dispatcher = Arc::new(AnnouncementDispatcher::new(
            messenger.clone(),
            store.clone(),
        ));
        let notifier = Arc::new(OperatorNotifier::new(
            messenger.clone(),
            cfg.operator_chat_id.map(ChatId),
        ));
        let menu = Arc::new(Menu::standard(&cfg.menu_image_dir, &cfg.web_app_url));
        Self {
            cfg,
            messenger,
            store,
            dispatcher,
            notifier,
            menu,
        }
    }
}

pub async fn run_polling(cfg: Arc<Config>, store: Arc<dyn RecipientStore>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    // Basic startup info.
    if let Ok(me) = bot.get_me().await {
        info!("annc started: @{}", me.username());
    }
    match store.list_all().await {
        Ok(ids) => info!(recipients = ids.len(), "recipient store ready"),
        Err(e) => warn!("recipient store unreadable at startup: {e}"),
    }
    if cfg.broadcast_operators.is_empty() {
        warn!("BROADCAST_OPERATORS is empty: any user can run /broadcast and /edit");
    }
    if cfg.operator_chat_id.is_none() {
        warn!("OPERATOR_CHAT_ID is not set: form submissions will not be forwarded");
    }

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let state = Arc::new(AppState::new(cfg, messenger, store));

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
