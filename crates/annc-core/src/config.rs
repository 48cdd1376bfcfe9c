use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{errors::Error, Result};

const DEFAULT_WEB_APP_URL: &str = "https://katie2090.github.io/TelegramBot/form.html";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    /// JSON document file at `store_path`.
    File,
    /// In-process only; registrations are lost on restart.
    Memory,
}

/// Typed configuration, read from the environment (and `.env` if present).
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub telegram_bot_token: String,

    // Recipient store
    pub store_backend: StoreBackend,
    pub store_path: PathBuf,

    // Operators
    pub operator_chat_id: Option<i64>,
    pub broadcast_operators: Vec<i64>,

    // Menu
    pub web_app_url: String,
    pub menu_image_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN")
            .and_then(non_empty)
            .or_else(|| env_str("BOT_TOKEN").and_then(non_empty))
            .ok_or_else(|| {
                Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
            })?;

        let store_backend = parse_store_backend(env_str("RECIPIENT_STORE_BACKEND"))?;
        let store_path = env_path("RECIPIENT_STORE_PATH")
            .unwrap_or_else(|| PathBuf::from("data/announce-store.json"));

        let operator_chat_id = match env_str("OPERATOR_CHAT_ID").and_then(non_empty) {
            Some(s) => Some(s.trim().parse::<i64>().map_err(|_| {
                Error::Config(format!("OPERATOR_CHAT_ID must be a numeric chat id, got {s:?}"))
            })?),
            None => None,
        };
        let broadcast_operators = parse_csv_i64(env_str("BROADCAST_OPERATORS"));

        let web_app_url = env_str("WEB_APP_URL")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_WEB_APP_URL.to_string());
        let menu_image_dir = env_path("MENU_IMAGE_DIR").unwrap_or_else(|| PathBuf::from("images"));

        Ok(Self {
            telegram_bot_token,
            store_backend,
            store_path,
            operator_chat_id,
            broadcast_operators,
            web_app_url,
            menu_image_dir,
        })
    }
}

fn parse_store_backend(v: Option<String>) -> Result<StoreBackend> {
    let Some(v) = v.and_then(non_empty) else {
        return Ok(StoreBackend::File);
    };
    match v.trim().to_lowercase().as_str() {
        "file" | "json" => Ok(StoreBackend::File),
        "memory" => Ok(StoreBackend::Memory),
        other => Err(Error::Config(format!(
            "RECIPIENT_STORE_BACKEND must be 'file' or 'memory', got {other:?}"
        ))),
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn parse_csv_i64(v: Option<String>) -> Vec<i64> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<i64>().ok())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
