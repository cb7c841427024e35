use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::Deserialize;
use url::Url;

pub const DEFAULT_STATS_FILE: &str = "bot_stats.json";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub bot_token: Option<String>,
    pub server_bind: String,
    pub stats_file: String,
    pub telegram_api_url: String,
    pub poll_timeout_seconds: u64,
    pub retry_delay_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot_token: None,
            server_bind: "0.0.0.0:10000".into(),
            stats_file: DEFAULT_STATS_FILE.into(),
            telegram_api_url: "https://api.telegram.org".into(),
            poll_timeout_seconds: 30,
            retry_delay_seconds: 5,
        }
    }
}

impl Settings {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_seconds)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_seconds)
    }
}

pub fn load_settings() -> Settings {
    let file_cfg = fs::read_to_string("server.toml")
        .ok()
        .and_then(|raw| toml::from_str::<HashMap<String, String>>(&raw).ok())
        .unwrap_or_default();
    apply_overrides(Settings::default(), &file_cfg, |key| std::env::var(key).ok())
}

fn apply_overrides(
    mut settings: Settings,
    file_cfg: &HashMap<String, String>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    if let Some(v) = file_cfg.get("bot_token") {
        settings.bot_token = Some(v.clone());
    }
    if let Some(v) = file_cfg.get("bind_addr") {
        settings.server_bind = v.clone();
    }
    if let Some(v) = file_cfg.get("stats_file") {
        settings.stats_file = v.clone();
    }
    if let Some(v) = file_cfg.get("telegram_api_url") {
        settings.telegram_api_url = v.clone();
    }
    if let Some(v) = file_cfg.get("poll_timeout_seconds") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.poll_timeout_seconds = parsed;
        }
    }

    if let Some(v) = env("BOT_TOKEN") {
        settings.bot_token = Some(v);
    }
    if let Some(v) = env("APP__BOT_TOKEN") {
        settings.bot_token = Some(v);
    }

    if let Some(v) = env("PORT") {
        if let Ok(port) = v.trim().parse::<u16>() {
            settings.server_bind = format!("0.0.0.0:{port}");
        }
    }
    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = env("STATS_FILE") {
        settings.stats_file = v;
    }
    if let Some(v) = env("APP__STATS_FILE") {
        settings.stats_file = v;
    }

    if let Some(v) = env("TELEGRAM_API_URL") {
        settings.telegram_api_url = v;
    }

    if let Some(v) = env("APP__POLL_TIMEOUT_SECONDS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.poll_timeout_seconds = parsed;
        }
    }
    if let Some(v) = env("APP__RETRY_DELAY_SECONDS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.retry_delay_seconds = parsed;
        }
    }

    settings.bot_token = settings
        .bot_token
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());
    settings
}

/// Resolves the stats file location and makes sure its directory exists.
pub fn prepare_stats_path(raw: &str) -> anyhow::Result<PathBuf> {
    let raw = raw.trim();
    let path = if raw.is_empty() {
        PathBuf::from(DEFAULT_STATS_FILE)
    } else {
        PathBuf::from(raw)
    };
    ensure_parent_dir_exists(&path)?;
    Ok(path)
}

fn ensure_parent_dir_exists(path: &Path) -> anyhow::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for stats file '{}'",
            parent.display(),
            path.display()
        )
    })
}

pub fn parse_api_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("invalid telegram api url '{raw}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("telegram api url must be http(s), got '{raw}'");
    }
    Ok(url)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
