use std::{fs, path::Path};

use anyhow::Context;
use serde::Deserialize;

pub const SETTINGS_FILE: &str = "speakerchat.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub graphql_url: Option<String>,
    pub api_key: Option<String>,
    pub database_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            graphql_url: None,
            api_key: None,
            database_url: "sqlite://./data/speakerchat.db".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    graphql_url: Option<String>,
    api_key: Option<String>,
    database_url: Option<String>,
}

/// Defaults, then `speakerchat.toml` in the working directory, then the
/// environment.
pub fn load_settings() -> anyhow::Result<Settings> {
    let path = Path::new(SETTINGS_FILE);
    let raw = if path.exists() {
        Some(
            fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?,
        )
    } else {
        None
    };
    resolve_settings(raw.as_deref(), |key| std::env::var(key).ok())
}

pub fn resolve_settings(
    file_contents: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if let Some(raw) = file_contents {
        let file_cfg: FileSettings =
            toml::from_str(raw).with_context(|| format!("invalid {SETTINGS_FILE}"))?;
        if let Some(v) = file_cfg.graphql_url {
            settings.graphql_url = Some(v);
        }
        if let Some(v) = file_cfg.api_key {
            settings.api_key = Some(v);
        }
        if let Some(v) = file_cfg.database_url {
            settings.database_url = v;
        }
    }

    if let Some(v) = env("SPEAKERCHAT_GRAPHQL_URL") {
        settings.graphql_url = Some(v);
    }
    if let Some(v) = env("APP__GRAPHQL_URL") {
        settings.graphql_url = Some(v);
    }

    if let Some(v) = env("SPEAKERCHAT_API_KEY") {
        settings.api_key = Some(v);
    }
    if let Some(v) = env("APP__API_KEY") {
        settings.api_key = Some(v);
    }

    if let Some(v) = env("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = env("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    settings.graphql_url = settings.graphql_url.filter(|url| !url.trim().is_empty());
    settings.api_key = settings.api_key.filter(|key| !key.trim().is_empty());
    Ok(settings)
}

pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
