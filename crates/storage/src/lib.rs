use anyhow::{Context, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

use shared::domain::{Comment, TalkId};

/// Prefix of the per-talk comment cache keys.
pub const TALK_COMMENTS_KEY_PREFIX: &str = "SPEAKERCHAT_TALK_COMMENTS_";
/// Key holding the username of the local profile.
pub const PROFILE_KEY: &str = "SPEAKERCHAT_PROFILE_KEY";

pub fn talk_comments_key(talk_id: &TalkId) -> String {
    format!("{TALK_COMMENTS_KEY_PREFIX}{talk_id}")
}

/// String key-value store backed by SQLite, the on-disk equivalent of a
/// browser's local storage.
#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM local_storage WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .with_context(|| format!("failed to read local storage key '{key}'"))?;
        Ok(value)
    }

    pub async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO local_storage (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value, updated_at=CURRENT_TIMESTAMP",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to write local storage key '{key}'"))?;
        Ok(())
    }

    /// Cached comment list for a talk. `Ok(None)` when nothing was cached;
    /// an entry that is not a JSON comment list is an error.
    pub async fn load_talk_comments(&self, talk_id: &TalkId) -> Result<Option<Vec<Comment>>> {
        let key = talk_comments_key(talk_id);
        let Some(raw) = self.get_item(&key).await? else {
            return Ok(None);
        };
        let comments = serde_json::from_str(&raw)
            .with_context(|| format!("cached comments under '{key}' are not valid JSON"))?;
        Ok(Some(comments))
    }

    pub async fn store_talk_comments(&self, talk_id: &TalkId, comments: &[Comment]) -> Result<()> {
        let raw = serde_json::to_string(comments)?;
        self.set_item(&talk_comments_key(talk_id), &raw).await?;
        debug!(%talk_id, count = comments.len(), "cached talk comments");
        Ok(())
    }

    pub async fn profile_username(&self) -> Result<Option<String>> {
        self.get_item(PROFILE_KEY).await
    }

    pub async fn set_profile_username(&self, username: &str) -> Result<()> {
        self.set_item(PROFILE_KEY, username).await
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
