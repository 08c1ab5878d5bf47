use std::sync::Arc;

use anyhow::{Context, Result};
use shared::domain::{Comment, Identity, TalkId};
use storage::Storage;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

pub mod backend;
pub mod error;
pub mod render;
pub mod state;

pub use backend::{CommentsBackend, GraphQlBackend, MissingCommentsBackend};
pub use error::{ClientError, ReducerError, SubmitError};
pub use render::ThreadView;
pub use state::{reduce, Action, ViewState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadEvent {
    StateChanged(ViewState),
    ModalToggled(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderFormat {
    #[default]
    Html,
    Plain,
}

/// Result of an accepted submission. The comment is already in the view and
/// the cache; `remote` is the detached create call.
#[derive(Debug)]
pub struct Submission {
    pub comment: Comment,
    pub remote: JoinHandle<()>,
}

struct ThreadState {
    view: ViewState,
    modal_visible: bool,
    mounted: bool,
}

/// Comment thread for a single talk: owns the view state, keeps the local
/// cache in step and talks to the remote backend.
pub struct TalkThread {
    talk_id: TalkId,
    identity: Identity,
    storage: Storage,
    backend: Arc<dyn CommentsBackend>,
    inner: Mutex<ThreadState>,
    events: broadcast::Sender<ThreadEvent>,
}

impl TalkThread {
    pub fn new(
        talk_id: TalkId,
        identity: Identity,
        storage: Storage,
        backend: Arc<dyn CommentsBackend>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            talk_id,
            identity,
            storage,
            backend,
            inner: Mutex::new(ThreadState {
                view: ViewState::default(),
                modal_visible: false,
                mounted: true,
            }),
            events,
        })
    }

    /// Creates the thread and runs the initial sync before handing it back.
    pub async fn mount(
        talk_id: TalkId,
        identity: Identity,
        storage: Storage,
        backend: Arc<dyn CommentsBackend>,
    ) -> Arc<Self> {
        let thread = Self::new(talk_id, identity, storage, backend);
        thread.fetch_comments().await;
        thread
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ThreadEvent> {
        self.events.subscribe()
    }

    pub async fn view_state(&self) -> ViewState {
        self.inner.lock().await.view.clone()
    }

    pub async fn modal_visible(&self) -> bool {
        self.inner.lock().await.modal_visible
    }

    /// Detaches the thread. Work still in flight keeps running but its
    /// dispatches are dropped.
    pub async fn unmount(&self) {
        let mut guard = self.inner.lock().await;
        guard.mounted = false;
        debug!(talk_id = %self.talk_id, "talk thread unmounted");
    }

    pub async fn toggle_modal(&self) -> bool {
        let visible = {
            let mut guard = self.inner.lock().await;
            guard.modal_visible = !guard.modal_visible;
            guard.modal_visible
        };
        // no subscribers is fine
        let _ = self.events.send(ThreadEvent::ModalToggled(visible));
        visible
    }

    async fn close_modal(&self) {
        let changed = {
            let mut guard = self.inner.lock().await;
            std::mem::replace(&mut guard.modal_visible, false)
        };
        if changed {
            // no subscribers is fine
            let _ = self.events.send(ThreadEvent::ModalToggled(false));
        }
    }

    /// Runs `action` through the reducer and broadcasts the new state.
    /// Returns `false` when the thread is no longer mounted.
    pub async fn dispatch(&self, action: Action) -> bool {
        let next = {
            let mut guard = self.inner.lock().await;
            if !guard.mounted {
                debug!(
                    talk_id = %self.talk_id,
                    action = action.kind(),
                    "dropping dispatch for unmounted thread"
                );
                return false;
            }
            let current = std::mem::take(&mut guard.view);
            guard.view = reduce(current, action);
            guard.view.clone()
        };
        // no subscribers is fine
        let _ = self.events.send(ThreadEvent::StateChanged(next));
        true
    }

    /// Shows the cached snapshot right away, then replaces it with the
    /// remote list. Failures end up in the view's error slot.
    pub async fn fetch_comments(&self) {
        if let Err(err) = self.sync_comments().await {
            error!(
                talk_id = %self.talk_id,
                error = %format!("{err:#}"),
                "failed to fetch comments"
            );
            self.dispatch(Action::Error {
                error: format!("{err:#}"),
            })
            .await;
        }
    }

    async fn sync_comments(&self) -> Result<()> {
        match self.storage.load_talk_comments(&self.talk_id).await {
            Ok(Some(comments)) => {
                debug!(
                    talk_id = %self.talk_id,
                    count = comments.len(),
                    "seeding view from cache"
                );
                self.dispatch(Action::Set { comments }).await;
            }
            Ok(None) => {
                self.dispatch(Action::SetLoading).await;
            }
            Err(err) => {
                warn!(
                    talk_id = %self.talk_id,
                    error = %format!("{err:#}"),
                    "ignoring unreadable comment cache"
                );
                self.dispatch(Action::SetLoading).await;
            }
        }

        let comments = self
            .backend
            .list_comments_for_talk(&self.talk_id)
            .await
            .with_context(|| format!("failed to list comments for talk {}", self.talk_id))?;
        self.storage
            .store_talk_comments(&self.talk_id, &comments)
            .await?;
        info!(talk_id = %self.talk_id, count = comments.len(), "comments synced");
        self.dispatch(Action::Set { comments }).await;
        Ok(())
    }

    /// Optimistically adds a comment: cache and view first, then a detached
    /// remote create whose outcome is only logged.
    pub async fn create_comment(&self, text: &str) -> Result<Submission, SubmitError> {
        if text.is_empty() {
            warn!(talk_id = %self.talk_id, "rejected empty comment");
            return Err(SubmitError::EmptyComment);
        }

        let comment = Comment::new(
            self.talk_id.clone(),
            text,
            self.identity.client_id,
            self.identity.username.clone(),
        );
        info!(
            talk_id = %self.talk_id,
            client_id = %self.identity.client_id,
            created_at = comment.created_at,
            "new comment"
        );

        let mut cached = match self.storage.load_talk_comments(&self.talk_id).await {
            Ok(cached) => cached.unwrap_or_default(),
            Err(err) => {
                warn!(
                    talk_id = %self.talk_id,
                    error = %format!("{err:#}"),
                    "replacing unreadable comment cache"
                );
                Vec::new()
            }
        };
        cached.insert(0, comment.clone());
        self.storage
            .store_talk_comments(&self.talk_id, &cached)
            .await
            .map_err(SubmitError::Cache)?;

        self.dispatch(Action::Add {
            comment: comment.clone(),
        })
        .await;
        self.close_modal().await;

        let backend = Arc::clone(&self.backend);
        let input = comment.clone();
        let remote = tokio::spawn(async move {
            match backend.create_comment(&input).await {
                Ok(_) => info!(talk_id = %input.talk_id, "successfully created comment"),
                Err(err) => error!(
                    talk_id = %input.talk_id,
                    error = %format!("{err:#}"),
                    "error creating comment"
                ),
            }
        });

        Ok(Submission { comment, remote })
    }

    pub async fn render(&self, talk_name: &str, format: RenderFormat) -> String {
        let (state, modal_visible) = {
            let guard = self.inner.lock().await;
            (guard.view.clone(), guard.modal_visible)
        };
        let view = ThreadView {
            talk_name,
            state: &state,
            modal_visible,
        };
        match format {
            RenderFormat::Html => render::render_html(&view),
            RenderFormat::Plain => render::render_plain(&view),
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
