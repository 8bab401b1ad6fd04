// Portal sessions: random cookie token -> backend bearer token + user.
// Kept in memory; a restart logs everybody out.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, SystemTime},
};

use data_encoding::BASE32_NOPAD;
use rand::RngCore;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::models::User;

use super::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Error,
    Info,
}

impl FlashKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashKind::Success => "success",
            FlashKind::Error => "error",
            FlashKind::Info => "info",
        }
    }
}

/// One-shot notice shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub user: User,
    pub api_token: String,
    pub expires_at: SystemTime,
    pub flash: Option<Flash>,
}

#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, SessionRecord>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

/// Stores the backend token for `user` and returns the new cookie token.
/// Older sessions of the same user and any expired session are dropped.
pub async fn create_session(state: &AppState, user: User, api_token: String) -> String {
    let mut token_bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut token_bytes);
    let token = BASE32_NOPAD.encode(&token_bytes);

    let now = SystemTime::now();
    let expires_at = now + state.sessions.ttl;
    let mut sessions = state.sessions.inner.write().await;
    sessions.retain(|_, s| s.expires_at > now && s.user.id != user.id);
    info!(user_id = user.id, role = user.role.as_str(), "session created");
    sessions.insert(
        token.clone(),
        SessionRecord {
            user,
            api_token,
            expires_at,
            flash: None,
        },
    );
    token
}

/// Looks a cookie token up. Expired sessions are removed and reported as
/// missing.
pub async fn find_session(state: &AppState, token: &str) -> Option<SessionRecord> {
    {
        let sessions = state.sessions.inner.read().await;
        match sessions.get(token) {
            Some(s) if s.expires_at > SystemTime::now() => return Some(s.clone()),
            Some(_) => {}
            None => return None,
        }
    }

    debug!("dropping expired session");
    state.sessions.inner.write().await.remove(token);
    None
}

pub async fn delete_session(state: &AppState, token: &str) {
    if state.sessions.inner.write().await.remove(token).is_some() {
        info!("session closed");
    }
}

/// Replaces the cached user after a fresh `/auth/me`.
pub async fn refresh_session_user(state: &AppState, token: &str, user: User) {
    if let Some(s) = state.sessions.inner.write().await.get_mut(token) {
        s.user = user;
    }
}

pub async fn push_flash(state: &AppState, token: &str, flash: Flash) {
    if let Some(s) = state.sessions.inner.write().await.get_mut(token) {
        s.flash = Some(flash);
    }
}

pub async fn take_flash(state: &AppState, token: &str) -> Option<Flash> {
    state
        .sessions
        .inner
        .write()
        .await
        .get_mut(token)
        .and_then(|s| s.flash.take())
}
