use std::fmt;
use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::client::error::ApiError;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthState {
    Valid,
    Refreshing,
    Invalid,
}

pub type RefreshFuture = BoxFuture<'static, Result<TokenPair, ApiError>>;
type SharedRefresh = Shared<RefreshFuture>;
type UnauthenticatedHook = Arc<dyn Fn() + Send + Sync>;

enum RefreshSlot {
    Idle,
    InFlight { episode: u64, future: SharedRefresh },
    Invalid,
}

struct Inner {
    tokens: Option<TokenPair>,
    slot: RefreshSlot,
    episode: u64,
}

/// Process-wide credential holder with a single-flight refresh.
///
/// The token pair is written only by `init` (login, guest entry), a
/// successful refresh and `dispose` (logout). Every 401 seen while a refresh
/// is running awaits that same refresh.
pub struct SessionManager {
    inner: Mutex<Inner>,
    on_unauthenticated: Mutex<Option<UnauthenticatedHook>>,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &self.state())
            .field("has_tokens", &self.inner.lock().tokens.is_some())
            .finish()
    }
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                tokens: None,
                slot: RefreshSlot::Idle,
                episode: 0,
            }),
            on_unauthenticated: Mutex::new(None),
        }
    }

    /// Installs fresh credentials and clears any invalid or in-flight state.
    pub fn init(&self, tokens: TokenPair) {
        let mut inner = self.inner.lock();
        inner.tokens = Some(tokens);
        inner.slot = RefreshSlot::Idle;
        inner.episode += 1;
    }

    /// Drops credentials and returns to the initial state.
    pub fn dispose(&self) {
        let mut inner = self.inner.lock();
        inner.tokens = None;
        inner.slot = RefreshSlot::Idle;
        inner.episode += 1;
    }

    pub fn set_on_unauthenticated(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.on_unauthenticated.lock() = Some(Arc::new(hook));
    }

    pub fn state(&self) -> AuthState {
        match self.inner.lock().slot {
            RefreshSlot::Idle => AuthState::Valid,
            RefreshSlot::InFlight { .. } => AuthState::Refreshing,
            RefreshSlot::Invalid => AuthState::Invalid,
        }
    }

    pub fn is_invalid(&self) -> bool {
        self.state() == AuthState::Invalid
    }

    pub fn tokens(&self) -> Option<TokenPair> {
        self.inner.lock().tokens.clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner
            .lock()
            .tokens
            .as_ref()
            .map(|tokens| tokens.access_token.clone())
    }

    pub fn has_refresh_token(&self) -> bool {
        self.inner
            .lock()
            .tokens
            .as_ref()
            .is_some_and(|tokens| !tokens.refresh_token.is_empty())
    }

    /// Resolves a 401 for a request that was sent with `sent_access_token`.
    ///
    /// Joins the running refresh if there is one; otherwise, unless the
    /// access token already rotated since the request went out, starts a new
    /// refresh built by `start`. `Ok` means the caller should retry once.
    pub async fn refresh_after_unauthorized<F>(
        &self,
        sent_access_token: Option<&str>,
        start: F,
    ) -> Result<(), ApiError>
    where
        F: FnOnce(String) -> RefreshFuture,
    {
        let (episode, future) = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            match &inner.slot {
                RefreshSlot::Invalid => return Err(ApiError::session_expired()),
                RefreshSlot::InFlight { episode, future } => {
                    debug!(episode, "joining in-flight token refresh");
                    (*episode, future.clone())
                }
                RefreshSlot::Idle => {
                    let Some(tokens) = inner.tokens.as_ref() else {
                        return Err(ApiError::unauthorized("not signed in"));
                    };
                    if let Some(sent) = sent_access_token {
                        if sent != tokens.access_token {
                            debug!("access token already rotated, retrying without refresh");
                            return Ok(());
                        }
                    }
                    if tokens.refresh_token.is_empty() {
                        return Err(ApiError::unauthorized("no refresh token"));
                    }
                    let refresh_token = tokens.refresh_token.clone();
                    inner.episode += 1;
                    let episode = inner.episode;
                    let future = start(refresh_token).shared();
                    inner.slot = RefreshSlot::InFlight {
                        episode,
                        future: future.clone(),
                    };
                    info!(episode, "token refresh started");
                    (episode, future)
                }
            }
        };

        let result = future.await;
        self.settle(episode, &result);
        result.map(|_| ())
    }

    /// The first waiter to come back applies the outcome; later waiters of
    /// the same episode, or waiters of a superseded episode, change nothing.
    fn settle(&self, episode: u64, result: &Result<TokenPair, ApiError>) {
        let fire_hook = {
            let mut inner = self.inner.lock();
            let current = matches!(
                inner.slot,
                RefreshSlot::InFlight { episode: running, .. } if running == episode
            );
            if !current {
                return;
            }
            match result {
                Ok(tokens) => {
                    inner.tokens = Some(tokens.clone());
                    inner.slot = RefreshSlot::Idle;
                    info!(episode, "token refresh succeeded");
                    false
                }
                Err(err) => {
                    inner.tokens = None;
                    inner.slot = RefreshSlot::Invalid;
                    warn!(episode, error = %err, "token refresh failed, session invalidated");
                    true
                }
            }
        };

        if fire_hook {
            let hook = self.on_unauthenticated.lock().clone();
            if let Some(hook) = hook {
                hook();
            }
        }
    }
}
