//! The session store: single source of truth for who is logged in.
//!
//! Every change to the token pair bumps a generation counter. Refresh
//! remembers the generation it started from and drops its result if anything
//! changed while the request was in flight, so a logout that lands during a
//! refresh always wins. Login only yields to an explicit logout, tracked by a
//! separate epoch; background refreshes never cancel it.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

use crate::api::ApiError;
use crate::routes::Route;

use super::service::AuthService;
use super::storage::TokenStore;
use super::tokens::{Credentials, Identity, TokenError, TokenPair};

/// Lifecycle of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// Nothing restored yet
    #[default]
    Uninitialized,
    /// Persisted tokens restored, first refresh still pending
    Loading,
    Authenticated,
    Guest,
}

impl SessionStatus {
    pub fn is_resolved(&self) -> bool {
        matches!(self, SessionStatus::Authenticated | SessionStatus::Guest)
    }
}

/// Point-in-time view of the session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub tokens: Option<TokenPair>,
    pub identity: Identity,
    pub status: SessionStatus,
    /// Set when the last login attempt was rejected
    pub login_error: bool,
}

impl Session {
    pub fn is_loading(&self) -> bool {
        !self.status.is_resolved()
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated && !self.identity.is_guest()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.tokens.as_ref().map(|t| t.access.as_str())
    }
}

#[derive(Error, Debug)]
pub enum LoginError {
    #[error("Invalid email or password ({0})")]
    Rejected(ApiError),

    #[error("Login failed: {0}")]
    Api(ApiError),

    #[error("Server returned an unreadable access token: {0}")]
    MalformedToken(#[from] TokenError),

    #[error("Logged out while logging in")]
    Superseded,
}

/// What a call to [`SessionStore::refresh`] ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// No refresh token to exchange
    Skipped,
    Renewed,
    /// The server refused the token (or the call failed) and the session ended
    LoggedOut,
    /// The session changed while the request was in flight; response dropped
    Stale,
}

struct Inner {
    session: Session,
    generation: u64,
    /// Bumped by explicit `logout()` only
    logout_epoch: u64,
}

pub struct SessionStore<A: AuthService> {
    auth: A,
    store: Arc<dyn TokenStore>,
    state: RwLock<Inner>,
    status_tx: watch::Sender<SessionStatus>,
}

impl<A: AuthService> SessionStore<A> {
    pub fn new(auth: A, store: Arc<dyn TokenStore>) -> Self {
        let (status_tx, _) = watch::channel(SessionStatus::Uninitialized);
        Self {
            auth,
            store,
            state: RwLock::new(Inner {
                session: Session::default(),
                generation: 0,
                logout_epoch: 0,
            }),
            status_tx,
        }
    }

    pub fn auth(&self) -> &A {
        &self.auth
    }

    /// Watch status transitions
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status_tx.subscribe()
    }

    pub fn status(&self) -> SessionStatus {
        *self.status_tx.borrow()
    }

    pub async fn snapshot(&self) -> Session {
        self.state.read().await.session.clone()
    }

    pub async fn identity(&self) -> Identity {
        self.state.read().await.session.identity.clone()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.state
            .read()
            .await
            .session
            .access_token()
            .map(str::to_string)
    }

    pub async fn has_tokens(&self) -> bool {
        self.state.read().await.session.tokens.is_some()
    }

    pub async fn clear_login_error(&self) {
        self.state.write().await.session.login_error = false;
    }

    /// Load the persisted pair and enter `Loading`.
    ///
    /// Identity stays guest until the first refresh confirms the tokens.
    /// An unreadable record is discarded. Only acts on a fresh store.
    pub async fn restore(&self) {
        let mut inner = self.state.write().await;
        if inner.session.status != SessionStatus::Uninitialized {
            debug!(status = ?inner.session.status, "Session already restored");
            return;
        }

        let tokens = match self.store.load() {
            Ok(tokens) => tokens.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable token record");
                if let Err(e) = self.store.clear() {
                    warn!(error = %e, "Failed to remove unreadable token record");
                }
                None
            }
        };

        info!(has_tokens = tokens.is_some(), "Restoring session");
        inner.generation += 1;
        inner.session.tokens = tokens;
        inner.session.identity = Identity::Guest;
        self.set_status(&mut inner, SessionStatus::Loading);
    }

    /// Exchange credentials for a token pair and start an authenticated session.
    ///
    /// Returns the route to land on. A rejected login leaves the current
    /// session as it was and raises the login error flag.
    ///
    /// A successful login replaces whatever a concurrent refresh did. If the
    /// user logs out while the request is in flight the response is dropped
    /// and `LoginError::Superseded` returned; the login error flag stays
    /// untouched since the credentials were never judged.
    pub async fn login(&self, credentials: &Credentials) -> Result<Route, LoginError> {
        let epoch = self.state.read().await.logout_epoch;
        debug!(email = %credentials.email, "Logging in");

        let result = self.auth.obtain_pair(credentials).await;

        let mut inner = self.state.write().await;
        if inner.logout_epoch != epoch {
            debug!("Discarding login response, logged out meanwhile");
            return Err(LoginError::Superseded);
        }

        let tokens = match result {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(error = %e, "Login failed");
                inner.session.login_error = true;
                return Err(if e.is_rejection() {
                    LoginError::Rejected(e)
                } else {
                    LoginError::Api(e)
                });
            }
        };

        let identity = match Identity::from_access(&tokens.access) {
            Ok(identity) => identity,
            Err(e) => {
                warn!(error = %e, "Login returned an undecodable access token");
                inner.session.login_error = true;
                return Err(LoginError::MalformedToken(e));
            }
        };

        info!(user_id = ?identity.user_id(), user_type = ?identity.user_type(), "Logged in");
        self.apply_tokens(&mut inner, tokens, identity);
        Ok(Route::Landing)
    }

    /// End the session locally. No network call; safe to repeat.
    pub async fn logout(&self) {
        let mut inner = self.state.write().await;
        let had_session = inner.session.tokens.is_some();
        inner.logout_epoch += 1;
        self.apply_logout(&mut inner);
        info!(had_session, "Logged out");
    }

    /// Exchange the refresh token for a new pair.
    ///
    /// Any failure ends the session. Never returns an error; the outcome is
    /// reported for logging and tests.
    pub async fn refresh(&self) -> RefreshOutcome {
        let (generation, refresh) = {
            let mut inner = self.state.write().await;
            let refresh = inner
                .session
                .tokens
                .as_ref()
                .map(|t| t.refresh.clone())
                .filter(|r| !r.is_empty());

            match refresh {
                Some(refresh) => (inner.generation, refresh),
                None => {
                    if inner.session.status == SessionStatus::Loading {
                        debug!("No refresh token, resolving session as guest");
                        self.apply_logout(&mut inner);
                    }
                    return RefreshOutcome::Skipped;
                }
            }
        };

        debug!("Refreshing access token");
        let result = self.auth.refresh_pair(&refresh).await;

        let mut inner = self.state.write().await;
        if inner.generation != generation {
            debug!("Discarding refresh response, session changed meanwhile");
            return RefreshOutcome::Stale;
        }

        let tokens = match result {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(error = %e, "Token refresh failed, ending session");
                self.apply_logout(&mut inner);
                return RefreshOutcome::LoggedOut;
            }
        };

        match Identity::from_access(&tokens.access) {
            Ok(identity) => {
                self.apply_tokens(&mut inner, tokens, identity);
                debug!("Access token renewed");
                RefreshOutcome::Renewed
            }
            Err(e) => {
                warn!(error = %e, "Refreshed access token is undecodable, ending session");
                self.apply_logout(&mut inner);
                RefreshOutcome::LoggedOut
            }
        }
    }

    /// Wait for the session to leave `Uninitialized`/`Loading`.
    ///
    /// Never returns if `restore` is never called.
    pub async fn wait_until_resolved(&self) -> SessionStatus {
        let mut rx = self.status_tx.subscribe();
        let status = match rx.wait_for(SessionStatus::is_resolved).await {
            Ok(status) => *status,
            Err(_) => self.status(),
        };
        status
    }

    fn apply_tokens(&self, inner: &mut Inner, tokens: TokenPair, identity: Identity) {
        if let Err(e) = self.store.save(&tokens) {
            warn!(error = %e, "Failed to persist tokens");
        }
        inner.generation += 1;
        inner.session.tokens = Some(tokens);
        inner.session.identity = identity;
        inner.session.login_error = false;
        self.set_status(inner, SessionStatus::Authenticated);
    }

    fn apply_logout(&self, inner: &mut Inner) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to remove persisted tokens");
        }
        inner.generation += 1;
        inner.session.tokens = None;
        inner.session.identity = Identity::Guest;
        self.set_status(inner, SessionStatus::Guest);
    }

    fn set_status(&self, inner: &mut Inner, status: SessionStatus) {
        inner.session.status = status;
        self.status_tx.send_replace(status);
    }
}
