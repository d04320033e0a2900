//! Seam between the session store and the token endpoints.

use async_trait::async_trait;

use crate::api::ApiResult;

use super::tokens::{Credentials, TokenPair};

/// The two token endpoints the session lifecycle depends on.
#[async_trait]
pub trait AuthService: Send + Sync + 'static {
    /// Exchange credentials for a fresh pair
    async fn obtain_pair(&self, credentials: &Credentials) -> ApiResult<TokenPair>;

    /// Exchange a refresh token for a renewed pair
    async fn refresh_pair(&self, refresh: &str) -> ApiResult<TokenPair>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use tokio::sync::Notify;

    use super::*;
    use crate::api::ApiError;

    /// Auth service that replays queued responses.
    ///
    /// An empty queue answers `Unauthorized`, like a server that has
    /// forgotten the token.
    #[derive(Default)]
    pub struct ScriptedAuth {
        logins: Mutex<VecDeque<ApiResult<TokenPair>>>,
        refreshes: Mutex<VecDeque<ApiResult<TokenPair>>>,
        pub login_calls: AtomicUsize,
        pub refresh_calls: AtomicUsize,
        pub refresh_tokens_seen: Mutex<Vec<String>>,
        /// When set, login waits for a `notify_one` before answering
        pub hold_login: Option<Arc<Notify>>,
        /// Signalled as soon as a login call arrives
        pub login_entered: Arc<Notify>,
        /// When set, refresh waits for a `notify_one` before answering
        pub hold_refresh: Option<Arc<Notify>>,
        /// Signalled as soon as a refresh call arrives
        pub refresh_entered: Arc<Notify>,
    }

    impl ScriptedAuth {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_login(&self, result: ApiResult<TokenPair>) {
            self.logins.lock().unwrap().push_back(result);
        }

        pub fn push_refresh(&self, result: ApiResult<TokenPair>) {
            self.refreshes.lock().unwrap().push_back(result);
        }

        pub fn logins(&self) -> usize {
            self.login_calls.load(Ordering::SeqCst)
        }

        pub fn refreshes(&self) -> usize {
            self.refresh_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AuthService for ScriptedAuth {
        async fn obtain_pair(&self, _credentials: &Credentials) -> ApiResult<TokenPair> {
            self.login_calls.fetch_add(1, Ordering::SeqCst);
            self.login_entered.notify_one();
            if let Some(ref hold) = self.hold_login {
                hold.notified().await;
            }
            let next = self.logins.lock().unwrap().pop_front();
            next.unwrap_or(Err(ApiError::Unauthorized))
        }

        async fn refresh_pair(&self, refresh: &str) -> ApiResult<TokenPair> {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            self.refresh_tokens_seen
                .lock()
                .unwrap()
                .push(refresh.to_string());
            self.refresh_entered.notify_one();
            if let Some(ref hold) = self.hold_refresh {
                hold.notified().await;
            }
            let next = self.refreshes.lock().unwrap().pop_front();
            next.unwrap_or(Err(ApiError::Unauthorized))
        }
    }
}
