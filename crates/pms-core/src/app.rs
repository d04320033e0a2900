//! Application root: wires configuration, token storage, the session store
//! and its refresher together.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::api::{ApiClient, ApiResult};
use crate::auth::{
    Credentials, LoginError, Session, SessionRefresher, SessionStatus, SessionStore, TokenStore,
};
use crate::config::Config;
use crate::models::Registration;
use crate::routes::{self, GateDecision, Route};

pub struct App {
    config: Config,
    api: ApiClient,
    session: Arc<SessionStore<ApiClient>>,
    refresher: Option<SessionRefresher>,
}

impl App {
    /// Open the configured token store and start the session.
    pub async fn start(config: Config) -> Result<Self> {
        let cache_dir = config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
        debug!(?cache_dir, storage = ?config.token_storage, "Cache directory configured");

        let store = config
            .token_storage
            .open(&cache_dir, config.passphrase.as_deref())?;
        Self::start_with(config, store).await
    }

    /// Start with an explicit token store.
    ///
    /// Restores the persisted pair, starts the refresher and returns once the
    /// startup refresh has decided between authenticated and guest.
    pub async fn start_with(config: Config, store: Arc<dyn TokenStore>) -> Result<Self> {
        let api = ApiClient::new(&config.api_url, config.request_timeout())
            .context("Failed to create API client")?;
        debug!(api_url = %api.base_url(), "API client ready");

        let session = Arc::new(SessionStore::new(api.clone(), store));
        session.restore().await;

        let refresher = SessionRefresher::spawn(session.clone(), config.refresh_interval());
        let status = session.wait_until_resolved().await;
        info!(?status, "Session ready");

        Ok(Self {
            config,
            api,
            session,
            refresher: Some(refresher),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn session(&self) -> &Arc<SessionStore<ApiClient>> {
        &self.session
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }

    pub async fn snapshot(&self) -> Session {
        self.session.snapshot().await
    }

    /// API client carrying the current access token, if any
    pub async fn api(&self) -> ApiClient {
        self.api.with_token(self.session.access_token().await)
    }

    pub async fn gate(&self, route: &Route) -> GateDecision {
        routes::gate(&self.session.snapshot().await, route)
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<Route, LoginError> {
        self.session.login(credentials).await
    }

    pub async fn logout(&self) {
        self.session.logout().await;
    }

    pub async fn register(&self, registration: &Registration) -> ApiResult<serde_json::Value> {
        self.api.register(registration).await
    }

    pub async fn request_password_reset(&self, email: &str) -> ApiResult<serde_json::Value> {
        let redirect = self.config.password_reset_redirect();
        self.api.request_password_reset(email, &redirect).await
    }

    /// Finish a reset started from an emailed link.
    pub async fn complete_password_reset(
        &self,
        link: &Route,
        password: &str,
    ) -> Result<serde_json::Value> {
        let Route::ResetPassword { uidb64, token } = link else {
            anyhow::bail!("Not a password reset link: {}", link);
        };
        Ok(self
            .api
            .complete_password_reset(password, token, uidb64)
            .await?)
    }

    /// Stop the refresher and wait for it to exit
    pub async fn shutdown(mut self) {
        if let Some(refresher) = self.refresher.take() {
            refresher.shutdown().await;
        }
        debug!("App shut down");
    }
}
