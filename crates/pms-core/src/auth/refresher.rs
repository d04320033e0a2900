//! Background renewal of the access token.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::service::AuthService;
use super::session::{RefreshOutcome, SessionStatus, SessionStore};

/// Access tokens live five minutes; renew one minute before that.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(4 * 60);

const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Handle to the refresh task. Dropping it stops the task.
pub struct SessionRefresher {
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl SessionRefresher {
    /// Start refreshing `session` every `period`.
    ///
    /// A session still loading is refreshed right away so startup resolves
    /// without waiting a full period.
    pub fn spawn<A: AuthService>(session: Arc<SessionStore<A>>, period: Duration) -> Self {
        let period = period.max(MIN_REFRESH_INTERVAL);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            if session.status() == SessionStatus::Loading {
                let outcome = session.refresh().await;
                debug!(?outcome, "Startup refresh finished");
            }

            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        if !session.has_tokens().await {
                            continue;
                        }
                        match session.refresh().await {
                            RefreshOutcome::LoggedOut => warn!("Session ended by refresh"),
                            outcome => debug!(?outcome, "Scheduled refresh finished"),
                        }
                    }
                }
            }
            debug!("Session refresher stopped");
        });

        Self {
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }

    /// Stop the task and wait for it to exit
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "Session refresher task failed");
            }
        }
    }
}

impl Drop for SessionRefresher {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
