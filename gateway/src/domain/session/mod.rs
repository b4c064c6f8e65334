//! Session token lifecycle manager.
//!
//! The manager owns the only mutable session state in the process. It moves
//! between three states:
//!
//! - *unauthenticated*: no usable token in memory;
//! - *logging in*: exactly one login exchange is in flight, shared by every
//!   caller that needs a token meanwhile;
//! - *authenticated*: a token that outlives `now + refresh_margin`.
//!
//! The durable cache is consulted once, on the first request, and rewritten
//! after every successful login. Login runs on its own task so a waiter that
//! gives up does not strand the exchange half way. Logout starts a new
//! generation; a login begun in an earlier generation is discarded when it
//! lands instead of being installed or persisted.

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use futures::future::{BoxFuture, FutureExt, Shared};
use mockable::Clock;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::ports::{TokenCache, TokenIssuer};
use super::{Credential, GatewayError};

mod token;

pub use token::{CachedTokenRecord, SessionToken};

type LoginFlight = Shared<BoxFuture<'static, Result<SessionToken, GatewayError>>>;

/// Default safety margin before expiry at which a token is renewed.
pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Port bundle required by the session manager.
pub struct SessionPorts {
    /// Login exchange adapter.
    pub issuer: Arc<dyn TokenIssuer>,
    /// Durable token record adapter.
    pub cache: Arc<dyn TokenCache>,
}

impl SessionPorts {
    /// Build a strongly-typed session port bundle.
    pub fn new(issuer: Arc<dyn TokenIssuer>, cache: Arc<dyn TokenCache>) -> Self {
        Self { issuer, cache }
    }
}

#[derive(Default)]
struct SessionState {
    token: Option<SessionToken>,
    cache_loaded: bool,
    in_flight: Option<LoginFlight>,
    generation: u64,
}

struct SessionInner {
    credential: Option<Credential>,
    issuer: Arc<dyn TokenIssuer>,
    cache: Arc<dyn TokenCache>,
    clock: Arc<dyn Clock>,
    refresh_margin: TimeDelta,
    state: Mutex<SessionState>,
}

/// Shared handle to the process-wide session.
///
/// Cloning is cheap; all clones observe the same token.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

impl SessionManager {
    /// Build a manager. `credential` may be absent when only a cached token
    /// is expected to be used.
    pub fn new(
        credential: Option<Credential>,
        ports: SessionPorts,
        clock: Arc<dyn Clock>,
        refresh_margin: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                credential,
                issuer: ports.issuer,
                cache: ports.cache,
                clock,
                refresh_margin: TimeDelta::from_std(refresh_margin).unwrap_or(TimeDelta::MAX),
                state: Mutex::new(SessionState::default()),
            }),
        }
    }

    /// Return an access token valid beyond the refresh margin.
    ///
    /// Reuses the in-memory token without I/O while it is fresh, otherwise
    /// consults the durable cache once and finally logs in. Concurrent
    /// callers share one login exchange and observe the same outcome.
    ///
    /// # Errors
    ///
    /// - `Authentication` when no credential is configured, the login was
    ///   rejected, or the token response was unusable.
    /// - `UpstreamUnavailable` when the token endpoint was unreachable or
    ///   `cancel` fired.
    pub async fn get_valid_token(
        &self,
        cancel: &CancellationToken,
    ) -> Result<String, GatewayError> {
        let flight = {
            let mut state = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(GatewayError::cancelled()),
                state = self.inner.state.lock() => state,
            };
            self.inner.load_cache_once(&mut state).await;

            let now = self.inner.clock.utc();
            if let Some(token) = state
                .token
                .as_ref()
                .filter(|token| token.is_fresh(now, self.inner.refresh_margin))
            {
                return Ok(token.access_token().to_owned());
            }

            if let Some(flight) = state.in_flight.clone() {
                flight
            } else {
                let flight = self.inner.start_login(state.generation)?;
                state.in_flight = Some(flight.clone());
                flight
            }
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(GatewayError::cancelled()),
            outcome = flight => outcome.map(|token| token.access_token().to_owned()),
        }
    }

    /// Upstream subject of the current token, when known.
    pub async fn subject_id(&self) -> Option<String> {
        let state = self.inner.state.lock().await;
        state
            .token
            .as_ref()
            .and_then(SessionToken::subject_id)
            .map(str::to_owned)
    }

    /// Drop `rejected_token` after upstream refused it.
    ///
    /// The durable record is removed as well so the next call logs in. A
    /// token that has since been replaced by a newer login is kept.
    pub async fn invalidate(&self, rejected_token: &str) {
        let mut state = self.inner.state.lock().await;
        let matches_current = state
            .token
            .as_ref()
            .is_some_and(|token| token.access_token() == rejected_token);
        if !matches_current {
            return;
        }
        state.token = None;
        state.cache_loaded = true;
        drop(state);

        debug!("session token rejected upstream; discarding");
        if let Err(error) = self.inner.cache.clear().await {
            warn!(error = %error, "failed to clear token cache after rejection");
        }
    }

    /// Discard the session locally and ask upstream to forget it.
    ///
    /// A login still in flight is detached and its token dropped when it
    /// arrives. Never fails: remote and cache errors are logged only.
    pub async fn logout(&self, cancel: &CancellationToken) {
        let token = {
            let mut state = self.inner.state.lock().await;
            state.cache_loaded = true;
            state.generation = state.generation.wrapping_add(1);
            if state.in_flight.take().is_some() {
                debug!("detaching login in flight");
            }
            state.token.take()
        };

        if let Err(error) = self.inner.cache.clear().await {
            warn!(error = %error, "failed to clear token cache on logout");
        }

        let Some(token) = token else {
            debug!("logout without an active session");
            return;
        };

        let revoke = self.inner.issuer.revoke(token.access_token());
        tokio::select! {
            biased;
            () = cancel.cancelled() => warn!("logout cancelled before upstream acknowledged"),
            outcome = revoke => match outcome {
                Ok(()) => info!("upstream session revoked"),
                Err(error) => warn!(error = %error, "upstream logout failed"),
            },
        }
    }
}

impl SessionInner {
    async fn load_cache_once(&self, state: &mut SessionState) {
        if state.cache_loaded || state.token.is_some() {
            return;
        }
        state.cache_loaded = true;

        let record = match self.cache.load().await {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!("no cached session token");
                return;
            }
            Err(error) => {
                warn!(error = %error, "ignoring unreadable token cache");
                return;
            }
        };

        let now = self.clock.utc();
        match SessionToken::from_record(record) {
            Some(token) if token.is_fresh(now, self.refresh_margin) => {
                debug!(expires_at = %token.expires_at(), "restored cached session token");
                state.token = Some(token);
            }
            Some(token) => {
                debug!(expires_at = %token.expires_at(), "cached session token is stale");
            }
            None => warn!("discarding inconsistent cached token record"),
        }
    }

    fn start_login(self: &Arc<Self>, generation: u64) -> Result<LoginFlight, GatewayError> {
        let Some(credential) = self.credential.clone() else {
            return Err(GatewayError::authentication("no upstream credentials configured"));
        };

        let inner = Arc::clone(self);
        let task = tokio::spawn(async move {
            let outcome = inner.login(&credential).await;
            let mut state = inner.state.lock().await;
            if state.generation != generation {
                debug!("session logged out during login; discarding issued token");
                return Err(GatewayError::authentication("session was logged out while logging in"));
            }
            state.in_flight = None;
            let token = outcome?;
            if let Err(error) = inner.cache.store(&token.to_record(token.issued_at())).await {
                warn!(error = %error, "failed to persist session token; keeping it in memory");
            }
            state.token = Some(token.clone());
            Ok(token)
        });

        Ok(async move {
            task.await.unwrap_or_else(|error| {
                Err(GatewayError::authentication(format!("login task failed: {error}")))
            })
        }
        .boxed()
        .shared())
    }

    async fn login(&self, credential: &Credential) -> Result<SessionToken, GatewayError> {
        debug!("exchanging credentials for a session token");
        let issued = match self.issuer.issue(credential).await {
            Ok(issued) => issued,
            Err(error) => {
                warn!(error = %error, "upstream login failed");
                return Err(error.into());
            }
        };

        let token = SessionToken::from_issued(issued, self.clock.utc())?;
        info!(expires_at = %token.expires_at(), "upstream login succeeded");
        Ok(token)
    }
}
