//! Test utilities for the gateway crate.
//!
//! This module provides shared doubles for unit tests (in `src/`) and
//! integration tests (in `tests/`). It is only compiled for tests or with the
//! `test-support` feature.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use camino::Utf8PathBuf;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::Credential;
use crate::domain::ports::{
    IssuedToken, RetrySleeper, TokenIssuer, TokenIssuerError, TransportError, UpstreamRequest,
    UpstreamResponse, UpstreamTransport,
};
use crate::outbound::cache::FileTokenCache;

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("{what} mutex"),
    }
}

/// Fixed instant used as "now" across tests.
pub fn fixed_now() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single() {
        Some(now) => now,
        None => panic!("fixed test instant is ambiguous"),
    }
}

/// Credential accepted by the scripted issuer.
pub fn sample_credential() -> Credential {
    match Credential::try_from_parts("cook@example.com", "s3cret") {
        Ok(credential) => credential,
        Err(error) => panic!("sample credential: {error}"),
    }
}

/// Clock that only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: Duration) {
        let delta = match TimeDelta::from_std(delta) {
            Ok(delta) => delta,
            Err(error) => {
                panic!("failed to convert Duration to TimeDelta: {error}; delta={delta:?}")
            }
        };
        *lock(&self.0, "clock") += delta;
    }

    pub fn advance_seconds(&self, seconds: i64) {
        *lock(&self.0, "clock") += TimeDelta::seconds(seconds);
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *lock(&self.0, "clock")
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateSleeper;

#[async_trait]
impl RetrySleeper for ImmediateSleeper {
    async fn sleep(&self, _duration: Duration) {}
}

/// Sleeper that returns at once and remembers every requested pause.
#[derive(Default)]
pub struct RecordingSleeper(pub Mutex<Vec<Duration>>);

impl RecordingSleeper {
    pub fn recorded(&self) -> Vec<Duration> {
        lock(&self.0, "sleeper").clone()
    }
}

#[async_trait]
impl RetrySleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        lock(&self.0, "sleeper").push(duration);
    }
}

/// Transport replaying queued outcomes in order and logging every request.
///
/// Once the queue is drained every request fails with a connect error.
#[derive(Default)]
pub struct ScriptedTransport {
    outcomes: Mutex<VecDeque<Result<UpstreamResponse, TransportError>>>,
    requests: Mutex<Vec<UpstreamRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, response: UpstreamResponse) {
        lock(&self.outcomes, "transport outcomes").push_back(Ok(response));
    }

    pub fn push_json(&self, status: u16, body: serde_json::Value) {
        self.push_response(UpstreamResponse::new(status, body.to_string()));
    }

    pub fn push_error(&self, error: TransportError) {
        lock(&self.outcomes, "transport outcomes").push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<UpstreamRequest> {
        lock(&self.requests, "transport requests").clone()
    }

    pub fn remaining(&self) -> usize {
        lock(&self.outcomes, "transport outcomes").len()
    }
}

#[async_trait]
impl UpstreamTransport for ScriptedTransport {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, TransportError> {
        lock(&self.requests, "transport requests").push(request);
        lock(&self.outcomes, "transport outcomes")
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::connect("no scripted response")))
    }
}

/// Issuer counting logins and revocations.
///
/// Unscripted logins succeed with `token-<n>` and the default lifetime.
pub struct ScriptedTokenIssuer {
    outcomes: Mutex<VecDeque<Result<IssuedToken, TokenIssuerError>>>,
    issued: AtomicUsize,
    revoked: Mutex<Vec<String>>,
    lifetime_secs: i64,
    delay: Duration,
}

impl Default for ScriptedTokenIssuer {
    fn default() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            issued: AtomicUsize::new(0),
            revoked: Mutex::new(Vec::new()),
            lifetime_secs: 3_600,
            delay: Duration::ZERO,
        }
    }
}

impl ScriptedTokenIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_lifetime_secs(mut self, lifetime_secs: i64) -> Self {
        self.lifetime_secs = lifetime_secs;
        self
    }

    /// Make each login take `delay` of (tokio) time.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn push_outcome(&self, outcome: Result<IssuedToken, TokenIssuerError>) {
        lock(&self.outcomes, "issuer outcomes").push_back(outcome);
    }

    pub fn issue_count(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }

    pub fn revoked(&self) -> Vec<String> {
        lock(&self.revoked, "issuer revocations").clone()
    }
}

#[async_trait]
impl TokenIssuer for ScriptedTokenIssuer {
    async fn issue(&self, _credential: &Credential) -> Result<IssuedToken, TokenIssuerError> {
        let call = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let scripted = lock(&self.outcomes, "issuer outcomes").pop_front();
        scripted.unwrap_or_else(|| {
            Ok(IssuedToken {
                access_token: format!("token-{call}"),
                refresh_token: None,
                expires_in_secs: self.lifetime_secs,
                subject_id: Some("user-1".to_owned()),
            })
        })
    }

    async fn revoke(&self, access_token: &str) -> Result<(), TokenIssuerError> {
        lock(&self.revoked, "issuer revocations").push(access_token.to_owned());
        Ok(())
    }
}

/// File cache inside a fresh temporary directory.
///
/// Keep the returned directory alive for as long as the cache is used.
pub fn temp_file_cache() -> (tempfile::TempDir, FileTokenCache) {
    let dir = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(error) => panic!("temp dir: {error}"),
    };
    let path = match Utf8PathBuf::from_path_buf(dir.path().join("session-token.json")) {
        Ok(path) => path,
        Err(path) => panic!("temp path is not UTF-8: {}", path.display()),
    };
    (dir, FileTokenCache::new(path))
}
