//! Session token value types.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::GatewayError;
use crate::domain::ports::IssuedToken;

/// Token owned by the session manager.
///
/// ## Invariants
/// - `expires_at > issued_at`.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken {
    access_token: String,
    refresh_token: Option<String>,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    subject_id: Option<String>,
}

impl SessionToken {
    /// Build a token from a login response received at `issued_at`.
    ///
    /// # Errors
    ///
    /// Returns an authentication error when the declared lifetime is not
    /// positive or overflows the calendar.
    pub fn from_issued(
        issued: IssuedToken,
        issued_at: DateTime<Utc>,
    ) -> Result<Self, GatewayError> {
        if issued.expires_in_secs <= 0 {
            return Err(GatewayError::authentication(format!(
                "token response declared a non-positive lifetime of {}s",
                issued.expires_in_secs
            )));
        }
        let expires_at = TimeDelta::try_seconds(issued.expires_in_secs)
            .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
            .ok_or_else(|| GatewayError::authentication("token lifetime is out of range"))?;

        Ok(Self {
            access_token: issued.access_token,
            refresh_token: issued.refresh_token,
            issued_at,
            expires_at,
            subject_id: issued.subject_id,
        })
    }

    /// Rebuild a token from the durable record.
    ///
    /// Returns `None` when the record is internally inconsistent.
    pub fn from_record(record: CachedTokenRecord) -> Option<Self> {
        if record.access_token.is_empty() || record.expires_at <= record.saved_at {
            return None;
        }
        Some(Self {
            access_token: record.access_token,
            refresh_token: None,
            issued_at: record.saved_at,
            expires_at: record.expires_at,
            subject_id: record.subject_id,
        })
    }

    /// Record persisted after a login.
    pub fn to_record(&self, saved_at: DateTime<Utc>) -> CachedTokenRecord {
        let record = CachedTokenRecord::new(self.access_token.clone(), self.expires_at, saved_at);
        match &self.subject_id {
            Some(subject_id) => record.with_subject_id(subject_id.clone()),
            None => record,
        }
    }

    /// Return whether the token outlives `now + margin`.
    ///
    /// The margin is capped at half the token's lifetime so a short-lived
    /// token is still reused for the first half of its life.
    pub fn is_fresh(&self, now: DateTime<Utc>, margin: TimeDelta) -> bool {
        let half_life = (self.expires_at - self.issued_at) / 2;
        now.checked_add_signed(margin.min(half_life))
            .is_some_and(|deadline| self.expires_at > deadline)
    }

    /// Opaque access token string.
    pub fn access_token(&self) -> &str {
        self.access_token.as_str()
    }

    /// Refresh token, when the server issued one.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Issuance instant.
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Expiry instant.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Upstream user identifier.
    pub fn subject_id(&self) -> Option<&str> {
        self.subject_id.as_deref()
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionToken")
            .field("access_token", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .field("subject_id", &self.subject_id)
            .finish()
    }
}

/// Durable form of the last issued token.
///
/// Serialised as `{"accessToken", "expiresAt", "savedAt"}` plus `subjectId`
/// when the login response named the user.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedTokenRecord {
    /// Opaque access token.
    pub access_token: String,
    /// Expiry instant.
    pub expires_at: DateTime<Utc>,
    /// When the record was written.
    pub saved_at: DateTime<Utc>,
    /// Upstream user identifier from the login response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
}

impl CachedTokenRecord {
    /// Build a record.
    pub fn new(
        access_token: impl Into<String>,
        expires_at: DateTime<Utc>,
        saved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at,
            saved_at,
            subject_id: None,
        }
    }

    /// Attach the upstream user identifier.
    pub fn with_subject_id(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = Some(subject_id.into());
        self
    }
}

impl fmt::Debug for CachedTokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedTokenRecord")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("saved_at", &self.saved_at)
            .field("subject_id", &self.subject_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;
    use chrono::TimeZone;
    use rstest::rstest;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .expect("valid time")
    }

    fn issued(expires_in_secs: i64) -> IssuedToken {
        IssuedToken {
            access_token: "tok".to_owned(),
            refresh_token: Some("ref".to_owned()),
            expires_in_secs,
            subject_id: Some("sub-1".to_owned()),
        }
    }

    #[test]
    fn expiry_is_issuance_plus_lifetime() {
        let token = SessionToken::from_issued(issued(3_600), noon()).expect("valid lifetime");
        assert_eq!(token.expires_at(), noon() + TimeDelta::hours(1));
        assert_eq!(token.refresh_token(), Some("ref"));
        assert_eq!(token.subject_id(), Some("sub-1"));
    }

    #[rstest]
    #[case::zero(0)]
    #[case::negative(-30)]
    fn non_positive_lifetimes_are_rejected(#[case] lifetime: i64) {
        let err = SessionToken::from_issued(issued(lifetime), noon()).expect_err("must reject");
        assert_eq!(err.kind(), ErrorKind::Authentication);
    }

    #[rstest]
    #[case::well_before(3_600, 0, true)]
    #[case::just_outside_margin(3_600, 3_539, true)]
    #[case::exactly_at_margin(3_600, 3_540, false)]
    #[case::short_lifetime_at_issue(30, 0, true)]
    #[case::short_lifetime_before_half(30, 14, true)]
    #[case::short_lifetime_at_half(30, 15, false)]
    #[case::margin_sized_lifetime(60, 29, true)]
    fn freshness_applies_margin(#[case] lifetime: i64, #[case] elapsed: i64, #[case] fresh: bool) {
        let token = SessionToken::from_issued(issued(lifetime), noon()).expect("valid lifetime");
        let now = noon() + TimeDelta::seconds(elapsed);
        assert_eq!(token.is_fresh(now, TimeDelta::seconds(60)), fresh);
    }

    #[test]
    fn record_uses_camel_case_fields() {
        let token = SessionToken::from_issued(issued(60), noon()).expect("valid lifetime");
        let json = serde_json::to_value(token.to_record(noon())).expect("serialise");
        assert_eq!(json["accessToken"], "tok");
        assert!(json.get("expiresAt").is_some());
        assert!(json.get("savedAt").is_some());
    }

    #[test]
    fn subject_survives_the_durable_record() {
        let token = SessionToken::from_issued(issued(3_600), noon()).expect("valid lifetime");
        let json = serde_json::to_value(token.to_record(noon())).expect("serialise");
        assert_eq!(json["subjectId"], "sub-1");

        let record: CachedTokenRecord = serde_json::from_value(json).expect("deserialise");
        let restored = SessionToken::from_record(record).expect("consistent record");
        assert_eq!(restored.subject_id(), Some("sub-1"));
    }

    #[test]
    fn records_without_subject_still_load() {
        let json = serde_json::json!({
            "accessToken": "tok",
            "expiresAt": "2026-03-01T13:00:00Z",
            "savedAt": "2026-03-01T12:00:00Z"
        });
        let record: CachedTokenRecord = serde_json::from_value(json).expect("deserialise");
        assert!(record.subject_id.is_none());
    }

    #[test]
    fn inconsistent_records_are_discarded() {
        let record = CachedTokenRecord::new("tok", noon(), noon());
        assert!(SessionToken::from_record(record).is_none());
    }
}
