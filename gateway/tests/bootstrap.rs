//! Wiring from environment settings to a working gateway.

use std::ffi::OsString;
use std::sync::Arc;

use env_lock::lock_env;
use ortho_config::OrthoConfig;
use recipe_gateway::GatewaySettings;
use recipe_gateway::bootstrap::{BootstrapError, build_gateway, build_transport};
use recipe_gateway::test_support::ScriptedTransport;
use rstest::rstest;
use serde_json::json;
use tokio_util::sync::CancellationToken;

const VARS: [&str; 8] = [
    "RECIPE_GATEWAY_EMAIL",
    "RECIPE_GATEWAY_PASSWORD",
    "RECIPE_GATEWAY_BASE_URL",
    "RECIPE_GATEWAY_AUTH_BASE_URL",
    "RECIPE_GATEWAY_COUNTRY_CODE",
    "RECIPE_GATEWAY_AUTH_STYLE",
    "RECIPE_GATEWAY_TOKEN_CACHE_PATH",
    "RECIPE_GATEWAY_FIXTURE_MODE",
];

fn settings_from(overrides: &[(&str, String)]) -> GatewaySettings {
    let _guard = lock_env(VARS.map(|name| {
        let value = overrides
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.clone());
        (name, value)
    }));
    GatewaySettings::load_from_iter([OsString::from("recipe-gateway")])
        .expect("config should load")
}

fn credentials() -> Vec<(&'static str, String)> {
    vec![
        ("RECIPE_GATEWAY_EMAIL", "cook@example.com".to_owned()),
        ("RECIPE_GATEWAY_PASSWORD", "s3cret".to_owned()),
    ]
}

#[rstest]
#[tokio::test]
async fn fixture_mode_validates_without_network() {
    let mut overrides = credentials();
    overrides.push(("RECIPE_GATEWAY_FIXTURE_MODE", "true".to_owned()));
    let settings = settings_from(&overrides);
    let transport = Arc::new(ScriptedTransport::new());

    let gateway = build_gateway(&settings, transport.clone()).expect("gateway builds");
    let valid = gateway
        .validate_session(&CancellationToken::new())
        .await
        .expect("validation completes");

    assert!(valid);
    assert!(transport.requests().is_empty());
}

#[rstest]
#[tokio::test]
async fn missing_credentials_make_the_session_invalid() {
    let settings = settings_from(&[("RECIPE_GATEWAY_FIXTURE_MODE", "true".to_owned())]);
    let gateway =
        build_gateway(&settings, Arc::new(ScriptedTransport::new())).expect("gateway builds");

    let valid = gateway
        .validate_session(&CancellationToken::new())
        .await
        .expect("validation completes");
    assert!(!valid);
}

#[rstest]
#[tokio::test]
async fn network_mode_logs_in_checks_the_profile_and_persists() {
    let dir = tempfile::tempdir().expect("temp dir");
    let cache_path = dir.path().join("state").join("token.json");
    let mut overrides = credentials();
    overrides.push(("RECIPE_GATEWAY_COUNTRY_CODE", "international".to_owned()));
    overrides.push(("RECIPE_GATEWAY_AUTH_STYLE", "cookie".to_owned()));
    overrides.push((
        "RECIPE_GATEWAY_TOKEN_CACHE_PATH",
        cache_path.display().to_string(),
    ));
    let settings = settings_from(&overrides);

    let transport = Arc::new(ScriptedTransport::new());
    transport.push_json(
        200,
        json!({"access_token": "at-1", "expires_in": 3600, "token_type": "bearer"}),
    );
    transport.push_json(200, json!({"userInfo": {"username": "koch"}}));

    let gateway = build_gateway(&settings, transport.clone()).expect("gateway builds");
    let valid = gateway
        .validate_session(&CancellationToken::new())
        .await
        .expect("validation completes");

    assert!(valid);
    let requests = transport.requests();
    assert_eq!(
        requests[0].url.as_str(),
        "https://xp.tmmobile.vorwerk-digital.com/ciam/auth/token"
    );
    assert_eq!(
        requests[1].header_value("Cookie"),
        Some("_oauth2_proxy=at-1")
    );
    let stored = std::fs::read_to_string(&cache_path).expect("token persisted");
    assert!(stored.contains("\"accessToken\":\"at-1\""));
}

#[rstest]
fn unknown_auth_style_fails_the_build() {
    let settings = settings_from(&[("RECIPE_GATEWAY_AUTH_STYLE", "digest".to_owned())]);

    let err = build_gateway(&settings, Arc::new(ScriptedTransport::new()))
        .err()
        .expect("build fails");
    assert!(matches!(err, BootstrapError::AuthStyle(_)));
}

#[rstest]
fn invalid_base_url_fails_the_build() {
    let settings = settings_from(&[("RECIPE_GATEWAY_BASE_URL", "not a url".to_owned())]);

    let err = build_gateway(&settings, Arc::new(ScriptedTransport::new()))
        .err()
        .expect("build fails");
    assert!(matches!(err, BootstrapError::Endpoint(_)));
}

#[rstest]
fn transport_builds_from_defaults() {
    let settings = settings_from(&[]);
    assert!(build_transport(&settings).is_ok());
}
