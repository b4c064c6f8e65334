//! Translation of non-success upstream responses into [`GatewayError`]s.
//!
//! The mapping is total: every status/body pair yields exactly one kind.
//! 401, 403 and 404 map to `Authentication`, `Authorization` and `NotFound`
//! whatever the body. 400, 409, 413, 415 and 422 are `Validation` only when
//! the body is a JSON object. Everything else is `Upstream`.

use serde_json::{Map, Value};

use crate::domain::{ErrorKind, GatewayError};

const PREVIEW_CHAR_LIMIT: usize = 160;

/// Translate `status` and the raw response `body` into a gateway error.
pub(crate) fn translate_status(status: u16, body: &str) -> GatewayError {
    let json_body = parse_error_object(body);
    let detail = json_body.as_ref().and_then(error_detail);

    let kind = match status {
        401 => ErrorKind::Authentication,
        403 => ErrorKind::Authorization,
        404 => ErrorKind::NotFound,
        400 | 409 | 413 | 415 | 422 if json_body.is_some() => ErrorKind::Validation,
        _ => ErrorKind::Upstream,
    };

    let message = match detail {
        Some(detail) => detail,
        None => fallback_message(kind, status, body),
    };

    let error = GatewayError::new(kind, message).with_status(status);
    if body.trim().is_empty() {
        error
    } else {
        error.with_raw_body(body)
    }
}

fn parse_error_object(body: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn error_detail(body: &Map<String, Value>) -> Option<String> {
    ["message", "error", "code"]
        .into_iter()
        .filter_map(|key| body.get(key))
        .find_map(|value| match value {
            Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        })
}

fn fallback_message(kind: ErrorKind, status: u16, body: &str) -> String {
    match kind {
        ErrorKind::Authentication => "upstream rejected the session token".to_owned(),
        ErrorKind::Authorization => "upstream denied access to the resource".to_owned(),
        ErrorKind::NotFound => "resource does not exist upstream".to_owned(),
        _ => {
            let preview = body_preview(body);
            if preview.is_empty() {
                format!("upstream responded with status {status}")
            } else {
                format!("upstream responded with status {status}: {preview}")
            }
        }
    }
}

fn body_preview(body: &str) -> String {
    let compact = body.split_whitespace().collect::<Vec<_>>().join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Status and body classification.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::unauthorized_json(401, r#"{"error":"invalid_token"}"#, ErrorKind::Authentication)]
    #[case::unauthorized_html(401, "<html>nope</html>", ErrorKind::Authentication)]
    #[case::forbidden_empty(403, "", ErrorKind::Authorization)]
    #[case::not_found_text(404, "Not Found", ErrorKind::NotFound)]
    #[case::bad_request_json(400, r#"{"message":"recipeName too long"}"#, ErrorKind::Validation)]
    #[case::conflict_json(409, r#"{"code":"DUPLICATE"}"#, ErrorKind::Validation)]
    #[case::unprocessable_json(422, "{}", ErrorKind::Validation)]
    #[case::bad_request_text(400, "bad", ErrorKind::Upstream)]
    #[case::teapot_json(418, r#"{"message":"teapot"}"#, ErrorKind::Upstream)]
    #[case::rate_limited(429, "", ErrorKind::Upstream)]
    #[case::server_error_json(500, r#"{"error":"boom"}"#, ErrorKind::Upstream)]
    #[case::bad_gateway_html(502, "<html>502</html>", ErrorKind::Upstream)]
    fn statuses_map_to_kinds(#[case] status: u16, #[case] body: &str, #[case] expected: ErrorKind) {
        let error = translate_status(status, body);
        assert_eq!(error.kind(), expected);
        assert_eq!(error.status_code(), Some(status));
    }

    #[test]
    fn json_message_wins_over_error_and_code() {
        let error = translate_status(400, r#"{"code":7,"error":"e","message":"m"}"#);
        assert_eq!(error.message(), "m");
        let error = translate_status(400, r#"{"code":7}"#);
        assert_eq!(error.message(), "7");
    }

    #[test]
    fn non_json_body_is_kept_raw() {
        let error = translate_status(503, "Service   Unavailable\n");
        assert_eq!(error.kind(), ErrorKind::Upstream);
        assert_eq!(error.raw_body(), Some("Service   Unavailable\n"));
        assert_eq!(
            error.message(),
            "upstream responded with status 503: Service Unavailable"
        );
        assert!(error.is_retryable());
    }

    #[test]
    fn json_arrays_are_not_error_objects() {
        assert_eq!(translate_status(422, "[1,2]").kind(), ErrorKind::Upstream);
    }

    #[test]
    fn long_bodies_are_truncated_in_message() {
        let body = "x".repeat(400);
        let error = translate_status(500, &body);
        assert!(error.message().ends_with("..."));
        assert_eq!(error.raw_body().map(str::len), Some(400));
    }
}
