//! Reqwest-backed upstream transport.
//!
//! This adapter owns transport details only: client timeout, identity
//! headers, body encoding and transport error mapping. Status codes are
//! passed through untouched.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};

use crate::domain::ports::{
    HttpMethod, RequestBody, TransportError, UpstreamRequest, UpstreamResponse, UpstreamTransport,
};

/// Default user agent sent upstream.
pub const DEFAULT_USER_AGENT: &str = "recipe-gateway/0.1";

/// Transport performing real HTTP requests.
pub struct ReqwestTransport {
    client: Client,
    user_agent: String,
}

impl ReqwestTransport {
    /// Build a transport using a reqwest client with an explicit request
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(timeout: Duration, user_agent: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            user_agent: user_agent.into(),
        })
    }
}

#[async_trait]
impl UpstreamTransport for ReqwestTransport {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, TransportError> {
        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), request.url)
            .header(reqwest::header::USER_AGENT, self.user_agent.as_str())
            .header(reqwest::header::ACCEPT, "application/json");
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(body),
            RequestBody::Form(fields) => builder.form(fields),
        };

        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|error| TransportError::body(error.to_string()))?;
        Ok(UpstreamResponse::new(
            status,
            String::from_utf8_lossy(&body).into_owned(),
        ))
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn map_transport_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::timeout(error.to_string())
    } else {
        TransportError::connect(error.to_string())
    }
}
