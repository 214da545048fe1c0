//! Thin HTTP client to the upstream engine (spec §4.4).
//!
//! Grounded on `async-openai::http_client::HttpClient`'s `reqwest::Client`
//! implementation, trimmed to the two shapes this gateway actually needs:
//! a JSON POST that returns a decoded body, and a raw byte-chunk stream for
//! proxying SSE without re-framing it. The teacher's `request_stream` parses
//! each chunk into an `SseEvent` via `reqwest_eventsource`; spec §4.4 instead
//! wants "opaque byte chunks preserving framing", so this client streams
//! `reqwest::Response::bytes_stream()` directly rather than decoding events.

use std::time::Duration;

use bytes::Bytes;
use futures::Stream;
use serde_json::Value;

use crate::error::EngineError;

/// Result of a non-streaming engine call (spec §4.4: "Returns `{status,
/// body_json}` for non-streaming").
#[derive(Debug, Clone)]
pub struct EngineResponse {
    pub status: u16,
    pub body: Value,
}

#[derive(Clone)]
pub struct EngineClient {
    http: reqwest::Client,
    base_url: String,
}

impl EngineClient {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client builds with a well-formed timeout");
        Self { http, base_url }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), endpoint)
    }

    /// JSON POST with the client's configured timeout, decoding the body as
    /// JSON regardless of status (spec §4.4, §7 UpstreamStatus).
    pub async fn post_json(&self, endpoint: &str, body: &Value) -> Result<EngineResponse, EngineError> {
        let response = self
            .http
            .post(self.url(endpoint))
            .json(body)
            .send()
            .await
            .map_err(EngineError::from_reqwest)?;

        let status = response.status().as_u16();
        let body = response
            .json::<Value>()
            .await
            .map_err(EngineError::Decode)?;

        Ok(EngineResponse { status, body })
    }

    /// Opens a streaming POST and hands back the response status plus a
    /// stream of opaque byte chunks (spec §4.4). The caller is responsible
    /// for proxying the chunks to the client untouched.
    pub async fn post_stream(
        &self,
        endpoint: &str,
        body: &Value,
    ) -> Result<
        (
            u16,
            impl Stream<Item = Result<Bytes, EngineError>>,
        ),
        EngineError,
    > {
        use futures::TryStreamExt;

        let response = self
            .http
            .post(self.url(endpoint))
            .json(body)
            .send()
            .await
            .map_err(EngineError::from_reqwest)?;

        let status = response.status().as_u16();
        let stream = response.bytes_stream().map_err(EngineError::Decode);
        Ok((status, stream))
    }
}
