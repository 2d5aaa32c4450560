use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Method, Response};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use super::middleware::AuthMiddleware;
use super::parse_error_response;
use crate::credentials::token::TokenManager;

/// Upper bound on a single request round-trip. The upstream services give no
/// guidance here; the consuming application must stay responsive even when
/// the remote side stalls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors raised by the shared HTTP executor.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Wrapper for `reqwest::Error`.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Wrapper for `reqwest_middleware::Error`.
    #[error("middleware error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),
    /// Any non-2xx response, with the provider's own error text preserved.
    #[error("{provider_message} (status {status_code})")]
    Status {
        status_code: u16,
        provider_message: String,
    },
    /// Wrapper for `serde_json::Error`.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Thin request executor shared by the Firestore and Identity Toolkit
/// clients. Attaches bearer tokens (via [`AuthMiddleware`], or an explicit
/// caller-supplied token), serializes JSON bodies and maps non-2xx responses
/// to [`TransportError::Status`].
#[derive(Clone)]
pub struct Transport {
    client: ClientWithMiddleware,
}

impl Transport {
    pub fn new(tokens: Arc<TokenManager>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");

        let client = ClientBuilder::new(client)
            .with(AuthMiddleware::new(tokens))
            .build();

        Self { client }
    }

    /// Sends a request without inspecting the response status. Callers that
    /// special-case particular statuses (the 404-means-absent rule on
    /// document fetches) go through here.
    pub(crate) async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
        bearer: Option<&str>,
    ) -> Result<Response, TransportError> {
        let mut request = self.client.request(method, url);

        if let Some(token) = bearer {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        if let Some(body) = body {
            request = request
                .header(header::CONTENT_TYPE, "application/json")
                .body(serde_json::to_vec(body)?);
        }

        Ok(request.send().await?)
    }

    /// Sends a request and decodes the 2xx response body as JSON.
    pub(crate) async fn request_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
        bearer: Option<&str>,
        context: &str,
    ) -> Result<T, TransportError> {
        let response = self.send(method, url, body, bearer).await?;

        if !response.status().is_success() {
            return Err(status_error(response, context).await);
        }

        Ok(response.json().await?)
    }

    /// Sends a request and returns the raw 2xx response body. Used for the
    /// query endpoint, whose body shape varies (see [`parse_streamed_array`]).
    pub(crate) async fn request_text<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
        bearer: Option<&str>,
        context: &str,
    ) -> Result<String, TransportError> {
        let response = self.send(method, url, body, bearer).await?;

        if !response.status().is_success() {
            return Err(status_error(response, context).await);
        }

        Ok(response.text().await?)
    }

    /// Sends a request, checks for 2xx and discards the response body.
    pub(crate) async fn request_unit<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
        bearer: Option<&str>,
        context: &str,
    ) -> Result<(), TransportError> {
        let response = self.send(method, url, body, bearer).await?;

        if !response.status().is_success() {
            return Err(status_error(response, context).await);
        }

        Ok(())
    }
}

/// Maps a non-2xx response to `TransportError::Status`, preserving the
/// provider's error text for diagnostics.
pub(crate) async fn status_error(response: Response, context: &str) -> TransportError {
    let status_code = response.status().as_u16();
    let provider_message = parse_error_response(response, context).await;
    TransportError::Status {
        status_code,
        provider_message,
    }
}

/// Decodes a response body that is either a JSON array or newline-delimited
/// JSON. The query endpoint returns both shapes for the same logical call, so
/// the array form is tried first and the body is split on newlines otherwise,
/// discarding lines that fail to parse.
pub(crate) fn parse_streamed_array<T: DeserializeOwned>(body: &str) -> Vec<T> {
    if let Ok(items) = serde_json::from_str::<Vec<T>>(body) {
        return items;
    }

    body.lines()
        .filter_map(|line| {
            let line = line.trim().trim_end_matches(',');
            if line.is_empty() || line == "[" || line == "]" {
                return None;
            }
            match serde_json::from_str::<T>(line) {
                Ok(item) => Some(item),
                Err(err) => {
                    warn!(error = %err, "discarding unparseable line in streamed query response");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::parse_streamed_array;
    use serde::Deserialize;

    #[derive(Deserialize, Debug, PartialEq)]
    struct Row {
        n: i64,
    }

    #[test]
    fn parses_json_array_body() {
        let rows: Vec<Row> = parse_streamed_array(r#"[{"n": 1}, {"n": 2}]"#);
        assert_eq!(rows, vec![Row { n: 1 }, Row { n: 2 }]);
    }

    #[test]
    fn falls_back_to_newline_delimited_body() {
        let body = "{\"n\": 1}\n{\"n\": 2}\nnot json\n{\"n\": 3}\n";
        let rows: Vec<Row> = parse_streamed_array(body);
        assert_eq!(rows, vec![Row { n: 1 }, Row { n: 2 }, Row { n: 3 }]);
    }

    #[test]
    fn tolerates_trailing_commas_between_lines() {
        let body = "[\n{\"n\": 1},\n{\"n\": 2}\n]";
        let rows: Vec<Row> = parse_streamed_array(body);
        assert_eq!(rows, vec![Row { n: 1 }, Row { n: 2 }]);
    }
}
