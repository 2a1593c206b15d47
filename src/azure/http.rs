//! HTTP utilities for Azure Resource Manager REST calls

use super::error::AzureError;
use reqwest::header::{HeaderMap, LOCATION, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Header carrying the long-running operation status URL
pub const ASYNC_OPERATION_HEADER: &str = "azure-asyncoperation";

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// ARM error envelope: `{"error": {"code": ..., "message": ...}}`
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Response of a PUT, with the headers needed to follow a long-running operation
#[derive(Debug)]
pub struct PutResponse {
    pub status: StatusCode,
    pub body: Value,
    pub async_operation: Option<String>,
    pub location: Option<String>,
    pub retry_after: Option<Duration>,
}

/// Response of an operation status poll
#[derive(Debug)]
pub struct PollResponse {
    pub status: StatusCode,
    pub body: Value,
    pub retry_after: Option<Duration>,
}

/// HTTP client wrapper for ARM calls
#[derive(Clone)]
pub struct AzureHttpClient {
    client: Client,
}

impl AzureHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self, AzureError> {
        let client = Client::builder()
            .user_agent(concat!("azdeploy/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    /// Make a GET request
    pub async fn get(
        &self,
        url: &str,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<Value, AzureError> {
        tracing::debug!("GET {}", url);

        let response = send(self.authorized(self.client.get(url), token), cancel).await?;
        let (_, _, body) = read_success(response, url, cancel).await?;
        Ok(body)
    }

    /// Make a PUT request with a JSON body
    pub async fn put(
        &self,
        url: &str,
        token: &str,
        body: &Value,
        cancel: &CancellationToken,
    ) -> Result<PutResponse, AzureError> {
        tracing::debug!("PUT {}", url);

        let request = self.authorized(self.client.put(url), token).json(body);
        let response = send(request, cancel).await?;
        let (status, headers, body) = read_success(response, url, cancel).await?;

        Ok(PutResponse {
            status,
            body,
            async_operation: header_str(&headers, ASYNC_OPERATION_HEADER),
            location: header_str(&headers, LOCATION.as_str()),
            retry_after: retry_after(&headers),
        })
    }

    /// Poll a long-running operation URL
    pub async fn poll(
        &self,
        url: &str,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<PollResponse, AzureError> {
        tracing::debug!("POLL {}", url);

        let response = send(self.authorized(self.client.get(url), token), cancel).await?;
        let (status, headers, body) = read_success(response, url, cancel).await?;

        Ok(PollResponse {
            status,
            body,
            retry_after: retry_after(&headers),
        })
    }

    fn authorized(&self, request: RequestBuilder, token: &str) -> RequestBuilder {
        request
            .bearer_auth(token)
            .header("x-ms-client-request-id", uuid::Uuid::new_v4().to_string())
    }
}

async fn send(request: RequestBuilder, cancel: &CancellationToken) -> Result<Response, AzureError> {
    tokio::select! {
        _ = cancel.cancelled() => Err(AzureError::Cancelled),
        response = request.send() => Ok(response?),
    }
}

/// Read the body and map non-success statuses to errors
async fn read_success(
    response: Response,
    url: &str,
    cancel: &CancellationToken,
) -> Result<(StatusCode, HeaderMap, Value), AzureError> {
    let status = response.status();
    let headers = response.headers().clone();
    let text = tokio::select! {
        _ = cancel.cancelled() => return Err(AzureError::Cancelled),
        text = response.text() => text?,
    };

    if status == StatusCode::NOT_FOUND {
        tracing::debug!("Not found: {}", url);
        return Err(AzureError::NotFound(url.to_string()));
    }

    if !status.is_success() {
        // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
        tracing::error!("API error: {} - {}", status, sanitize_for_log(&text));
        let (code, message) = match serde_json::from_str::<ErrorEnvelope>(&text) {
            Ok(envelope) => (envelope.error.code, envelope.error.message),
            Err(_) => (String::new(), String::new()),
        };
        return Err(AzureError::Api {
            status,
            code,
            message,
        });
    }

    if text.trim().is_empty() {
        return Ok((status, headers, Value::Null));
    }

    Ok((status, headers, serde_json::from_str(&text)?))
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
