//! Azure Client
//!
//! Main client for Azure Resource Manager, combining authentication, HTTP
//! and long-running operation polling behind the [`ResourceOperations`] seam
//! that resource strategies call into.

use super::auth::AzureCredentials;
use super::error::AzureError;
use super::http::{AzureHttpClient, PutResponse};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Public ARM endpoint
pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

/// Poll interval when the service does not send `Retry-After`
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Generic get / create-or-update access to ARM resources by path.
///
/// Paths are relative to the endpoint, e.g.
/// `/subscriptions/{s}/resourceGroups/{rg}/providers/Microsoft.Compute/virtualMachines/vm1`.
#[async_trait]
pub trait ResourceOperations: Send + Sync {
    /// Subscription all paths are resolved against
    fn subscription_id(&self) -> &str;

    /// Fetch a resource; `AzureError::NotFound` if it does not exist
    async fn get(
        &self,
        path: &str,
        api_version: &str,
        cancel: &CancellationToken,
    ) -> Result<Value, AzureError>;

    /// Create or replace a resource and wait for provisioning to finish
    async fn create_or_update(
        &self,
        path: &str,
        api_version: &str,
        body: &Value,
        cancel: &CancellationToken,
    ) -> Result<Value, AzureError>;
}

/// Main Azure client
#[derive(Clone)]
pub struct AzureClient {
    pub credentials: AzureCredentials,
    pub http: AzureHttpClient,
    pub subscription_id: String,
    endpoint: String,
    poll_interval: Duration,
}

impl AzureClient {
    /// Create a new client against the given endpoint
    pub fn new(subscription_id: &str, endpoint: &str, credentials: AzureCredentials) -> Result<Self> {
        let parsed = url::Url::parse(endpoint)
            .with_context(|| format!("Invalid ARM endpoint: {}", endpoint))?;
        if parsed.scheme() != "https" && parsed.scheme() != "http" {
            anyhow::bail!("Unsupported endpoint scheme: {}", parsed.scheme());
        }

        let http = AzureHttpClient::new().context("Failed to create HTTP client")?;

        Ok(Self {
            credentials,
            http,
            subscription_id: subscription_id.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    /// Override the fallback poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Build a full request URL for a resource path
    pub fn resource_url(&self, path: &str, api_version: &str) -> String {
        format!(
            "{}{}?api-version={}",
            self.endpoint,
            path,
            urlencoding::encode(api_version)
        )
    }

    async fn wait(&self, retry_after: Option<Duration>, cancel: &CancellationToken) -> Result<(), AzureError> {
        let delay = retry_after.unwrap_or(self.poll_interval);
        tokio::select! {
            _ = cancel.cancelled() => Err(AzureError::Cancelled),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }

    /// Follow an `Azure-AsyncOperation` status URL until a terminal status
    async fn poll_async_operation(
        &self,
        url: &str,
        mut retry_after: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<(), AzureError> {
        loop {
            self.wait(retry_after, cancel).await?;
            let token = self.credentials.get_token().await?;
            let response = self.http.poll(url, &token, cancel).await?;

            let status = response
                .body
                .get("status")
                .and_then(|v| v.as_str())
                .unwrap_or("InProgress");

            match status {
                "Succeeded" => return Ok(()),
                "Failed" | "Canceled" => {
                    let message = response
                        .body
                        .pointer("/error/message")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string();
                    return Err(AzureError::OperationFailed {
                        status: status.to_string(),
                        message,
                    });
                }
                other => {
                    tracing::debug!("Operation status: {}", other);
                    retry_after = response.retry_after;
                }
            }
        }
    }

    /// Follow a `Location` URL until it stops answering 202
    async fn poll_location(
        &self,
        url: &str,
        mut retry_after: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<(), AzureError> {
        loop {
            self.wait(retry_after, cancel).await?;
            let token = self.credentials.get_token().await?;
            let response = self.http.poll(url, &token, cancel).await?;
            if response.status != StatusCode::ACCEPTED {
                return Ok(());
            }
            retry_after = response.retry_after;
        }
    }

    async fn finish_put(
        &self,
        path: &str,
        api_version: &str,
        response: PutResponse,
        cancel: &CancellationToken,
    ) -> Result<Value, AzureError> {
        if let Some(url) = response.async_operation.as_deref() {
            self.poll_async_operation(url, response.retry_after, cancel).await?;
            return self.get(path, api_version, cancel).await;
        }

        if response.status == StatusCode::ACCEPTED {
            if let Some(url) = response.location.as_deref() {
                self.poll_location(url, response.retry_after, cancel).await?;
            }
            return self.get(path, api_version, cancel).await;
        }

        if response.body.is_null() {
            return self.get(path, api_version, cancel).await;
        }

        Ok(response.body)
    }
}

#[async_trait]
impl ResourceOperations for AzureClient {
    fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    async fn get(
        &self,
        path: &str,
        api_version: &str,
        cancel: &CancellationToken,
    ) -> Result<Value, AzureError> {
        let token = self.credentials.get_token().await?;
        let url = self.resource_url(path, api_version);
        match self.http.get(&url, &token, cancel).await {
            Err(e) if e.is_unauthorized() => {
                tracing::debug!("Token rejected, refreshing and retrying GET");
                let token = self.credentials.refresh_token().await?;
                self.http.get(&url, &token, cancel).await
            }
            other => other,
        }
    }

    async fn create_or_update(
        &self,
        path: &str,
        api_version: &str,
        body: &Value,
        cancel: &CancellationToken,
    ) -> Result<Value, AzureError> {
        let token = self.credentials.get_token().await?;
        let url = self.resource_url(path, api_version);
        let response = match self.http.put(&url, &token, body, cancel).await {
            Err(e) if e.is_unauthorized() => {
                tracing::debug!("Token rejected, refreshing and retrying PUT");
                let token = self.credentials.refresh_token().await?;
                self.http.put(&url, &token, body, cancel).await?
            }
            other => other?,
        };
        self.finish_put(path, api_version, response, cancel).await
    }
}
