//! Azure Authentication
//!
//! Access tokens come from the `AZURE_ACCESS_TOKEN` environment variable or
//! from the Azure CLI (`az account get-access-token`). Default subscription
//! lookup reads the Azure CLI profile.

use super::error::AzureError;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Resource the management tokens are requested for
pub const MANAGEMENT_RESOURCE: &str = "https://management.azure.com/";

/// Environment variable holding a pre-acquired bearer token
pub const ACCESS_TOKEN_ENV: &str = "AZURE_ACCESS_TOKEN";

/// Refresh tokens this much before they actually expire
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Default token TTL if we can't determine expiry (conservative: 30 minutes)
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Where tokens are obtained from
#[derive(Debug, Clone)]
enum TokenSource {
    /// Fixed token (env var or tests); never refreshed
    Static(String),
    /// Azure CLI
    AzureCli,
}

/// Azure credentials holder with token caching
#[derive(Clone)]
pub struct AzureCredentials {
    source: TokenSource,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    /// When this token expires (with buffer applied)
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Output of `az account get-access-token -o json`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliToken {
    access_token: String,
    /// Unix timestamp, present in recent CLI versions
    #[serde(default, rename = "expires_on")]
    expires_on: Option<i64>,
}

impl AzureCredentials {
    /// Pick the token source from the environment
    pub fn new() -> Self {
        match std::env::var(ACCESS_TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => {
                tracing::debug!("Using access token from {}", ACCESS_TOKEN_ENV);
                Self::from_token(token.trim())
            }
            _ => Self {
                source: TokenSource::AzureCli,
                token_cache: Arc::new(RwLock::new(None)),
            },
        }
    }

    /// Credentials that always return the given token
    pub fn from_token(token: &str) -> Self {
        Self {
            source: TokenSource::Static(token.to_string()),
            token_cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Get an access token for API calls
    pub async fn get_token(&self) -> Result<String, AzureError> {
        if let TokenSource::Static(token) = &self.source {
            return Ok(token.clone());
        }

        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.token.clone());
                }
                tracing::debug!("Cached token expired, fetching new token");
            }
        }

        let (token, ttl) = fetch_cli_token().await?;
        let expires_at = Instant::now() + ttl.saturating_sub(TOKEN_EXPIRY_BUFFER);

        {
            let mut cache = self.token_cache.write().await;
            *cache = Some(CachedToken {
                token: token.clone(),
                expires_at,
            });
        }

        tracing::debug!(
            "New token cached, expires in ~{} minutes",
            ttl.saturating_sub(TOKEN_EXPIRY_BUFFER).as_secs() / 60
        );

        Ok(token)
    }

    /// Force refresh the token
    pub async fn refresh_token(&self) -> Result<String, AzureError> {
        {
            let mut cache = self.token_cache.write().await;
            *cache = None;
        }
        self.get_token().await
    }
}

impl Default for AzureCredentials {
    fn default() -> Self {
        Self::new()
    }
}

async fn fetch_cli_token() -> Result<(String, Duration), AzureError> {
    let output = tokio::process::Command::new("az")
        .args([
            "account",
            "get-access-token",
            "--resource",
            MANAGEMENT_RESOURCE,
            "--output",
            "json",
        ])
        .output()
        .await
        .map_err(|e| AzureError::Credentials(format!("failed to run az: {e}")))?;

    if !output.status.success() {
        // Security: stderr may echo account details; keep only the exit status
        return Err(AzureError::Credentials(format!(
            "az exited with {}",
            output.status
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_cli_token(&stdout, Utc::now())
}

/// Parse CLI token JSON into the token and its remaining lifetime
fn parse_cli_token(json: &str, now: DateTime<Utc>) -> Result<(String, Duration), AzureError> {
    let parsed: CliToken = serde_json::from_str(json)?;

    let ttl = parsed
        .expires_on
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .and_then(|expiry| (expiry - now).to_std().ok())
        .unwrap_or(DEFAULT_TOKEN_TTL);

    Ok((parsed.access_token, ttl))
}

/// Get the Azure CLI configuration directory
pub fn get_azure_config_dir() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("AZURE_CONFIG_DIR") {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|p| p.join(".azure"))
}

/// Validate a subscription id (GUID form)
fn validate_subscription_id(id: &str) -> bool {
    uuid::Uuid::parse_str(id).is_ok()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AzureProfile {
    #[serde(default)]
    subscriptions: Vec<ProfileSubscription>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileSubscription {
    id: String,
    #[serde(default)]
    is_default: bool,
}

/// Read the default subscription from the environment or the Azure CLI profile
/// Security: validates the id format before returning
pub fn get_default_subscription() -> Option<String> {
    if let Ok(id) = std::env::var("AZURE_SUBSCRIPTION_ID") {
        if validate_subscription_id(&id) {
            return Some(id);
        }
        tracing::warn!("Invalid subscription id format in AZURE_SUBSCRIPTION_ID");
    }

    let profile_path = get_azure_config_dir()?.join("azureProfile.json");
    let content = std::fs::read_to_string(profile_path).ok()?;
    default_subscription_from_profile(&content)
}

fn default_subscription_from_profile(content: &str) -> Option<String> {
    // The CLI writes this file with a UTF-8 BOM
    let content = content.trim_start_matches('\u{feff}');
    let profile: AzureProfile = serde_json::from_str(content).ok()?;
    profile
        .subscriptions
        .into_iter()
        .find(|s| s.is_default)
        .map(|s| s.id)
        .filter(|id| validate_subscription_id(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cli_token_with_expiry() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let json = r#"{"accessToken":"abc","expires_on":1700003600,"tokenType":"Bearer"}"#;
        let (token, ttl) = parse_cli_token(json, now).unwrap();
        assert_eq!(token, "abc");
        assert_eq!(ttl, Duration::from_secs(3600));
    }

    #[test]
    fn test_parse_cli_token_without_expiry_uses_default() {
        let now = Utc::now();
        let (_, ttl) = parse_cli_token(r#"{"accessToken":"abc"}"#, now).unwrap();
        assert_eq!(ttl, DEFAULT_TOKEN_TTL);
    }

    #[test]
    fn test_parse_cli_token_rejects_garbage() {
        assert!(parse_cli_token("not json", Utc::now()).is_err());
    }

    #[test]
    fn test_static_token_is_returned() {
        let creds = AzureCredentials::from_token("t0k3n");
        let token = tokio_test::block_on(creds.get_token()).unwrap();
        assert_eq!(token, "t0k3n");
    }

    #[test]
    fn test_default_subscription_from_profile_with_bom() {
        let content = "\u{feff}{\"subscriptions\":[\
            {\"id\":\"11111111-1111-1111-1111-111111111111\",\"isDefault\":false},\
            {\"id\":\"22222222-2222-2222-2222-222222222222\",\"isDefault\":true}]}";
        assert_eq!(
            default_subscription_from_profile(content).as_deref(),
            Some("22222222-2222-2222-2222-222222222222")
        );
    }

    #[test]
    fn test_default_subscription_rejects_bad_id() {
        let content = r#"{"subscriptions":[{"id":"../etc","isDefault":true}]}"#;
        assert!(default_subscription_from_profile(content).is_none());
    }
}
