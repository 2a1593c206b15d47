//! Azure API errors
//!
//! Failures surfaced by the ARM client. Strategies and the deployment engine
//! propagate these unchanged.

use reqwest::StatusCode;

/// Error returned by ARM operations
#[derive(Debug, thiserror::Error)]
pub enum AzureError {
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("API request failed: {status} {code}: {message}")]
    Api {
        status: StatusCode,
        code: String,
        message: String,
    },
    #[error("long-running operation ended with status {status}: {message}")]
    OperationFailed { status: String, message: String },
    #[error("operation cancelled")]
    Cancelled,
    #[error("failed to acquire access token: {0}")]
    Credentials(String),
    #[error("client targets subscription {client} but resources are resolved against {context}")]
    SubscriptionMismatch { client: String, context: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl AzureError {
    /// True if the remote resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, AzureError::NotFound(_))
    }

    /// True if the service rejected the bearer token
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AzureError::Api { status, .. } if *status == StatusCode::UNAUTHORIZED)
    }
}

/// Format an Azure error for display
/// Security: generic messages avoid echoing raw API bodies to the terminal
pub fn format_azure_error(error: &anyhow::Error) -> String {
    if let Some(azure) = error.downcast_ref::<AzureError>() {
        return match azure {
            AzureError::NotFound(_) => "Resource not found.".to_string(),
            AzureError::Api { status, code, .. } => match status.as_u16() {
                401 => "Authentication failed. Run 'az login'.".to_string(),
                403 => "Permission denied. Check your Azure role assignments.".to_string(),
                409 => format!("Resource conflict ({code}). The resource may already exist or be in use."),
                429 => "Rate limit exceeded. Please try again later.".to_string(),
                400 => format!("Invalid request ({code}). Check your parameters."),
                500..=599 => "Azure service temporarily unavailable. Please try again.".to_string(),
                _ => format!("Request failed with status {status} ({code})."),
            },
            AzureError::OperationFailed { status, .. } => {
                format!("Deployment operation {}.", status.to_lowercase())
            }
            AzureError::Cancelled => "Operation cancelled.".to_string(),
            AzureError::Credentials(_) => {
                "Could not get an access token. Run 'az login' or set AZURE_ACCESS_TOKEN.".to_string()
            }
            AzureError::SubscriptionMismatch { .. } => {
                "The client and the resources use different subscriptions.".to_string()
            }
            AzureError::Transport(_) => {
                "Request failed. Check your network connection and try again.".to_string()
            }
            AzureError::Decode(_) => "Unexpected response from Azure.".to_string(),
        };
    }

    let error_str = error.to_string();
    let printable: Vec<char> = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .collect();
    let sanitized: String = printable.iter().take(80).collect();

    if printable.len() > 80 {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_detected() {
        assert!(AzureError::NotFound("/x".into()).is_not_found());
        assert!(!AzureError::Cancelled.is_not_found());
    }

    #[test]
    fn test_format_conflict_keeps_code_only() {
        let err = anyhow::Error::new(AzureError::Api {
            status: StatusCode::CONFLICT,
            code: "OperationNotAllowed".into(),
            message: "secret detail".into(),
        });
        let msg = format_azure_error(&err);
        assert!(msg.contains("OperationNotAllowed"));
        assert!(!msg.contains("secret detail"));
    }

    #[test]
    fn test_format_wrapped_context_error() {
        let err = anyhow::Error::new(AzureError::Cancelled).context("creating vm1");
        assert_eq!(format_azure_error(&err), "Operation cancelled.");
    }

    #[test]
    fn test_format_plain_error_is_truncated() {
        let err = anyhow::anyhow!("{}", "x".repeat(200));
        let msg = format_azure_error(&err);
        assert!(msg.ends_with("..."));
        assert_eq!(msg.len(), 83);
    }

    #[test]
    fn test_format_short_error_with_stripped_characters_is_not_truncated() {
        let err = anyhow::anyhow!("bad\tvalue \u{e9}t\u{e9}");
        assert_eq!(format_azure_error(&err), "badvalue t");
    }

    #[test]
    fn test_unauthorized_is_detected() {
        let err = AzureError::Api {
            status: StatusCode::UNAUTHORIZED,
            code: "InvalidAuthenticationToken".into(),
            message: String::new(),
        };
        assert!(err.is_unauthorized());
        assert!(!AzureError::Cancelled.is_unauthorized());
    }
}
