//! Azure Resource Manager interaction module
//!
//! # Module Structure
//!
//! - [`auth`] - access tokens (env var or Azure CLI) and default subscription lookup
//! - [`client`] - [`client::AzureClient`] and the [`client::ResourceOperations`] seam
//! - [`http`] - HTTP utilities for REST calls
//! - [`error`] - [`error::AzureError`] and user-facing formatting
//!
//! # Example
//!
//! ```ignore
//! use azdeploy::azure::{auth::AzureCredentials, client::AzureClient};
//!
//! let client = AzureClient::new(&subscription, DEFAULT_ENDPOINT, AzureCredentials::new())?;
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod http;

pub use client::{AzureClient, ResourceOperations, DEFAULT_ENDPOINT};
pub use error::{format_azure_error, AzureError};
