//! Resource strategies
//!
//! A [`ResourceStrategy`] describes one ARM resource type: its display name,
//! provider, API version, how to get and create-or-update an instance, and
//! how long creation is expected to take. Strategies hold no client; the
//! caller passes one in on every operation.

use super::resource_id::{ResourceId, ResourceType};
use crate::azure::{AzureError, ResourceOperations};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use tokio_util::sync::CancellationToken;

/// Provider payload (`VirtualMachine`, `NetworkInterface`, ...)
pub trait ResourceModel:
    Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static
{
    fn location(&self) -> Option<&str>;
    fn set_location(&mut self, location: &str);
}

/// Parameters of a get call
#[derive(Debug, Clone, Copy)]
pub struct GetParams<'a> {
    pub resource_group_name: &'a str,
    pub name: &'a str,
    pub cancellation_token: &'a CancellationToken,
}

/// Parameters of a create-or-update call
#[derive(Debug, Clone)]
pub struct CreateOrUpdateParams<'a, M> {
    pub resource_group_name: &'a str,
    pub name: &'a str,
    pub model: M,
    pub cancellation_token: &'a CancellationToken,
}

/// Descriptor of how to fetch, create and time one resource type
pub struct ResourceStrategy<M> {
    type_name: &'static str,
    resource_type: Option<ResourceType>,
    api_version: &'static str,
    create_time: fn(&M) -> u64,
}

impl<M> Clone for ResourceStrategy<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for ResourceStrategy<M> {}

impl<M> fmt::Debug for ResourceStrategy<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceStrategy")
            .field("type_name", &self.type_name)
            .field("resource_type", &self.resource_type)
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl<M: ResourceModel> ResourceStrategy<M> {
    /// `resource_type` is `None` only for resource groups
    pub const fn new(
        type_name: &'static str,
        resource_type: Option<ResourceType>,
        api_version: &'static str,
        create_time: fn(&M) -> u64,
    ) -> Self {
        Self {
            type_name,
            resource_type,
            api_version,
            create_time,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn resource_type(&self) -> Option<ResourceType> {
        self.resource_type
    }

    pub fn api_version(&self) -> &'static str {
        self.api_version
    }

    /// Identifier of an instance of this type
    pub fn id(&self, subscription_id: &str, resource_group_name: &str, name: &str) -> ResourceId {
        match self.resource_type {
            None => ResourceId::resource_group(subscription_id, name),
            Some(t) => ResourceId::resource(subscription_id, resource_group_name, t, name),
        }
    }

    /// Estimated provisioning time in seconds
    pub fn create_time(&self, model: &M) -> u64 {
        (self.create_time)(model)
    }

    /// Fetch an existing instance. Missing resources yield `AzureError::NotFound`.
    pub async fn get(
        &self,
        client: &dyn ResourceOperations,
        params: GetParams<'_>,
    ) -> Result<M, AzureError> {
        let id = self.id(client.subscription_id(), params.resource_group_name, params.name);
        let value = client
            .get(&id.to_path(), self.api_version, params.cancellation_token)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Create or replace an instance and return the provisioned resource
    pub async fn create_or_update(
        &self,
        client: &dyn ResourceOperations,
        params: CreateOrUpdateParams<'_, M>,
    ) -> Result<M, AzureError> {
        let id = self.id(client.subscription_id(), params.resource_group_name, params.name);
        let body = serde_json::to_value(&params.model)?;
        tracing::debug!("create_or_update: type={}, id={}", self.type_name, id);
        let value = client
            .create_or_update(&id.to_path(), self.api_version, &body, params.cancellation_token)
            .await?;
        Ok(serde_json::from_value(value)?)
    }
}
