//! Resource configurations
//!
//! A [`ResourceConfig`] is the immutable, not-yet-executed description of one
//! desired resource. The payload is produced lazily by a factory once the
//! subscription is known, so configs can reference each other's ids before
//! anything exists remotely.

use super::resource_id::ResourceId;
use super::resource_strategy::{CreateOrUpdateParams, GetParams, ResourceModel, ResourceStrategy};
use crate::azure::{AzureError, ResourceOperations};
use crate::resources::resource_group::ResourceGroup;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Resolved runtime context payloads and ids are computed against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionContext {
    pub subscription_id: String,
    /// Location applied to payloads that do not set one
    pub location: String,
}

impl SubscriptionContext {
    pub fn new(subscription_id: &str, location: &str) -> Self {
        Self {
            subscription_id: subscription_id.to_string(),
            location: location.to_string(),
        }
    }
}

type CreateModel<M> = Box<dyn Fn(&SubscriptionContext) -> M + Send + Sync>;

/// Immutable description of a desired resource and its dependencies
pub struct ResourceConfig<M: ResourceModel> {
    strategy: ResourceStrategy<M>,
    resource_group: Option<Arc<ResourceConfig<ResourceGroup>>>,
    name: String,
    create_model: CreateModel<M>,
    dependencies: Vec<Arc<dyn EntityConfig>>,
}

impl<M: ResourceModel> ResourceStrategy<M> {
    /// Bind this strategy to a named resource.
    ///
    /// `dependencies` must list every config whose id `create_model` reads.
    pub fn create_resource_config<F>(
        &self,
        resource_group: Option<&Arc<ResourceConfig<ResourceGroup>>>,
        name: &str,
        create_model: F,
        dependencies: Vec<Arc<dyn EntityConfig>>,
    ) -> Arc<ResourceConfig<M>>
    where
        F: Fn(&SubscriptionContext) -> M + Send + Sync + 'static,
    {
        Arc::new(ResourceConfig {
            strategy: *self,
            resource_group: resource_group.cloned(),
            name: name.to_string(),
            create_model: Box::new(create_model),
            dependencies,
        })
    }
}

impl<M: ResourceModel> ResourceConfig<M> {
    pub fn strategy(&self) -> &ResourceStrategy<M> {
        &self.strategy
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resource_group(&self) -> Option<&Arc<ResourceConfig<ResourceGroup>>> {
        self.resource_group.as_ref()
    }

    /// Name of the owning resource group (its own name for a resource group)
    pub fn resource_group_name(&self) -> &str {
        self.resource_group
            .as_ref()
            .map(|rg| rg.name())
            .unwrap_or(self.name.as_str())
    }

    /// Explicit dependencies, in declaration order
    pub fn dependencies(&self) -> &[Arc<dyn EntityConfig>] {
        &self.dependencies
    }

    /// Build the payload, filling in the context location when unset
    pub fn create_model(&self, ctx: &SubscriptionContext) -> M {
        let mut model = (self.create_model)(ctx);
        if model.location().is_none() {
            model.set_location(&ctx.location);
        }
        model
    }

    /// Fetch the remote state of this resource
    pub async fn get(
        &self,
        client: &dyn ResourceOperations,
        cancel: &CancellationToken,
    ) -> Result<M, AzureError> {
        self.strategy
            .get(
                client,
                GetParams {
                    resource_group_name: self.resource_group_name(),
                    name: &self.name,
                    cancellation_token: cancel,
                },
            )
            .await
    }

    /// Create or update this resource from a freshly built payload
    pub async fn create_or_update(
        &self,
        client: &dyn ResourceOperations,
        ctx: &SubscriptionContext,
        cancel: &CancellationToken,
    ) -> Result<M, AzureError> {
        self.strategy
            .create_or_update(
                client,
                CreateOrUpdateParams {
                    resource_group_name: self.resource_group_name(),
                    name: &self.name,
                    model: self.create_model(ctx),
                    cancellation_token: cancel,
                },
            )
            .await
    }
}

impl<M: ResourceModel> fmt::Debug for ResourceConfig<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceConfig")
            .field("type", &self.strategy.type_name())
            .field("resource_group", &self.resource_group_name())
            .field("name", &self.name)
            .field(
                "dependencies",
                &self.dependencies.iter().map(|d| d.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Type-erased view of a [`ResourceConfig`] used by the deployment engine
#[async_trait]
pub trait EntityConfig: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn name(&self) -> &str;

    /// Owning resource group config, if any
    fn resource_group_config(&self) -> Option<Arc<dyn EntityConfig>>;

    fn dependencies(&self) -> &[Arc<dyn EntityConfig>];

    fn get_id(&self, subscription_id: &str) -> ResourceId;

    /// Estimated provisioning time of the payload built for `ctx`
    fn estimate_create_seconds(&self, ctx: &SubscriptionContext) -> u64;

    /// Payload for `ctx` as JSON
    fn render(&self, ctx: &SubscriptionContext) -> Result<Value, serde_json::Error>;

    /// Whether the resource already exists remotely
    async fn exists(
        &self,
        client: &dyn ResourceOperations,
        cancel: &CancellationToken,
    ) -> Result<bool, AzureError>;

    /// Create or update and return the provisioned resource as JSON
    async fn apply(
        &self,
        client: &dyn ResourceOperations,
        ctx: &SubscriptionContext,
        cancel: &CancellationToken,
    ) -> Result<Value, AzureError>;
}

#[async_trait]
impl<M: ResourceModel> EntityConfig for ResourceConfig<M> {
    fn type_name(&self) -> &'static str {
        self.strategy.type_name()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn resource_group_config(&self) -> Option<Arc<dyn EntityConfig>> {
        self.resource_group
            .clone()
            .map(|rg| rg as Arc<dyn EntityConfig>)
    }

    fn dependencies(&self) -> &[Arc<dyn EntityConfig>] {
        &self.dependencies
    }

    fn get_id(&self, subscription_id: &str) -> ResourceId {
        self.strategy
            .id(subscription_id, self.resource_group_name(), &self.name)
    }

    fn estimate_create_seconds(&self, ctx: &SubscriptionContext) -> u64 {
        self.strategy.create_time(&self.create_model(ctx))
    }

    fn render(&self, ctx: &SubscriptionContext) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self.create_model(ctx))
    }

    async fn exists(
        &self,
        client: &dyn ResourceOperations,
        cancel: &CancellationToken,
    ) -> Result<bool, AzureError> {
        match self.get(client, cancel).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn apply(
        &self,
        client: &dyn ResourceOperations,
        ctx: &SubscriptionContext,
        cancel: &CancellationToken,
    ) -> Result<Value, AzureError> {
        let created = self.create_or_update(client, ctx, cancel).await?;
        Ok(serde_json::to_value(created)?)
    }
}
