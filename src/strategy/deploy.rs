//! Deployment engine
//!
//! Orders a configuration graph by dependency, checks what already exists,
//! and creates the rest level by level. Entities on the same level do not
//! depend on each other and are created concurrently.

use super::resource_config::{EntityConfig, SubscriptionContext};
use super::resource_id::ResourceId;
use crate::azure::{AzureError, ResourceOperations};
use futures::future::try_join_all;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Keys whose values are never printed in rendered payloads
const REDACTED_KEYS: &[&str] = &["adminPassword"];

/// One entity in creation order
#[derive(Clone)]
pub struct PlannedEntity {
    pub config: Arc<dyn EntityConfig>,
    pub id: ResourceId,
    /// 0 for entities without dependencies, else 1 + deepest dependency
    pub level: usize,
}

/// Progress snapshot reported after each created entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub resource: ResourceId,
    pub completed_seconds: u64,
    pub total_seconds: u64,
}

impl Progress {
    /// Completed share of the estimated work, in `0.0..=1.0`
    pub fn fraction(&self) -> f64 {
        if self.total_seconds == 0 {
            1.0
        } else {
            (self.completed_seconds as f64 / self.total_seconds as f64).min(1.0)
        }
    }
}

/// Outcome of [`apply`]
#[derive(Debug, Clone, Default)]
pub struct DeploymentReport {
    pub created: Vec<ResourceId>,
    pub existing: Vec<ResourceId>,
    pub estimated_seconds: u64,
    /// Provisioned root resource, if it had to be created
    pub root: Option<Value>,
}

/// Payload of one planned entity, for dry runs
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedResource {
    pub id: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub estimated_seconds: u64,
    pub model: Value,
}

/// Creation order for `root`: resource group, then dependencies, then the
/// entity itself, each id once.
pub fn plan(root: &Arc<dyn EntityConfig>, ctx: &SubscriptionContext) -> Vec<PlannedEntity> {
    let mut levels = HashMap::new();
    let mut order = Vec::new();
    visit(root, ctx, &mut levels, &mut order);
    order
}

fn visit(
    entity: &Arc<dyn EntityConfig>,
    ctx: &SubscriptionContext,
    levels: &mut HashMap<ResourceId, usize>,
    order: &mut Vec<PlannedEntity>,
) -> usize {
    let id = entity.get_id(&ctx.subscription_id);
    if let Some(level) = levels.get(&id) {
        return *level;
    }

    let mut level = 0;
    if let Some(rg) = entity.resource_group_config() {
        level = level.max(visit(&rg, ctx, levels, order) + 1);
    }
    for dependency in entity.dependencies() {
        level = level.max(visit(dependency, ctx, levels, order) + 1);
    }

    levels.insert(id.clone(), level);
    order.push(PlannedEntity {
        config: Arc::clone(entity),
        id,
        level,
    });
    level
}

/// Sum of the creation estimates of `entities`
pub fn estimate_seconds(entities: &[PlannedEntity], ctx: &SubscriptionContext) -> u64 {
    entities
        .iter()
        .map(|e| e.config.estimate_create_seconds(ctx))
        .sum()
}

/// Payloads of the whole plan with secrets redacted
pub fn render(
    root: &Arc<dyn EntityConfig>,
    ctx: &SubscriptionContext,
) -> Result<Vec<RenderedResource>, serde_json::Error> {
    plan(root, ctx)
        .into_iter()
        .map(|entity| -> Result<RenderedResource, serde_json::Error> {
            let mut model = entity.config.render(ctx)?;
            redact(&mut model);
            Ok(RenderedResource {
                id: entity.id.id_to_string(),
                type_name: entity.config.type_name().to_string(),
                estimated_seconds: entity.config.estimate_create_seconds(ctx),
                model,
            })
        })
        .collect()
}

fn redact(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, v) in map.iter_mut() {
                if REDACTED_KEYS.contains(&key.as_str()) {
                    *v = Value::String("********".to_string());
                } else {
                    redact(v);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact),
        _ => {}
    }
}

/// Create every missing entity of the graph rooted at `root`.
///
/// Existing resources are left untouched. The first failure aborts the
/// deployment and is returned unchanged. `client` must target the
/// subscription of `ctx`.
pub async fn apply(
    client: &dyn ResourceOperations,
    ctx: &SubscriptionContext,
    root: &Arc<dyn EntityConfig>,
    cancel: &CancellationToken,
    on_progress: &(dyn Fn(Progress) + Send + Sync),
) -> Result<DeploymentReport, AzureError> {
    if client.subscription_id() != ctx.subscription_id {
        return Err(AzureError::SubscriptionMismatch {
            client: client.subscription_id().to_string(),
            context: ctx.subscription_id.clone(),
        });
    }

    let planned = plan(root, ctx);
    let root_id = root.get_id(&ctx.subscription_id);

    let exists = try_join_all(
        planned
            .iter()
            .map(|entity| entity.config.exists(client, cancel)),
    )
    .await?;

    let mut report = DeploymentReport::default();
    let mut missing = Vec::new();
    for (entity, exists) in planned.into_iter().zip(exists) {
        if exists {
            tracing::info!("{} {} already exists", entity.config.type_name(), entity.id);
            report.existing.push(entity.id);
        } else {
            missing.push(entity);
        }
    }

    let total_seconds = estimate_seconds(&missing, ctx);
    report.estimated_seconds = total_seconds;
    tracing::info!(
        "Creating {} resources, estimated {} seconds",
        missing.len(),
        total_seconds
    );

    let completed = AtomicU64::new(0);
    let max_level = missing.iter().map(|e| e.level).max().unwrap_or(0);

    for level in 0..=max_level {
        let batch: Vec<&PlannedEntity> = missing.iter().filter(|e| e.level == level).collect();
        if batch.is_empty() {
            continue;
        }

        let results = try_join_all(batch.iter().map(|entity| {
            let completed = &completed;
            async move {
                tracing::info!("Creating {} {}", entity.config.type_name(), entity.id);
                let value = entity.config.apply(client, ctx, cancel).await?;

                let seconds = entity.config.estimate_create_seconds(ctx);
                let done = completed.fetch_add(seconds, Ordering::SeqCst) + seconds;
                on_progress(Progress {
                    resource: entity.id.clone(),
                    completed_seconds: done,
                    total_seconds,
                });
                Ok::<_, AzureError>((entity.id.clone(), value))
            }
        }))
        .await?;

        for (id, value) in results {
            if id == root_id {
                report.root = Some(value);
            }
            report.created.push(id);
        }
    }

    Ok(report)
}
