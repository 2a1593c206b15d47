//! Resource strategy layer
//!
//! This module describes desired ARM resources as an immutable graph of
//! configurations and drives their creation.
//!
//! # Architecture
//!
//! - [`resource_id`] - resource identifiers and request paths
//! - [`resource_strategy`] - per-type get / create-or-update / estimate descriptors
//! - [`resource_config`] - immutable resource descriptions and their type-erased view
//! - [`deploy`] - dependency ordering, existence checks and creation
//!
//! # Example
//!
//! ```ignore
//! let rg = create_resource_group_config("rg1");
//! let vm = rg.create_virtual_machine_config("vm1", &nic, false, "azureuser", &password, &image, "Standard_DS1_v2");
//! let root: Arc<dyn EntityConfig> = vm;
//! deploy::apply(&client, &ctx, &root, &cancel, &|p| println!("{:.0}%", p.fraction() * 100.0)).await?;
//! ```

pub mod deploy;
pub mod resource_config;
pub mod resource_id;
pub mod resource_strategy;

pub use resource_config::{EntityConfig, ResourceConfig, SubscriptionContext};
pub use resource_id::{ResourceId, ResourceType};
pub use resource_strategy::{CreateOrUpdateParams, GetParams, ResourceModel, ResourceStrategy};
