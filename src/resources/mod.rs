//! Microsoft.Resources types

pub mod resource_group;

pub use resource_group::{create_resource_group_config, ResourceGroup};
