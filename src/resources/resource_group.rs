//! Resource group strategy

use crate::strategy::{ResourceConfig, ResourceModel, ResourceStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const API_VERSION: &str = "2017-05-10";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<ResourceGroupProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceGroupProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

impl ResourceModel for ResourceGroup {
    fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    fn set_location(&mut self, location: &str) {
        self.location = Some(location.to_string());
    }
}

pub fn strategy() -> ResourceStrategy<ResourceGroup> {
    ResourceStrategy::new("resource group", None, API_VERSION, |_: &ResourceGroup| 5)
}

/// Config for a resource group located wherever the deployment runs
pub fn create_resource_group_config(name: &str) -> Arc<ResourceConfig<ResourceGroup>> {
    strategy().create_resource_config(None, name, |_| ResourceGroup::default(), Vec::new())
}
