//! Virtual network strategy

use super::policy;
use crate::resources::ResourceGroup;
use crate::strategy::{EntityConfig, ResourceConfig, ResourceModel, ResourceStrategy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualNetwork {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub properties: VirtualNetworkProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualNetworkProperties {
    pub address_space: AddressSpace,
    pub subnets: Vec<Subnet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressSpace {
    pub address_prefixes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Subnet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub properties: SubnetProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubnetProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_prefix: Option<String>,
}

impl ResourceModel for VirtualNetwork {
    fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    fn set_location(&mut self, location: &str) {
        self.location = Some(location.to_string());
    }
}

pub fn strategy() -> ResourceStrategy<VirtualNetwork> {
    policy::create("virtual network", "virtualNetworks", |_: &VirtualNetwork| 5)
}

impl ResourceConfig<ResourceGroup> {
    /// Virtual network with one subnet
    pub fn create_virtual_network_config(
        self: &Arc<Self>,
        name: &str,
        address_prefix: &str,
        subnet_name: &str,
        subnet_address_prefix: &str,
    ) -> Arc<ResourceConfig<VirtualNetwork>> {
        let address_prefix = address_prefix.to_string();
        let subnet_name = subnet_name.to_string();
        let subnet_address_prefix = subnet_address_prefix.to_string();

        strategy().create_resource_config(
            Some(self),
            name,
            move |_| VirtualNetwork {
                properties: VirtualNetworkProperties {
                    address_space: AddressSpace {
                        address_prefixes: vec![address_prefix.clone()],
                    },
                    subnets: vec![Subnet {
                        id: None,
                        name: subnet_name.clone(),
                        properties: SubnetProperties {
                            address_prefix: Some(subnet_address_prefix.clone()),
                        },
                    }],
                    provisioning_state: None,
                },
                ..Default::default()
            },
            Vec::new(),
        )
    }
}

impl ResourceConfig<VirtualNetwork> {
    /// Id of a subnet of this network
    pub fn subnet_id(&self, subscription_id: &str, subnet_name: &str) -> String {
        format!(
            "{}/subnets/{}",
            self.get_id(subscription_id).id_to_string(),
            subnet_name
        )
    }
}
