//! Network interface strategy

use super::public_ip_address::PublicIpAddress;
use super::virtual_network::VirtualNetwork;
use super::{policy, SubResource};
use crate::resources::ResourceGroup;
use crate::strategy::{EntityConfig, ResourceConfig, ResourceModel, ResourceStrategy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkInterface {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub properties: NetworkInterfaceProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkInterfaceProperties {
    #[serde(rename = "ipConfigurations")]
    pub ip_configurations: Vec<IpConfiguration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpConfiguration {
    pub name: String,
    pub properties: IpConfigurationProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IpConfigurationProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet: Option<SubResource>,
    #[serde(rename = "publicIPAddress", skip_serializing_if = "Option::is_none")]
    pub public_ip_address: Option<SubResource>,
    #[serde(rename = "privateIPAllocationMethod", skip_serializing_if = "Option::is_none")]
    pub private_ip_allocation_method: Option<String>,
}

impl ResourceModel for NetworkInterface {
    fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    fn set_location(&mut self, location: &str) {
        self.location = Some(location.to_string());
    }
}

pub fn strategy() -> ResourceStrategy<NetworkInterface> {
    policy::create("network interface", "networkInterfaces", |_: &NetworkInterface| 5)
}

impl ResourceConfig<ResourceGroup> {
    /// Network interface on `subnet_name` of `virtual_network`, exposed through `public_ip_address`
    pub fn create_network_interface_config(
        self: &Arc<Self>,
        name: &str,
        virtual_network: &Arc<ResourceConfig<VirtualNetwork>>,
        subnet_name: &str,
        public_ip_address: &Arc<ResourceConfig<PublicIpAddress>>,
    ) -> Arc<ResourceConfig<NetworkInterface>> {
        let ip_configuration_name = name.to_string();
        let subnet_name = subnet_name.to_string();
        let vnet = Arc::clone(virtual_network);
        let pip = Arc::clone(public_ip_address);

        strategy().create_resource_config(
            Some(self),
            name,
            move |ctx| NetworkInterface {
                properties: NetworkInterfaceProperties {
                    ip_configurations: vec![IpConfiguration {
                        name: ip_configuration_name.clone(),
                        properties: IpConfigurationProperties {
                            subnet: Some(SubResource::new(
                                vnet.subnet_id(&ctx.subscription_id, &subnet_name),
                            )),
                            public_ip_address: Some(SubResource::new(
                                pip.get_id(&ctx.subscription_id).id_to_string(),
                            )),
                            private_ip_allocation_method: None,
                        },
                    }],
                    provisioning_state: None,
                },
                ..Default::default()
            },
            vec![
                Arc::clone(virtual_network) as Arc<dyn EntityConfig>,
                Arc::clone(public_ip_address) as Arc<dyn EntityConfig>,
            ],
        )
    }
}
