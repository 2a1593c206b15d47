//! Public IP address strategy

use super::policy;
use crate::resources::ResourceGroup;
use crate::strategy::{ResourceConfig, ResourceModel, ResourceStrategy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PublicIpAddress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub properties: PublicIpAddressProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PublicIpAddressProperties {
    #[serde(
        rename = "publicIPAllocationMethod",
        skip_serializing_if = "Option::is_none"
    )]
    pub public_ip_allocation_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_settings: Option<DnsSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DnsSettings {
    pub domain_name_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
}

impl ResourceModel for PublicIpAddress {
    fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    fn set_location(&mut self, location: &str) {
        self.location = Some(location.to_string());
    }
}

pub fn strategy() -> ResourceStrategy<PublicIpAddress> {
    policy::create("public IP address", "publicIPAddresses", |_: &PublicIpAddress| 5)
}

impl ResourceConfig<ResourceGroup> {
    /// Dynamically allocated public IP, optionally with a DNS label
    pub fn create_public_ip_address_config(
        self: &Arc<Self>,
        name: &str,
        domain_name_label: Option<&str>,
    ) -> Arc<ResourceConfig<PublicIpAddress>> {
        let domain_name_label = domain_name_label.map(|s| s.to_string());

        strategy().create_resource_config(
            Some(self),
            name,
            move |_| PublicIpAddress {
                properties: PublicIpAddressProperties {
                    public_ip_allocation_method: Some("Dynamic".to_string()),
                    dns_settings: domain_name_label.clone().map(|label| DnsSettings {
                        domain_name_label: label,
                        fqdn: None,
                    }),
                    ..Default::default()
                },
                ..Default::default()
            },
            Vec::new(),
        )
    }
}
