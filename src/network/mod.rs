//! Microsoft.Network resources
//!
//! - [`virtual_network`] - virtual network with a single subnet
//! - [`public_ip_address`] - public IP address
//! - [`network_interface`] - network interface bound to a subnet and a public IP

pub mod network_interface;
pub mod public_ip_address;
pub mod virtual_network;

pub use network_interface::NetworkInterface;
pub use public_ip_address::PublicIpAddress;
pub use virtual_network::VirtualNetwork;

use serde::{Deserialize, Serialize};

/// Reference to another resource by id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubResource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl SubResource {
    pub fn new(id: String) -> Self {
        Self { id: Some(id) }
    }
}

/// Strategy constructors for `Microsoft.Network` providers
pub mod policy {
    use crate::strategy::{ResourceModel, ResourceStrategy, ResourceType};

    pub const NAMESPACE: &str = "Microsoft.Network";
    pub const API_VERSION: &str = "2017-10-01";

    pub fn create<M: ResourceModel>(
        type_name: &'static str,
        provider: &'static str,
        create_time: fn(&M) -> u64,
    ) -> ResourceStrategy<M> {
        ResourceStrategy::new(
            type_name,
            Some(ResourceType::new(NAMESPACE, provider)),
            API_VERSION,
            create_time,
        )
    }
}
