//! Virtual machine strategy and configuration factory

use super::image::Image;
use super::policy;
use crate::network::NetworkInterface;
use crate::resources::ResourceGroup;
use crate::strategy::{EntityConfig, ResourceConfig, ResourceModel, ResourceStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Estimated creation time of a Windows machine, in seconds
pub const WINDOWS_CREATE_SECONDS: u64 = 240;
/// Estimated creation time of any other machine, in seconds
pub const LINUX_CREATE_SECONDS: u64 = 120;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualMachine {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub properties: VirtualMachineProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualMachineProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hardware_profile: Option<HardwareProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_profile: Option<StorageProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_profile: Option<OsProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_profile: Option<NetworkProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vm_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HardwareProfile {
    pub vm_size: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_reference: Option<ImageReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageReference {
    pub publisher: String,
    pub offer: String,
    pub sku: String,
    pub version: String,
}

impl From<&Image> for ImageReference {
    fn from(image: &Image) -> Self {
        Self {
            publisher: image.publisher.clone(),
            offer: image.offer.clone(),
            sku: image.sku.clone(),
            version: image.version.clone(),
        }
    }
}

#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OsProfile {
    pub computer_name: String,
    pub admin_username: String,
    /// Never returned by GET
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub windows_configuration: Option<WindowsConfiguration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linux_configuration: Option<LinuxConfiguration>,
}

// Security: keep the admin password out of logs
impl fmt::Debug for OsProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OsProfile")
            .field("computer_name", &self.computer_name)
            .field("admin_username", &self.admin_username)
            .field("admin_password", &self.admin_password.as_ref().map(|_| "********"))
            .field("windows_configuration", &self.windows_configuration)
            .field("linux_configuration", &self.linux_configuration)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WindowsConfiguration {
    #[serde(rename = "provisionVMAgent", skip_serializing_if = "Option::is_none")]
    pub provision_vm_agent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_automatic_updates: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinuxConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_password_authentication: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkProfile {
    pub network_interfaces: Vec<NetworkInterfaceReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkInterfaceReference {
    pub id: String,
}

impl ResourceModel for VirtualMachine {
    fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    fn set_location(&mut self, location: &str) {
        self.location = Some(location.to_string());
    }
}

/// Windows machines take roughly twice as long to provision
fn create_time(vm: &VirtualMachine) -> u64 {
    let is_windows = vm
        .properties
        .os_profile
        .as_ref()
        .is_some_and(|os| os.windows_configuration.is_some());
    if is_windows {
        WINDOWS_CREATE_SECONDS
    } else {
        LINUX_CREATE_SECONDS
    }
}

pub fn strategy() -> ResourceStrategy<VirtualMachine> {
    policy::create("virtual machine", "virtualMachines", create_time)
}

impl ResourceConfig<ResourceGroup> {
    /// Virtual machine attached to `network_interface`.
    ///
    /// Exactly one of the Windows and Linux OS configurations is set,
    /// selected by `is_windows`. Credentials, image and size are passed
    /// through unvalidated.
    #[allow(clippy::too_many_arguments)]
    pub fn create_virtual_machine_config(
        self: &Arc<Self>,
        name: &str,
        network_interface: &Arc<ResourceConfig<NetworkInterface>>,
        is_windows: bool,
        admin_username: &str,
        admin_password: &str,
        image: &Image,
        size: &str,
    ) -> Arc<ResourceConfig<VirtualMachine>> {
        let computer_name = name.to_string();
        let admin_username = admin_username.to_string();
        let admin_password = admin_password.to_string();
        let image_reference = ImageReference::from(image);
        let size = size.to_string();
        let nic = Arc::clone(network_interface);

        strategy().create_resource_config(
            Some(self),
            name,
            move |ctx| VirtualMachine {
                properties: VirtualMachineProperties {
                    os_profile: Some(OsProfile {
                        computer_name: computer_name.clone(),
                        windows_configuration: is_windows.then(WindowsConfiguration::default),
                        linux_configuration: (!is_windows).then(LinuxConfiguration::default),
                        admin_username: admin_username.clone(),
                        admin_password: Some(admin_password.clone()),
                    }),
                    network_profile: Some(NetworkProfile {
                        network_interfaces: vec![NetworkInterfaceReference {
                            id: nic.get_id(&ctx.subscription_id).id_to_string(),
                        }],
                    }),
                    hardware_profile: Some(HardwareProfile {
                        vm_size: size.clone(),
                    }),
                    storage_profile: Some(StorageProfile {
                        image_reference: Some(image_reference.clone()),
                    }),
                    ..Default::default()
                },
                ..Default::default()
            },
            vec![Arc::clone(network_interface) as Arc<dyn EntityConfig>],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::create_resource_group_config;
    use crate::strategy::SubscriptionContext;
    use serde_json::json;

    fn nic(rg: &Arc<ResourceConfig<ResourceGroup>>) -> Arc<ResourceConfig<NetworkInterface>> {
        let vnet = rg.create_virtual_network_config("vm1", "192.168.0.0/16", "vm1", "192.168.1.0/24");
        let pip = rg.create_public_ip_address_config("vm1", None);
        rg.create_network_interface_config("vm1", &vnet, "vm1", &pip)
    }

    fn ubuntu() -> Image {
        Image::new("Canonical", "UbuntuServer", "18.04-LTS", "latest")
    }

    fn ctx() -> SubscriptionContext {
        SubscriptionContext::new("sub", "eastus")
    }

    #[test]
    fn test_windows_flag_populates_windows_configuration_only() {
        let rg = create_resource_group_config("rg");
        let nic = nic(&rg);
        let vm = rg.create_virtual_machine_config("vm1", &nic, true, "admin", "P@ss1234", &ubuntu(), "Standard_DS1_v2");

        let model = vm.create_model(&ctx());
        let os = model.properties.os_profile.unwrap();
        assert!(os.windows_configuration.is_some());
        assert!(os.linux_configuration.is_none());
    }

    #[test]
    fn test_linux_populates_linux_configuration_only() {
        let rg = create_resource_group_config("rg");
        let nic = nic(&rg);
        let vm = rg.create_virtual_machine_config("vm1", &nic, false, "admin", "P@ss1234", &ubuntu(), "Standard_DS1_v2");

        let model = vm.create_model(&ctx());
        let os = model.properties.os_profile.as_ref().unwrap();
        assert!(os.windows_configuration.is_none());
        assert!(os.linux_configuration.is_some());
        assert_eq!(vm.strategy().create_time(&model), LINUX_CREATE_SECONDS);
    }

    #[test]
    fn test_example_windows_flag_with_ubuntu_image() {
        let rg = create_resource_group_config("rg");
        let nic = nic(&rg);
        let vm = rg.create_virtual_machine_config("vm1", &nic, true, "admin", "P@ss1234", &ubuntu(), "Standard_DS1_v2");

        let model = vm.create_model(&ctx());
        let props = &model.properties;
        assert_eq!(props.hardware_profile.as_ref().unwrap().vm_size, "Standard_DS1_v2");
        assert_eq!(
            props.storage_profile.as_ref().unwrap().image_reference.as_ref().unwrap().offer,
            "UbuntuServer"
        );
        let os = props.os_profile.as_ref().unwrap();
        assert!(os.windows_configuration.is_some());
        assert!(os.linux_configuration.is_none());
        assert_eq!(vm.estimate_create_seconds(&ctx()), WINDOWS_CREATE_SECONDS);
    }

    #[test]
    fn test_dependency_is_the_supplied_network_interface() {
        let rg = create_resource_group_config("rg");
        let nic = nic(&rg);
        let vm = rg.create_virtual_machine_config("vm1", &nic, false, "admin", "pw", &ubuntu(), "Standard_A1");

        let deps = vm.dependencies();
        assert_eq!(deps.len(), 1);
        assert!(std::ptr::addr_eq(Arc::as_ptr(&deps[0]), Arc::as_ptr(&nic)));
        assert!(Arc::ptr_eq(vm.resource_group().unwrap(), &rg));
    }

    #[test]
    fn test_network_profile_references_nic_id() {
        let rg = create_resource_group_config("rg");
        let nic = nic(&rg);
        let vm = rg.create_virtual_machine_config("vm1", &nic, false, "admin", "pw", &ubuntu(), "Standard_A1");

        let model = vm.create_model(&ctx());
        assert_eq!(
            model.properties.network_profile.unwrap().network_interfaces,
            vec![NetworkInterfaceReference {
                id: "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Network/networkInterfaces/vm1".into()
            }]
        );
    }

    #[test]
    fn test_wire_format() {
        let rg = create_resource_group_config("rg");
        let nic = nic(&rg);
        let vm = rg.create_virtual_machine_config("vm1", &nic, false, "azureuser", "pw", &ubuntu(), "Standard_A1");

        let value = serde_json::to_value(vm.create_model(&ctx())).unwrap();
        assert_eq!(value["location"], "eastus");
        assert_eq!(
            value["properties"]["osProfile"],
            json!({
                "computerName": "vm1",
                "adminUsername": "azureuser",
                "adminPassword": "pw",
                "linuxConfiguration": {}
            })
        );
        assert_eq!(value["properties"]["hardwareProfile"]["vmSize"], "Standard_A1");
        assert_eq!(
            value["properties"]["storageProfile"]["imageReference"]["sku"],
            "18.04-LTS"
        );
    }

    #[test]
    fn test_create_time_without_os_profile() {
        assert_eq!(strategy().create_time(&VirtualMachine::default()), LINUX_CREATE_SECONDS);
    }

    #[test]
    fn test_debug_hides_password() {
        let os = OsProfile {
            admin_password: Some("hunter2".into()),
            ..Default::default()
        };
        assert!(!format!("{:?}", os).contains("hunter2"));
    }

    #[test]
    fn test_strategy_descriptor() {
        let s = strategy();
        assert_eq!(s.type_name(), "virtual machine");
        assert_eq!(
            s.resource_type().unwrap().to_string(),
            "Microsoft.Compute/virtualMachines"
        );
        assert_eq!(s.api_version(), policy::API_VERSION);
    }
}
