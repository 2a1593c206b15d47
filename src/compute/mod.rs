//! Microsoft.Compute resources
//!
//! - [`virtual_machine`] - virtual machine strategy and configuration factory
//! - [`image`] - marketplace image references and aliases

pub mod image;
pub mod virtual_machine;

pub use image::Image;
pub use virtual_machine::VirtualMachine;

/// Strategy constructors for `Microsoft.Compute` providers
pub mod policy {
    use crate::strategy::{ResourceModel, ResourceStrategy, ResourceType};

    pub const NAMESPACE: &str = "Microsoft.Compute";
    pub const API_VERSION: &str = "2017-12-01";

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
