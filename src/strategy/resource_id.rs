//! ARM resource identifiers

use std::fmt;

/// Provider namespace and resource provider, e.g. `Microsoft.Compute/virtualMachines`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceType {
    pub namespace: &'static str,
    pub provider: &'static str,
}

impl ResourceType {
    pub const fn new(namespace: &'static str, provider: &'static str) -> Self {
        Self {
            namespace,
            provider,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.provider)
    }
}

/// Fully qualified resource id.
///
/// A resource group has no resource type and its `name` equals
/// `resource_group_name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    pub subscription_id: String,
    pub resource_group_name: String,
    pub resource_type: Option<ResourceType>,
    pub name: String,
}

impl ResourceId {
    /// Id of a resource group
    pub fn resource_group(subscription_id: &str, name: &str) -> Self {
        Self {
            subscription_id: subscription_id.to_string(),
            resource_group_name: name.to_string(),
            resource_type: None,
            name: name.to_string(),
        }
    }

    /// Id of a resource inside a resource group
    pub fn resource(
        subscription_id: &str,
        resource_group_name: &str,
        resource_type: ResourceType,
        name: &str,
    ) -> Self {
        Self {
            subscription_id: subscription_id.to_string(),
            resource_group_name: resource_group_name.to_string(),
            resource_type: Some(resource_type),
            name: name.to_string(),
        }
    }

    /// Canonical string form used in payload references
    pub fn id_to_string(&self) -> String {
        self.to_string()
    }

    /// Request path with each name segment percent-encoded
    pub fn to_path(&self) -> String {
        let group = format!(
            "/subscriptions/{}/resourceGroups/{}",
            urlencoding::encode(&self.subscription_id),
            urlencoding::encode(&self.resource_group_name)
        );
        match self.resource_type {
            None => group,
            Some(t) => format!(
                "{}/providers/{}/{}/{}",
                group,
                t.namespace,
                t.provider,
                urlencoding::encode(&self.name)
            ),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}",
            self.subscription_id, self.resource_group_name
        )?;
        if let Some(t) = self.resource_type {
            write!(f, "/providers/{}/{}/{}", t.namespace, t.provider, self.name)?;
        }
        Ok(())
    }
}
