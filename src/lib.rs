//! Declarative Azure resource configuration.
//!
//! Resources are described as an immutable graph of [`strategy::ResourceConfig`]
//! values, each bound to a [`strategy::ResourceStrategy`] that knows how to get,
//! create and time that resource type. The graph is submitted to Azure Resource
//! Manager by [`strategy::deploy::apply`] through an injected
//! [`azure::ResourceOperations`] client.

pub mod azure;
pub mod compute;
pub mod config;
pub mod network;
pub mod resources;
pub mod strategy;
