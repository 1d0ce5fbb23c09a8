//! Capability trait: named side functions the agent may call mid-turn.
//!
//! A capability takes a free-text query and returns free text. Its name and
//! description are shown to the generation service so it can decide when
//! the capability is relevant.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::CapabilityError;

/// The name and description of a capability, as presented to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    pub name: String,
    pub description: String,
}

/// The core Capability trait.
#[async_trait]
pub trait Capability: Send + Sync {
    /// The unique name of this capability (e.g., "book_database_search").
    fn name(&self) -> &str;

    /// What this capability does and when to use it (sent to the model).
    fn description(&self) -> &str;

    /// Run the capability with a free-text query.
    async fn invoke(&self, query: &str) -> Result<String, CapabilityError>;

    fn descriptor(&self) -> CapabilityDescriptor {
        CapabilityDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
        }
    }
}

/// A fixed set of capabilities, built once at startup and then shared
/// read-only. Names are unique; iteration order is by name.
pub struct CapabilityRegistry {
    capabilities: BTreeMap<String, Box<dyn Capability>>,
}

impl CapabilityRegistry {
    /// An empty registry (the agent answers directly, never acting).
    pub fn new() -> Self {
        Self {
            capabilities: BTreeMap::new(),
        }
    }

    /// Build a registry from a static list, rejecting duplicate names.
    pub fn from_capabilities(
        capabilities: Vec<Box<dyn Capability>>,
    ) -> Result<Self, CapabilityError> {
        let mut registry = Self::new();
        for capability in capabilities {
            registry.register(capability)?;
        }
        Ok(registry)
    }

    /// Register a capability.
    pub fn register(&mut self, capability: Box<dyn Capability>) -> Result<(), CapabilityError> {
        let name = capability.name().to_string();
        if self.capabilities.contains_key(&name) {
            return Err(CapabilityError::Duplicate(name));
        }
        self.capabilities.insert(name, capability);
        Ok(())
    }

    /// Descriptors of every registered capability.
    pub fn list(&self) -> Vec<CapabilityDescriptor> {
        self.capabilities.values().map(|c| c.descriptor()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.capabilities.contains_key(name)
    }

    /// Invoke a capability by name.
    pub async fn invoke(&self, name: &str, query: &str) -> Result<String, CapabilityError> {
        let capability = self
            .capabilities
            .get(name)
            .ok_or_else(|| CapabilityError::UnknownCapability(name.to_string()))?;
        capability.invoke(query).await
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
