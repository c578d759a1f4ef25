//! Startup-time capability registry
//!
//! Capabilities are registered by key before any step is declared. Steps that
//! name a key missing from the registry are rejected at registration, so a
//! typo in a pipeline file fails before anything runs.

use std::collections::BTreeMap;
use std::sync::Arc;

use baton_capability_protocol::{Capability, CapabilityKey};
use tracing::debug;

use crate::capabilities::{CleanCapability, CopyCapability, ExecCapability};
use crate::types::{BatonError, BatonResult};

/// Mapping of capability key to implementation
#[derive(Clone, Default)]
pub struct CapabilityRegistry {
    capabilities: BTreeMap<CapabilityKey, Arc<dyn Capability>>,
}

impl CapabilityRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in `exec`, `clean` and `copy` capabilities
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        let builtins: [Arc<dyn Capability>; 3] = [
            Arc::new(ExecCapability),
            Arc::new(CleanCapability),
            Arc::new(CopyCapability),
        ];
        for capability in builtins {
            if let Ok(key) = CapabilityKey::new(capability.key()) {
                registry.capabilities.insert(key, capability);
            }
        }
        registry
    }

    /// Register a capability under its own key
    pub fn register(&mut self, capability: Arc<dyn Capability>) -> BatonResult<()> {
        let key = CapabilityKey::new(capability.key()).map_err(BatonError::InvalidCapabilityKey)?;
        if self.capabilities.contains_key(&key) {
            return Err(BatonError::DuplicateCapability(key.to_string()));
        }
        debug!(capability = %key, "registered capability");
        self.capabilities.insert(key, capability);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn Capability>> {
        let key = CapabilityKey::new(key).ok()?;
        self.capabilities.get(&key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// All capabilities, sorted by key
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Capability>> {
        self.capabilities.values()
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.capabilities.keys()).finish()
    }
}
