//! Lookup of switch descriptors by hostname.

use std::collections::HashMap;

use serde::Deserialize;

use crate::model::SwitchDescriptor;

/// Source of switch descriptors. Read-only from the session manager's side.
pub trait SwitchRegistry: Send + Sync {
    fn get(&self, hostname: &str) -> Option<SwitchDescriptor>;
}

/// Registry held in memory, deserializable from a list of descriptors.
///
/// ```rust
/// use netswitch::session::{InMemorySwitchRegistry, SwitchRegistry};
///
/// let registry: InMemorySwitchRegistry = serde_json::from_str(
///     r#"[{"hostname": "my.switch", "model": "brocade",
///          "username": "admin", "password": "secret"}]"#,
/// ).unwrap();
/// assert!(registry.get("my.switch").is_some());
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "Vec<SwitchDescriptor>")]
pub struct InMemorySwitchRegistry {
    switches: HashMap<String, SwitchDescriptor>,
}

impl InMemorySwitchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the descriptor for its hostname.
    pub fn insert(&mut self, descriptor: SwitchDescriptor) {
        self.switches
            .insert(descriptor.hostname.clone(), descriptor);
    }

    pub fn len(&self) -> usize {
        self.switches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.switches.is_empty()
    }
}

impl From<Vec<SwitchDescriptor>> for InMemorySwitchRegistry {
    fn from(descriptors: Vec<SwitchDescriptor>) -> Self {
        let mut registry = Self::new();
        for descriptor in descriptors {
            registry.insert(descriptor);
        }
        registry
    }
}

impl SwitchRegistry for InMemorySwitchRegistry {
    fn get(&self, hostname: &str) -> Option<SwitchDescriptor> {
        self.switches.get(hostname).cloned()
    }
}
