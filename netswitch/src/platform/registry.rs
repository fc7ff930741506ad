//! Global registry mapping model tags to switch drivers.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use super::vendors::brocade::Brocade;
use crate::channel::ShellConnector;
use crate::driver::{InterfaceNaming, NormalizedSwitch, Switch};
use crate::error::{PlatformError, Result, SwitchError};
use crate::model::SwitchDescriptor;

/// Builds an unconnected driver for one descriptor.
pub type SwitchConstructor =
    Arc<dyn Fn(SwitchDescriptor, Arc<dyn ShellConnector>) -> Box<dyn Switch> + Send + Sync>;

/// Global platform registry.
static REGISTRY: LazyLock<RwLock<PlatformRegistry>> = LazyLock::new(|| {
    let mut registry = PlatformRegistry::new();
    registry.register_builtin_platforms();
    RwLock::new(registry)
});

/// Registry of driver constructors keyed by model tag.
#[derive(Default)]
pub struct PlatformRegistry {
    platforms: HashMap<String, SwitchConstructor>,
}

impl PlatformRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the global registry.
    pub fn global() -> &'static RwLock<PlatformRegistry> {
        &REGISTRY
    }

    fn register_builtin_platforms(&mut self) {
        self.platforms.insert(
            "brocade".to_string(),
            Arc::new(|descriptor, connector| -> Box<dyn Switch> {
                Box::new(Brocade::new(descriptor, connector))
            }),
        );

        // Same dialect, callers address ports without the media prefix
        self.platforms.insert(
            "brocade_backward_compatible".to_string(),
            Arc::new(|descriptor, connector| -> Box<dyn Switch> {
                Box::new(NormalizedSwitch::new(
                    Box::new(Brocade::new(descriptor, connector)),
                    InterfaceNaming::ethernet_prefix(),
                ))
            }),
        );
    }

    /// Register a driver constructor under a new model tag.
    pub fn register(
        &mut self,
        model: impl Into<String>,
        constructor: SwitchConstructor,
    ) -> Result<()> {
        let model = model.into();
        if self.platforms.contains_key(&model) {
            return Err(PlatformError::InvalidDefinition {
                message: format!("platform '{model}' is already registered"),
            }
            .into());
        }
        self.platforms.insert(model, constructor);
        Ok(())
    }

    /// Check if a model tag is registered.
    pub fn contains(&self, model: &str) -> bool {
        self.platforms.contains_key(model)
    }

    /// List all registered model tags.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.platforms.keys()
    }

    /// Build the driver registered for `descriptor.model`.
    pub fn create(
        &self,
        descriptor: SwitchDescriptor,
        connector: Arc<dyn ShellConnector>,
    ) -> Result<Box<dyn Switch>> {
        if !descriptor.proxy_chain.is_empty() {
            return Err(SwitchError::Unsupported {
                operation: "proxy_chain",
                model: descriptor.model.clone(),
            }
            .into());
        }

        let constructor = self
            .platforms
            .get(&descriptor.model)
            .ok_or_else(|| PlatformError::UnknownPlatform {
                name: descriptor.model.clone(),
            })?;
        Ok(constructor(descriptor, connector))
    }
}

/// Build a driver through the global registry.
pub fn create_switch(
    descriptor: SwitchDescriptor,
    connector: Arc<dyn ShellConnector>,
) -> Result<Box<dyn Switch>> {
    PlatformRegistry::global()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .create(descriptor, connector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::Capability;
    use crate::error::{Error, ErrorKind};
    use crate::testing::{MockConnector, MockShell, descriptor};

    fn connector() -> Arc<dyn ShellConnector> {
        Arc::new(MockConnector::new(MockShell::new()))
    }

    #[test]
    fn test_builtin_platforms() {
        let registry = PlatformRegistry::global().read().unwrap();
        assert!(registry.contains("brocade"));
        assert!(registry.contains("brocade_backward_compatible"));
    }

    #[test]
    fn test_create_known_model() {
        let switch = create_switch(descriptor("my.switch", "brocade"), connector()).unwrap();
        assert_eq!(switch.descriptor().hostname, "my.switch");
        assert!(switch.supports(Capability::Vrrp));
        assert!(!switch.supports(Capability::Bonds));
        assert!(!switch.is_connected());
    }

    #[test]
    fn test_unknown_model() {
        let Err(err) = create_switch(descriptor("my.switch", "nexus"), connector()) else {
            panic!("unknown model should be rejected");
        };
        assert!(matches!(
            err,
            Error::Platform(PlatformError::UnknownPlatform { ref name }) if name == "nexus"
        ));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_proxy_chain_rejected() {
        let descriptor = descriptor("my.switch", "brocade").with_proxy("jump.host");
        let Err(err) = create_switch(descriptor, connector()) else {
            panic!("proxied descriptor should be rejected");
        };
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }

    #[test]
    fn test_register_custom_platform() {
        let mut registry = PlatformRegistry::new();
        let ctor: SwitchConstructor = Arc::new(|descriptor, connector| -> Box<dyn Switch> {
            Box::new(Brocade::new(descriptor, connector))
        });

        registry.register("fastiron", ctor.clone()).unwrap();
        assert!(registry.register("fastiron", ctor).is_err());
        assert_eq!(registry.names().count(), 1);

        let switch = registry
            .create(descriptor("my.switch", "fastiron"), connector())
            .unwrap();
        assert_eq!(switch.descriptor().model, "fastiron");
    }
}
