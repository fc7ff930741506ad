//! Building switches for new sessions.

use std::sync::Arc;

use super::registry::SwitchRegistry;
use crate::channel::ShellConnector;
use crate::driver::{DeviceLocks, Switch, TransactionalSwitch};
use crate::error::{Result, SessionError};
use crate::platform::create_switch;

/// Turns a hostname into an unconnected switch.
pub trait SwitchFactory: Send + Sync {
    fn get_switch(&self, hostname: &str) -> Result<Box<dyn Switch>>;
}

/// Looks the hostname up in a registry and wraps the model's driver in a
/// [`TransactionalSwitch`].
pub struct RegistryFactory {
    registry: Arc<dyn SwitchRegistry>,
    connector: Arc<dyn ShellConnector>,
    locks: DeviceLocks,
}

impl RegistryFactory {
    pub fn new(registry: Arc<dyn SwitchRegistry>, connector: Arc<dyn ShellConnector>) -> Self {
        Self {
            registry,
            connector,
            locks: DeviceLocks::global(),
        }
    }

    /// Lock through `locks` instead of the process-wide registry.
    pub fn with_locks(mut self, locks: DeviceLocks) -> Self {
        self.locks = locks;
        self
    }
}

impl SwitchFactory for RegistryFactory {
    fn get_switch(&self, hostname: &str) -> Result<Box<dyn Switch>> {
        let descriptor =
            self.registry
                .get(hostname)
                .ok_or_else(|| SessionError::UnknownSwitch {
                    hostname: hostname.to_string(),
                })?;

        let inner = create_switch(descriptor, Arc::clone(&self.connector))?;
        Ok(Box::new(TransactionalSwitch::with_locks(
            inner,
            self.locks.clone(),
        )))
    }
}
