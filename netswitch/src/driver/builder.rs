//! Builder for creating switch drivers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::lock::DeviceLocks;
use super::transactional::TransactionalSwitch;
use crate::channel::{ShellConnector, SshConnector};
use crate::error::{DriverError, Result};
use crate::model::SwitchDescriptor;
use crate::platform::create_switch;
use crate::transport::{HostKeyVerification, SshOptions};

/// Builder for constructing a locked, transactional switch driver.
///
/// # Example
///
/// ```rust,no_run
/// use netswitch::{Switch, SwitchBuilder};
///
/// # async fn example() -> Result<(), netswitch::Error> {
/// let mut switch = SwitchBuilder::new("192.168.1.1")
///     .username("admin")
///     .password("secret")
///     .model("brocade")
///     .build()?;
///
/// switch.connect().await?;
/// switch.add_vlan(100, Some("servers")).await?;
/// switch.disconnect().await?;
/// # Ok(())
/// # }
/// ```
pub struct SwitchBuilder {
    host: String,
    port: Option<u16>,
    username: Option<String>,
    password: String,
    model: Option<String>,
    proxy_chain: Vec<String>,
    options: SshOptions,
    connector: Option<Arc<dyn ShellConnector>>,
    locks: Option<DeviceLocks>,
    lock_timeout: Option<Duration>,
}

impl SwitchBuilder {
    /// Create a new switch builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            username: None,
            password: String::new(),
            model: None,
            proxy_chain: Vec::new(),
            options: SshOptions::default(),
            connector: None,
            locks: None,
            lock_timeout: None,
        }
    }

    /// Set the SSH port (default: 22).
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the username for authentication.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the password, also used to enter privileged mode.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Set the model tag (e.g., "brocade").
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Add a jump host. No built-in driver supports proxying yet.
    pub fn proxy(mut self, hop: impl Into<String>) -> Self {
        self.proxy_chain.push(hop.into());
        self
    }

    /// Set the command timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    /// Set terminal dimensions.
    pub fn terminal_size(mut self, width: u32, height: u32) -> Self {
        self.options.terminal_width = width;
        self.options.terminal_height = height;
        self
    }

    /// Set how the server's host key is checked.
    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.options.host_key_verification = mode;
        self
    }

    /// Use a known_hosts file other than `~/.ssh/known_hosts`.
    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.known_hosts_path = Some(path.into());
        self
    }

    /// Open shells with `connector` instead of SSH.
    pub fn connector(mut self, connector: Arc<dyn ShellConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Lock through `locks` instead of the process-wide registry.
    pub fn locks(mut self, locks: DeviceLocks) -> Self {
        self.locks = Some(locks);
        self
    }

    /// Give up connecting after waiting `timeout` for the device lock.
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    /// Build the driver.
    ///
    /// This creates the driver but does not connect. Call `connect()` on the
    /// returned switch to take the device lock and open the session.
    pub fn build(self) -> Result<TransactionalSwitch> {
        let username = self.username.ok_or_else(|| DriverError::InvalidConfig {
            message: "Username is required".to_string(),
        })?;
        let model = self.model.ok_or_else(|| DriverError::InvalidConfig {
            message: "Model must be specified".to_string(),
        })?;

        let mut descriptor = SwitchDescriptor::new(self.host, model, username, self.password);
        if let Some(port) = self.port {
            descriptor = descriptor.with_port(port);
        }
        for hop in self.proxy_chain {
            descriptor = descriptor.with_proxy(hop);
        }

        let options = self.options;
        let connector = self
            .connector
            .unwrap_or_else(|| Arc::new(SshConnector::new(options)));

        let inner = create_switch(descriptor, connector)?;
        let mut switch = match self.locks {
            Some(locks) => TransactionalSwitch::with_locks(inner, locks),
            None => TransactionalSwitch::new(inner),
        };
        if let Some(timeout) = self.lock_timeout {
            switch = switch.lock_timeout(timeout);
        }
        Ok(switch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::Switch;
    use crate::error::{Error, ErrorKind};
    use crate::testing::{MockConnector, MockShell};

    #[test]
    fn test_username_required() {
        let Err(err) = SwitchBuilder::new("my.switch").model("brocade").build() else {
            panic!("builder without username should fail");
        };
        assert!(matches!(
            err,
            Error::Driver(DriverError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_unknown_model() {
        let Err(err) = SwitchBuilder::new("my.switch")
            .username("admin")
            .model("nexus")
            .build()
        else {
            panic!("unknown model should fail");
        };
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_build_and_connect() {
        let shell = MockShell::new();
        let log = shell.log();
        let connector = Arc::new(MockConnector::new(shell));

        let mut switch = SwitchBuilder::new("my.switch")
            .port(2222)
            .username("admin")
            .password("secret")
            .model("brocade")
            .connector(connector.clone())
            .locks(DeviceLocks::new())
            .build()
            .unwrap();

        assert_eq!(switch.descriptor().port, Some(2222));
        assert_eq!(switch.descriptor().model, "brocade");

        switch.connect().await.unwrap();
        assert_eq!(connector.connects(), 1);
        assert_eq!(log.commands(), vec!["skip-page-display"]);
        switch.disconnect().await.unwrap();
    }
}
