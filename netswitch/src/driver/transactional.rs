//! Locking and transaction bracketing around any [`Switch`].

use std::net::Ipv4Addr;
use std::time::Duration;

use async_trait::async_trait;
use ipnetwork::Ipv4Network;
use log::{debug, info, warn};

use super::lock::{DeviceLockGuard, DeviceLocks};
use super::{Capability, Switch};
use crate::error::{DriverError, Result};
use crate::model::{Direction, Interface, SwitchDescriptor, Vlan, VrrpGroup};

/// Decorates a driver with the device lock and transaction bracketing.
///
/// `connect` takes the device lock before the driver connects and
/// `disconnect` releases it after the driver disconnects, so every wrapper
/// targeting the same hostname is serialized for the whole connected
/// period. Writes issued outside [`Switch::start_transaction`] /
/// [`Switch::end_transaction`] get a transaction of their own and are
/// committed (or rolled back) immediately.
pub struct TransactionalSwitch {
    inner: Box<dyn Switch>,
    locks: DeviceLocks,
    lock_timeout: Option<Duration>,
    guard: Option<DeviceLockGuard>,
    in_transaction: bool,
}

impl TransactionalSwitch {
    /// Wrap `inner`, locking through the process-wide registry.
    pub fn new(inner: Box<dyn Switch>) -> Self {
        Self::with_locks(inner, DeviceLocks::global())
    }

    pub fn with_locks(inner: Box<dyn Switch>, locks: DeviceLocks) -> Self {
        Self {
            inner,
            locks,
            lock_timeout: None,
            guard: None,
            in_transaction: false,
        }
    }

    /// Fail `connect` with [`DriverError::LockTimeout`] instead of waiting
    /// forever for another holder to disconnect.
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.guard.is_none() {
            return Err(DriverError::NotConnected.into());
        }
        Ok(())
    }
}

/// Run one write, inside its own transaction unless one is already open.
macro_rules! bracketed {
    ($self:ident . $method:ident ( $($arg:expr),* )) => {{
        $self.ensure_connected()?;
        if $self.in_transaction {
            $self.inner.$method($($arg),*).await
        } else {
            $self.inner.start_transaction().await?;
            let outcome = match $self.inner.$method($($arg),*).await {
                Ok(value) => $self.inner.commit_transaction().await.map(|_| value),
                Err(e) => {
                    if let Err(rollback) = $self.inner.rollback_transaction().await {
                        warn!("rollback after failed {} also failed: {rollback}", stringify!($method));
                    }
                    Err(e)
                }
            };
            let ended = $self.inner.end_transaction().await;
            match (outcome, ended) {
                (Ok(value), Ok(())) => Ok(value),
                (Ok(_), Err(e)) => Err(e),
                (Err(e), _) => Err(e),
            }
        }
    }};
}

#[async_trait]
impl Switch for TransactionalSwitch {
    fn descriptor(&self) -> &SwitchDescriptor {
        self.inner.descriptor()
    }

    fn capabilities(&self) -> &'static [Capability] {
        self.inner.capabilities()
    }

    fn is_connected(&self) -> bool {
        self.guard.is_some() && self.inner.is_connected()
    }

    async fn connect(&mut self) -> Result<()> {
        if self.guard.is_some() {
            return Err(DriverError::AlreadyConnected.into());
        }

        let hostname = self.inner.descriptor().hostname.clone();
        let guard = self.locks.acquire(&hostname, self.lock_timeout).await?;

        // Dropping the guard on failure releases the device.
        self.inner.connect().await?;
        self.guard = Some(guard);
        info!("connected to {hostname}");
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.ensure_connected()?;
        let result = self.inner.disconnect().await;
        self.in_transaction = false;
        self.guard = None;
        info!("disconnected from {}", self.inner.descriptor().hostname);
        result
    }

    async fn start_transaction(&mut self) -> Result<()> {
        self.ensure_connected()?;
        self.inner.start_transaction().await?;
        self.in_transaction = true;
        debug!("transaction started on {}", self.inner.descriptor().hostname);
        Ok(())
    }

    async fn end_transaction(&mut self) -> Result<()> {
        self.ensure_connected()?;
        self.in_transaction = false;
        self.inner.end_transaction().await?;
        debug!("transaction ended on {}", self.inner.descriptor().hostname);
        Ok(())
    }

    async fn commit_transaction(&mut self) -> Result<()> {
        self.ensure_connected()?;
        self.inner.commit_transaction().await
    }

    async fn rollback_transaction(&mut self) -> Result<()> {
        self.ensure_connected()?;
        self.inner.rollback_transaction().await
    }

    async fn get_vlans(&mut self) -> Result<Vec<Vlan>> {
        self.inner.get_vlans().await
    }

    async fn get_vlan(&mut self, number: u16) -> Result<Vlan> {
        self.inner.get_vlan(number).await
    }

    async fn add_vlan(&mut self, number: u16, name: Option<&str>) -> Result<()> {
        bracketed!(self.add_vlan(number, name))
    }

    async fn remove_vlan(&mut self, number: u16) -> Result<()> {
        bracketed!(self.remove_vlan(number))
    }

    async fn get_vlan_interfaces(&mut self, number: u16) -> Result<Vec<String>> {
        self.inner.get_vlan_interfaces(number).await
    }

    async fn get_interfaces(&mut self) -> Result<Vec<Interface>> {
        self.inner.get_interfaces().await
    }

    async fn get_interface(&mut self, interface: &str) -> Result<Interface> {
        self.inner.get_interface(interface).await
    }

    async fn set_access_vlan(&mut self, interface: &str, vlan: u16) -> Result<()> {
        bracketed!(self.set_access_vlan(interface, vlan))
    }

    async fn unset_interface_access_vlan(&mut self, interface: &str) -> Result<()> {
        bracketed!(self.unset_interface_access_vlan(interface))
    }

    async fn set_access_mode(&mut self, interface: &str) -> Result<()> {
        bracketed!(self.set_access_mode(interface))
    }

    async fn set_trunk_mode(&mut self, interface: &str) -> Result<()> {
        bracketed!(self.set_trunk_mode(interface))
    }

    async fn add_trunk_vlan(&mut self, interface: &str, vlan: u16) -> Result<()> {
        bracketed!(self.add_trunk_vlan(interface, vlan))
    }

    async fn remove_trunk_vlan(&mut self, interface: &str, vlan: u16) -> Result<()> {
        bracketed!(self.remove_trunk_vlan(interface, vlan))
    }

    async fn set_interface_native_vlan(&mut self, interface: &str, vlan: u16) -> Result<()> {
        bracketed!(self.set_interface_native_vlan(interface, vlan))
    }

    async fn unset_interface_native_vlan(&mut self, interface: &str) -> Result<()> {
        bracketed!(self.unset_interface_native_vlan(interface))
    }

    async fn set_interface_description(&mut self, interface: &str, description: &str) -> Result<()> {
        bracketed!(self.set_interface_description(interface, description))
    }

    async fn unset_interface_description(&mut self, interface: &str) -> Result<()> {
        bracketed!(self.unset_interface_description(interface))
    }

    async fn set_interface_state(&mut self, interface: &str, shutdown: bool) -> Result<()> {
        bracketed!(self.set_interface_state(interface, shutdown))
    }

    async fn reset_interface(&mut self, interface: &str) -> Result<()> {
        bracketed!(self.reset_interface(interface))
    }

    async fn add_ip_to_vlan(&mut self, vlan: u16, network: Ipv4Network) -> Result<()> {
        bracketed!(self.add_ip_to_vlan(vlan, network))
    }

    async fn remove_ip_from_vlan(&mut self, vlan: u16, network: Ipv4Network) -> Result<()> {
        bracketed!(self.remove_ip_from_vlan(vlan, network))
    }

    async fn set_vlan_access_group(
        &mut self,
        vlan: u16,
        direction: Direction,
        name: &str,
    ) -> Result<()> {
        bracketed!(self.set_vlan_access_group(vlan, direction, name))
    }

    async fn unset_vlan_access_group(&mut self, vlan: u16, direction: Direction) -> Result<()> {
        bracketed!(self.unset_vlan_access_group(vlan, direction))
    }

    async fn set_vlan_vrf(&mut self, vlan: u16, vrf: &str) -> Result<()> {
        bracketed!(self.set_vlan_vrf(vlan, vrf))
    }

    async fn unset_vlan_vrf(&mut self, vlan: u16) -> Result<()> {
        bracketed!(self.unset_vlan_vrf(vlan))
    }

    async fn set_vlan_icmp_redirects_state(&mut self, vlan: u16, enabled: bool) -> Result<()> {
        bracketed!(self.set_vlan_icmp_redirects_state(vlan, enabled))
    }

    async fn add_vrrp_group(&mut self, vlan: u16, group: &VrrpGroup) -> Result<()> {
        bracketed!(self.add_vrrp_group(vlan, group))
    }

    async fn remove_vrrp_group(&mut self, vlan: u16, group_id: u8) -> Result<()> {
        bracketed!(self.remove_vrrp_group(vlan, group_id))
    }

    async fn add_dhcp_relay_server(&mut self, vlan: u16, address: Ipv4Addr) -> Result<()> {
        bracketed!(self.add_dhcp_relay_server(vlan, address))
    }

    async fn remove_dhcp_relay_server(&mut self, vlan: u16, address: Ipv4Addr) -> Result<()> {
        bracketed!(self.remove_dhcp_relay_server(vlan, address))
    }

    async fn add_bond(&mut self, number: u16) -> Result<()> {
        bracketed!(self.add_bond(number))
    }

    async fn remove_bond(&mut self, number: u16) -> Result<()> {
        bracketed!(self.remove_bond(number))
    }

    async fn add_interface_to_bond(&mut self, interface: &str, bond: u16) -> Result<()> {
        bracketed!(self.add_interface_to_bond(interface, bond))
    }

    async fn remove_interface_from_bond(&mut self, interface: &str) -> Result<()> {
        bracketed!(self.remove_interface_from_bond(interface))
    }

    async fn set_interface_edge(&mut self, interface: &str, edge: bool) -> Result<()> {
        bracketed!(self.set_interface_edge(interface, edge))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::{Error, ErrorKind, SwitchError};
    use crate::platform::vendors::brocade::Brocade;
    use crate::testing::{MockConnector, MockShell, descriptor};

    fn brocade(shell: MockShell) -> (Box<dyn Switch>, Arc<MockConnector>) {
        let connector = Arc::new(MockConnector::new(shell));
        let switch = Brocade::new(descriptor("my.switch", "brocade"), connector.clone());
        (Box::new(switch), connector)
    }

    #[tokio::test]
    async fn test_write_outside_transaction_is_committed() {
        let shell = MockShell::new();
        let log = shell.log();
        let (inner, _) = brocade(shell);
        let mut switch = TransactionalSwitch::with_locks(inner, DeviceLocks::new());

        switch.connect().await.unwrap();
        log.clear();
        switch.set_interface_state("ethernet 1/1", true).await.unwrap();

        assert_eq!(
            log.commands(),
            vec![
                "configure terminal",
                "interface ethernet 1/1",
                "disable",
                "exit",
                "exit",
                "write memory"
            ]
        );
    }

    #[tokio::test]
    async fn test_explicit_transaction_commits_once() {
        let shell = MockShell::new();
        let log = shell.log();
        let (inner, _) = brocade(shell);
        let mut switch = TransactionalSwitch::with_locks(inner, DeviceLocks::new());

        switch.connect().await.unwrap();
        switch.start_transaction().await.unwrap();
        assert!(switch.in_transaction());
        log.clear();

        switch.set_interface_state("ethernet 1/1", false).await.unwrap();
        switch.set_interface_state("ethernet 1/2", false).await.unwrap();
        assert!(!log.commands().contains(&"write memory".to_string()));

        switch.commit_transaction().await.unwrap();
        switch.end_transaction().await.unwrap();
        assert!(!switch.in_transaction());

        let writes = log
            .commands()
            .into_iter()
            .filter(|c| c == "write memory")
            .count();
        assert_eq!(writes, 1);
    }

    #[tokio::test]
    async fn test_failed_write_is_not_committed() {
        let mut shell = MockShell::new();
        shell.reply("interface ethernet 9/99", &["Invalid input -> 9/99"]);
        let log = shell.log();
        let (inner, _) = brocade(shell);
        let mut switch = TransactionalSwitch::with_locks(inner, DeviceLocks::new());

        switch.connect().await.unwrap();
        let err = switch
            .set_interface_state("ethernet 9/99", true)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Switch(SwitchError::UnknownInterface { .. })
        ));
        assert!(!log.commands().contains(&"write memory".to_string()));
    }

    #[tokio::test]
    async fn test_write_requires_connection() {
        let (inner, _) = brocade(MockShell::new());
        let mut switch = TransactionalSwitch::with_locks(inner, DeviceLocks::new());

        let err = switch.add_vlan(10, None).await.unwrap_err();
        assert!(matches!(err, Error::Driver(DriverError::NotConnected)));
        assert!(switch.start_transaction().await.is_err());
    }

    #[tokio::test]
    async fn test_unsupported_passes_through() {
        let (inner, _) = brocade(MockShell::new());
        let mut switch = TransactionalSwitch::with_locks(inner, DeviceLocks::new());
        switch.connect().await.unwrap();

        assert!(!switch.supports(Capability::Bonds));
        let err = switch.add_bond(1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }

    #[tokio::test]
    async fn test_connect_failure_releases_lock() {
        let locks = DeviceLocks::new();
        let connector = Arc::new(MockConnector::failing());
        let inner = Box::new(Brocade::new(descriptor("my.switch", "brocade"), connector));
        let mut switch = TransactionalSwitch::with_locks(inner, locks.clone());

        assert!(switch.connect().await.is_err());
        assert!(!locks.is_locked("my.switch"));
        assert!(!switch.is_connected());
    }

    #[tokio::test]
    async fn test_same_device_connections_serialize() {
        let locks = DeviceLocks::new();
        let (first_inner, _) = brocade(MockShell::new());
        let (second_inner, _) = brocade(MockShell::new());
        let (impatient_inner, _) = brocade(MockShell::new());

        let mut first = TransactionalSwitch::with_locks(first_inner, locks.clone());
        let second = TransactionalSwitch::with_locks(second_inner, locks.clone());
        let mut impatient = TransactionalSwitch::with_locks(impatient_inner, locks.clone())
            .lock_timeout(Duration::from_millis(20));

        first.connect().await.unwrap();
        let err = impatient.connect().await.unwrap_err();
        assert!(matches!(err, Error::Driver(DriverError::LockTimeout { .. })));

        let waiter = tokio::spawn(async move {
            let mut second = second;
            second.connect().await.map(|_| second)
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        first.disconnect().await.unwrap();
        let second = waiter.await.unwrap().unwrap();
        assert!(second.is_connected());
    }
}
