//! Interface-name normalization at the capability boundary.

use std::net::Ipv4Addr;

use async_trait::async_trait;
use ipnetwork::Ipv4Network;

use super::{Capability, Switch};
use crate::error::Result;
use crate::model::{Direction, Interface, SwitchDescriptor, Vlan, VrrpGroup};

const ETHERNET_PREFIX: &str = "ethernet ";

/// A pair of functions translating interface names between what callers
/// use and what the device expects.
#[derive(Clone, Copy)]
pub struct InterfaceNaming {
    to_device: fn(&str) -> String,
    from_device: fn(&str) -> String,
}

impl InterfaceNaming {
    pub fn new(to_device: fn(&str) -> String, from_device: fn(&str) -> String) -> Self {
        Self {
            to_device,
            from_device,
        }
    }

    /// Callers use bare port numbers (`1/2`), the device `ethernet 1/2`.
    pub fn ethernet_prefix() -> Self {
        Self::new(
            |name| format!("{ETHERNET_PREFIX}{name}"),
            |name| {
                name.strip_prefix(ETHERNET_PREFIX)
                    .unwrap_or(name)
                    .to_string()
            },
        )
    }

    pub fn to_device(&self, name: &str) -> String {
        (self.to_device)(name)
    }

    pub fn from_device(&self, name: &str) -> String {
        (self.from_device)(name)
    }

    fn interface_from_device(&self, mut interface: Interface) -> Interface {
        interface.name = self.from_device(&interface.name);
        interface
    }

    fn vlan_from_device(&self, mut vlan: Vlan) -> Vlan {
        for group in &mut vlan.vrrp_groups {
            if let Some(track) = group.track_id.as_mut() {
                *track = self.from_device(track);
            }
        }
        vlan
    }
}

/// Applies an [`InterfaceNaming`] to every interface name crossing the
/// [`Switch`] API of the wrapped driver.
pub struct NormalizedSwitch {
    inner: Box<dyn Switch>,
    naming: InterfaceNaming,
}

impl NormalizedSwitch {
    pub fn new(inner: Box<dyn Switch>, naming: InterfaceNaming) -> Self {
        Self { inner, naming }
    }
}

#[async_trait]
impl Switch for NormalizedSwitch {
    fn descriptor(&self) -> &SwitchDescriptor {
        self.inner.descriptor()
    }

    fn capabilities(&self) -> &'static [Capability] {
        self.inner.capabilities()
    }

    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    async fn connect(&mut self) -> Result<()> {
        self.inner.connect().await
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.inner.disconnect().await
    }

    async fn start_transaction(&mut self) -> Result<()> {
        self.inner.start_transaction().await
    }

    async fn end_transaction(&mut self) -> Result<()> {
        self.inner.end_transaction().await
    }

    async fn commit_transaction(&mut self) -> Result<()> {
        self.inner.commit_transaction().await
    }

    async fn rollback_transaction(&mut self) -> Result<()> {
        self.inner.rollback_transaction().await
    }

    async fn get_vlans(&mut self) -> Result<Vec<Vlan>> {
        let vlans = self.inner.get_vlans().await?;
        Ok(vlans
            .into_iter()
            .map(|v| self.naming.vlan_from_device(v))
            .collect())
    }

    async fn get_vlan(&mut self, number: u16) -> Result<Vlan> {
        let vlan = self.inner.get_vlan(number).await?;
        Ok(self.naming.vlan_from_device(vlan))
    }

    async fn add_vlan(&mut self, number: u16, name: Option<&str>) -> Result<()> {
        self.inner.add_vlan(number, name).await
    }

    async fn remove_vlan(&mut self, number: u16) -> Result<()> {
        self.inner.remove_vlan(number).await
    }

    async fn get_vlan_interfaces(&mut self, number: u16) -> Result<Vec<String>> {
        let names = self.inner.get_vlan_interfaces(number).await?;
        Ok(names.iter().map(|n| self.naming.from_device(n)).collect())
    }

    async fn get_interfaces(&mut self) -> Result<Vec<Interface>> {
        let interfaces = self.inner.get_interfaces().await?;
        Ok(interfaces
            .into_iter()
            .map(|i| self.naming.interface_from_device(i))
            .collect())
    }

    async fn get_interface(&mut self, interface: &str) -> Result<Interface> {
        let name = self.naming.to_device(interface);
        let found = self.inner.get_interface(&name).await?;
        Ok(self.naming.interface_from_device(found))
    }

    async fn set_access_vlan(&mut self, interface: &str, vlan: u16) -> Result<()> {
        let name = self.naming.to_device(interface);
        self.inner.set_access_vlan(&name, vlan).await
    }

    async fn unset_interface_access_vlan(&mut self, interface: &str) -> Result<()> {
        let name = self.naming.to_device(interface);
        self.inner.unset_interface_access_vlan(&name).await
    }

    async fn set_access_mode(&mut self, interface: &str) -> Result<()> {
        let name = self.naming.to_device(interface);
        self.inner.set_access_mode(&name).await
    }

    async fn set_trunk_mode(&mut self, interface: &str) -> Result<()> {
        let name = self.naming.to_device(interface);
        self.inner.set_trunk_mode(&name).await
    }

    async fn add_trunk_vlan(&mut self, interface: &str, vlan: u16) -> Result<()> {
        let name = self.naming.to_device(interface);
        self.inner.add_trunk_vlan(&name, vlan).await
    }

    async fn remove_trunk_vlan(&mut self, interface: &str, vlan: u16) -> Result<()> {
        let name = self.naming.to_device(interface);
        self.inner.remove_trunk_vlan(&name, vlan).await
    }

    async fn set_interface_native_vlan(&mut self, interface: &str, vlan: u16) -> Result<()> {
        let name = self.naming.to_device(interface);
        self.inner.set_interface_native_vlan(&name, vlan).await
    }

    async fn unset_interface_native_vlan(&mut self, interface: &str) -> Result<()> {
        let name = self.naming.to_device(interface);
        self.inner.unset_interface_native_vlan(&name).await
    }

    async fn set_interface_description(&mut self, interface: &str, description: &str) -> Result<()> {
        let name = self.naming.to_device(interface);
        self.inner.set_interface_description(&name, description).await
    }

    async fn unset_interface_description(&mut self, interface: &str) -> Result<()> {
        let name = self.naming.to_device(interface);
        self.inner.unset_interface_description(&name).await
    }

    async fn set_interface_state(&mut self, interface: &str, shutdown: bool) -> Result<()> {
        let name = self.naming.to_device(interface);
        self.inner.set_interface_state(&name, shutdown).await
    }

    async fn reset_interface(&mut self, interface: &str) -> Result<()> {
        let name = self.naming.to_device(interface);
        self.inner.reset_interface(&name).await
    }

    async fn add_ip_to_vlan(&mut self, vlan: u16, network: Ipv4Network) -> Result<()> {
        self.inner.add_ip_to_vlan(vlan, network).await
    }

    async fn remove_ip_from_vlan(&mut self, vlan: u16, network: Ipv4Network) -> Result<()> {
        self.inner.remove_ip_from_vlan(vlan, network).await
    }

    async fn set_vlan_access_group(
        &mut self,
        vlan: u16,
        direction: Direction,
        name: &str,
    ) -> Result<()> {
        self.inner.set_vlan_access_group(vlan, direction, name).await
    }

    async fn unset_vlan_access_group(&mut self, vlan: u16, direction: Direction) -> Result<()> {
        self.inner.unset_vlan_access_group(vlan, direction).await
    }

    async fn set_vlan_vrf(&mut self, vlan: u16, vrf: &str) -> Result<()> {
        self.inner.set_vlan_vrf(vlan, vrf).await
    }

    async fn unset_vlan_vrf(&mut self, vlan: u16) -> Result<()> {
        self.inner.unset_vlan_vrf(vlan).await
    }

    async fn set_vlan_icmp_redirects_state(&mut self, vlan: u16, enabled: bool) -> Result<()> {
        self.inner.set_vlan_icmp_redirects_state(vlan, enabled).await
    }

    async fn add_vrrp_group(&mut self, vlan: u16, group: &VrrpGroup) -> Result<()> {
        let mut group = group.clone();
        if let Some(track) = group.track_id.as_mut() {
            *track = self.naming.to_device(track);
        }
        self.inner.add_vrrp_group(vlan, &group).await
    }

    async fn remove_vrrp_group(&mut self, vlan: u16, group_id: u8) -> Result<()> {
        self.inner.remove_vrrp_group(vlan, group_id).await
    }

    async fn add_dhcp_relay_server(&mut self, vlan: u16, address: Ipv4Addr) -> Result<()> {
        self.inner.add_dhcp_relay_server(vlan, address).await
    }

    async fn remove_dhcp_relay_server(&mut self, vlan: u16, address: Ipv4Addr) -> Result<()> {
        self.inner.remove_dhcp_relay_server(vlan, address).await
    }

    async fn add_bond(&mut self, number: u16) -> Result<()> {
        self.inner.add_bond(number).await
    }

    async fn remove_bond(&mut self, number: u16) -> Result<()> {
        self.inner.remove_bond(number).await
    }

    async fn add_interface_to_bond(&mut self, interface: &str, bond: u16) -> Result<()> {
        let name = self.naming.to_device(interface);
        self.inner.add_interface_to_bond(&name, bond).await
    }

    async fn remove_interface_from_bond(&mut self, interface: &str) -> Result<()> {
        let name = self.naming.to_device(interface);
        self.inner.remove_interface_from_bond(&name).await
    }

    async fn set_interface_edge(&mut self, interface: &str, edge: bool) -> Result<()> {
        let name = self.naming.to_device(interface);
        self.inner.set_interface_edge(&name, edge).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::platform::vendors::brocade::Brocade;
    use crate::testing::{MockConnector, MockShell, descriptor};

    #[test]
    fn test_ethernet_prefix_round_trip() {
        let naming = InterfaceNaming::ethernet_prefix();
        assert_eq!(naming.to_device("1/2"), "ethernet 1/2");
        assert_eq!(naming.from_device("ethernet 1/2"), "1/2");
        assert_eq!(naming.from_device("ve 10"), "ve 10");
    }

    #[tokio::test]
    async fn test_commands_use_device_names() {
        let shell = MockShell::new();
        let log = shell.log();
        let connector = Arc::new(MockConnector::new(shell));
        let inner = Brocade::new(
            descriptor("my.switch", "brocade_backward_compatible"),
            connector,
        );
        let mut switch = NormalizedSwitch::new(Box::new(inner), InterfaceNaming::ethernet_prefix());

        switch.connect().await.unwrap();
        log.clear();
        switch.set_interface_state("1/3", false).await.unwrap();

        assert_eq!(
            log.commands(),
            vec!["configure terminal", "interface ethernet 1/3", "enable", "exit", "exit"]
        );
    }

    #[tokio::test]
    async fn test_vlan_members_use_caller_names() {
        let mut shell = MockShell::new();
        shell.reply_text(
            "show vlan 10",
            "PORT-VLAN 10, Name servers, Priority level0, Spanning tree Off\n \
             Untagged Ports: ethe 1/1 to 1/2\n \
             Statically tagged Ports: ethe 1/4\n \
             Associated Virtual Interface Id: NONE",
        );
        let connector = Arc::new(MockConnector::new(shell));
        let inner = Brocade::new(
            descriptor("my.switch", "brocade_backward_compatible"),
            connector,
        );
        let mut switch = NormalizedSwitch::new(Box::new(inner), InterfaceNaming::ethernet_prefix());

        switch.connect().await.unwrap();
        let members = switch.get_vlan_interfaces(10).await.unwrap();
        assert_eq!(members, vec!["1/1", "1/2", "1/4"]);
    }
}
