//! Switch capability surface and the machinery shared by drivers.
//!
//! [`Switch`] is the vendor-neutral API. Vendor drivers implement it on top
//! of a [`Shell`](crate::channel::Shell) using the [`ModeStack`] and the
//! response [`Classifier`]; [`TransactionalSwitch`] and [`NormalizedSwitch`]
//! decorate any driver.

mod builder;
pub mod classify;
mod lock;
pub mod mode;
mod naming;
mod transactional;

pub use builder::SwitchBuilder;
pub use classify::{Classifier, Matcher};
pub use lock::{DeviceLockGuard, DeviceLocks};
pub use mode::{Mode, ModeStack};
pub use naming::{InterfaceNaming, NormalizedSwitch};
pub use transactional::TransactionalSwitch;

use std::net::Ipv4Addr;

use async_trait::async_trait;
use ipnetwork::Ipv4Network;

use crate::error::{Error, Result, SwitchError};
use crate::model::{Direction, Interface, SwitchDescriptor, Vlan, VrrpGroup};

/// Groups of related operations a driver may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Create, list and remove VLANs.
    Vlans,
    /// Port membership, modes, descriptions and state.
    Interfaces,
    /// Routed-interface attributes: IPs, access groups, VRF, ICMP redirects.
    VlanRouting,
    /// VRRP groups on routed interfaces.
    Vrrp,
    /// DHCP relay (helper) addresses.
    DhcpRelay,
    /// Link aggregation.
    Bonds,
    /// Spanning-tree port settings.
    SpanningTree,
}

/// Vendor-neutral switch API.
///
/// Lifecycle methods are required. Every capability method defaults to an
/// [`SwitchError::Unsupported`] error; drivers override the ones they
/// implement and list the matching groups in [`Switch::capabilities`], so
/// callers can check support up front instead of probing for errors.
#[async_trait]
pub trait Switch: Send {
    /// Descriptor of the device this switch talks to.
    fn descriptor(&self) -> &SwitchDescriptor;

    /// Capability groups this driver implements.
    fn capabilities(&self) -> &'static [Capability];

    /// Whether the driver implements `capability`.
    fn supports(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Whether a shell session is currently open.
    fn is_connected(&self) -> bool;

    async fn connect(&mut self) -> Result<()>;

    async fn disconnect(&mut self) -> Result<()>;

    async fn start_transaction(&mut self) -> Result<()>;

    async fn end_transaction(&mut self) -> Result<()>;

    /// Persist applied changes.
    async fn commit_transaction(&mut self) -> Result<()>;

    /// Discard staged changes, a no-op for dialects that apply immediately.
    async fn rollback_transaction(&mut self) -> Result<()>;

    // Vlans

    async fn get_vlans(&mut self) -> Result<Vec<Vlan>> {
        Err(unsupported(self.descriptor(), "get_vlans"))
    }

    async fn get_vlan(&mut self, _number: u16) -> Result<Vlan> {
        Err(unsupported(self.descriptor(), "get_vlan"))
    }

    async fn add_vlan(&mut self, _number: u16, _name: Option<&str>) -> Result<()> {
        Err(unsupported(self.descriptor(), "add_vlan"))
    }

    async fn remove_vlan(&mut self, _number: u16) -> Result<()> {
        Err(unsupported(self.descriptor(), "remove_vlan"))
    }

    /// Names of the interfaces carrying `number`, tagged or untagged.
    async fn get_vlan_interfaces(&mut self, _number: u16) -> Result<Vec<String>> {
        Err(unsupported(self.descriptor(), "get_vlan_interfaces"))
    }

    // Interfaces

    async fn get_interfaces(&mut self) -> Result<Vec<Interface>> {
        Err(unsupported(self.descriptor(), "get_interfaces"))
    }

    async fn get_interface(&mut self, _interface: &str) -> Result<Interface> {
        Err(unsupported(self.descriptor(), "get_interface"))
    }

    async fn set_access_vlan(&mut self, _interface: &str, _vlan: u16) -> Result<()> {
        Err(unsupported(self.descriptor(), "set_access_vlan"))
    }

    async fn unset_interface_access_vlan(&mut self, _interface: &str) -> Result<()> {
        Err(unsupported(self.descriptor(), "unset_interface_access_vlan"))
    }

    async fn set_access_mode(&mut self, _interface: &str) -> Result<()> {
        Err(unsupported(self.descriptor(), "set_access_mode"))
    }

    async fn set_trunk_mode(&mut self, _interface: &str) -> Result<()> {
        Err(unsupported(self.descriptor(), "set_trunk_mode"))
    }

    async fn add_trunk_vlan(&mut self, _interface: &str, _vlan: u16) -> Result<()> {
        Err(unsupported(self.descriptor(), "add_trunk_vlan"))
    }

    async fn remove_trunk_vlan(&mut self, _interface: &str, _vlan: u16) -> Result<()> {
        Err(unsupported(self.descriptor(), "remove_trunk_vlan"))
    }

    async fn set_interface_native_vlan(&mut self, _interface: &str, _vlan: u16) -> Result<()> {
        Err(unsupported(self.descriptor(), "set_interface_native_vlan"))
    }

    async fn unset_interface_native_vlan(&mut self, _interface: &str) -> Result<()> {
        Err(unsupported(self.descriptor(), "unset_interface_native_vlan"))
    }

    async fn set_interface_description(
        &mut self,
        _interface: &str,
        _description: &str,
    ) -> Result<()> {
        Err(unsupported(self.descriptor(), "set_interface_description"))
    }

    async fn unset_interface_description(&mut self, _interface: &str) -> Result<()> {
        Err(unsupported(self.descriptor(), "unset_interface_description"))
    }

    async fn set_interface_state(&mut self, _interface: &str, _shutdown: bool) -> Result<()> {
        Err(unsupported(self.descriptor(), "set_interface_state"))
    }

    /// Return an interface to factory defaults, dropping VLAN memberships.
    async fn reset_interface(&mut self, _interface: &str) -> Result<()> {
        Err(unsupported(self.descriptor(), "reset_interface"))
    }

    // VlanRouting

    async fn add_ip_to_vlan(&mut self, _vlan: u16, _network: Ipv4Network) -> Result<()> {
        Err(unsupported(self.descriptor(), "add_ip_to_vlan"))
    }

    async fn remove_ip_from_vlan(&mut self, _vlan: u16, _network: Ipv4Network) -> Result<()> {
        Err(unsupported(self.descriptor(), "remove_ip_from_vlan"))
    }

    async fn set_vlan_access_group(
        &mut self,
        _vlan: u16,
        _direction: Direction,
        _name: &str,
    ) -> Result<()> {
        Err(unsupported(self.descriptor(), "set_vlan_access_group"))
    }

    async fn unset_vlan_access_group(&mut self, _vlan: u16, _direction: Direction) -> Result<()> {
        Err(unsupported(self.descriptor(), "unset_vlan_access_group"))
    }

    async fn set_vlan_vrf(&mut self, _vlan: u16, _vrf: &str) -> Result<()> {
        Err(unsupported(self.descriptor(), "set_vlan_vrf"))
    }

    async fn unset_vlan_vrf(&mut self, _vlan: u16) -> Result<()> {
        Err(unsupported(self.descriptor(), "unset_vlan_vrf"))
    }

    async fn set_vlan_icmp_redirects_state(&mut self, _vlan: u16, _enabled: bool) -> Result<()> {
        Err(unsupported(self.descriptor(), "set_vlan_icmp_redirects_state"))
    }

    // Vrrp

    async fn add_vrrp_group(&mut self, _vlan: u16, _group: &VrrpGroup) -> Result<()> {
        Err(unsupported(self.descriptor(), "add_vrrp_group"))
    }

    async fn remove_vrrp_group(&mut self, _vlan: u16, _group_id: u8) -> Result<()> {
        Err(unsupported(self.descriptor(), "remove_vrrp_group"))
    }

    // DhcpRelay

    async fn add_dhcp_relay_server(&mut self, _vlan: u16, _address: Ipv4Addr) -> Result<()> {
        Err(unsupported(self.descriptor(), "add_dhcp_relay_server"))
    }

    async fn remove_dhcp_relay_server(&mut self, _vlan: u16, _address: Ipv4Addr) -> Result<()> {
        Err(unsupported(self.descriptor(), "remove_dhcp_relay_server"))
    }

    // Bonds

    async fn add_bond(&mut self, _number: u16) -> Result<()> {
        Err(unsupported(self.descriptor(), "add_bond"))
    }

    async fn remove_bond(&mut self, _number: u16) -> Result<()> {
        Err(unsupported(self.descriptor(), "remove_bond"))
    }

    async fn add_interface_to_bond(&mut self, _interface: &str, _bond: u16) -> Result<()> {
        Err(unsupported(self.descriptor(), "add_interface_to_bond"))
    }

    async fn remove_interface_from_bond(&mut self, _interface: &str) -> Result<()> {
        Err(unsupported(self.descriptor(), "remove_interface_from_bond"))
    }

    // SpanningTree

    async fn set_interface_edge(&mut self, _interface: &str, _edge: bool) -> Result<()> {
        Err(unsupported(self.descriptor(), "set_interface_edge"))
    }
}

/// Error returned by capability methods a driver does not implement.
pub fn unsupported(descriptor: &SwitchDescriptor, operation: &'static str) -> Error {
    SwitchError::Unsupported {
        operation,
        model: descriptor.model.clone(),
    }
    .into()
}
