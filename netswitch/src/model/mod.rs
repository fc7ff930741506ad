//! Configuration data model shared by every driver.
//!
//! Drivers build these values when parsing device output and callers pass
//! them back in when writing. Everything here is plain data.

mod descriptor;
mod interface;
mod vlan;
mod vrrp;

pub use descriptor::SwitchDescriptor;
pub use interface::{Interface, PortMode};
pub use vlan::{AccessGroups, Direction, Vlan, VlanIp};
pub use vrrp::VrrpGroup;

/// Lowest VLAN number a device accepts.
pub const MIN_VLAN: u16 = 1;

/// Highest VLAN number a device accepts.
pub const MAX_VLAN: u16 = 4094;
