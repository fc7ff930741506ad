//! VRRP groups attached to a VLAN's routed interface.

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

/// One VRRP instance on a VLAN.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VrrpGroup {
    /// Group id, unique per VLAN (1-255).
    pub id: u8,
    pub ips: Vec<Ipv4Addr>,
    pub priority: Option<u8>,
    pub hello_interval: Option<u32>,
    pub dead_interval: Option<u32>,
    /// Interface whose state is tracked.
    pub track_id: Option<String>,
    /// Priority lost while the tracked interface is down.
    pub track_decrement: Option<u32>,
}

impl VrrpGroup {
    /// Create an empty group.
    pub fn new(id: u8) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }
}
