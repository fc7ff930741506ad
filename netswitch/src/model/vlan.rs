//! VLANs and their routed-interface attributes.

use std::fmt;
use std::net::Ipv4Addr;

use ipnetwork::Ipv4Network;
use serde::{Deserialize, Serialize};

use super::VrrpGroup;

/// Traffic direction an access group filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    /// Keyword used on the device command line.
    pub fn keyword(self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }

    /// Parse the device keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "in" => Some(Direction::In),
            "out" => Some(Direction::Out),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::In => write!(f, "Inbound"),
            Direction::Out => write!(f, "Outbound"),
        }
    }
}

/// The two access-group slots of a routed interface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGroups {
    pub inbound: Option<String>,
    pub outbound: Option<String>,
}

impl AccessGroups {
    pub fn get(&self, direction: Direction) -> Option<&str> {
        match direction {
            Direction::In => self.inbound.as_deref(),
            Direction::Out => self.outbound.as_deref(),
        }
    }

    pub fn set(&mut self, direction: Direction, name: Option<String>) {
        match direction {
            Direction::In => self.inbound = name,
            Direction::Out => self.outbound = name,
        }
    }
}

/// An address configured on a routed interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanIp {
    /// Host address with its prefix length, e.g. `10.0.0.1/24`.
    pub network: Ipv4Network,
    pub is_secondary: bool,
}

impl VlanIp {
    pub fn primary(network: Ipv4Network) -> Self {
        Self {
            network,
            is_secondary: false,
        }
    }

    pub fn secondary(network: Ipv4Network) -> Self {
        Self {
            network,
            is_secondary: true,
        }
    }

    /// Whether `address` falls inside this entry's subnet.
    pub fn contains(&self, address: Ipv4Addr) -> bool {
        self.network.contains(address)
    }
}

/// A VLAN and, when it has one, the state of its routed interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vlan {
    pub number: u16,
    pub name: Option<String>,
    pub ips: Vec<VlanIp>,
    pub access_groups: AccessGroups,
    pub vrf_forwarding: Option<String>,
    pub vrrp_groups: Vec<VrrpGroup>,
    pub dhcp_relay_servers: Vec<Ipv4Addr>,
    pub icmp_redirects: bool,
    /// Identifier of the routed (virtual) interface, at most one per VLAN.
    pub vlan_interface_name: Option<String>,
}

impl Vlan {
    pub fn new(number: u16) -> Self {
        Self {
            number,
            name: None,
            ips: Vec::new(),
            access_groups: AccessGroups::default(),
            vrf_forwarding: None,
            vrrp_groups: Vec::new(),
            dhcp_relay_servers: Vec::new(),
            icmp_redirects: true,
            vlan_interface_name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn vrrp_group(&self, id: u8) -> Option<&VrrpGroup> {
        self.vrrp_groups.iter().find(|g| g.id == id)
    }

    /// Group with this id, created and appended when absent.
    pub fn vrrp_group_mut(&mut self, id: u8) -> &mut VrrpGroup {
        let index = match self.vrrp_groups.iter().position(|g| g.id == id) {
            Some(index) => index,
            None => {
                self.vrrp_groups.push(VrrpGroup::new(id));
                self.vrrp_groups.len() - 1
            }
        };
        &mut self.vrrp_groups[index]
    }
}
