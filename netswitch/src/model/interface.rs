//! Physical interface state.

use serde::{Deserialize, Serialize};

/// How an interface carries VLANs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortMode {
    /// One untagged VLAN.
    #[default]
    Access,
    /// Tagged VLANs, optionally with an untagged native VLAN.
    Trunk,
}

/// A physical port as reported by the device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    pub shutdown: bool,
    pub port_mode: PortMode,
    pub access_vlan: Option<u16>,
    pub trunk_native_vlan: Option<u16>,
    /// Sorted, without duplicates.
    pub trunk_vlans: Vec<u16>,
    pub description: Option<String>,
}

impl Interface {
    /// Create an enabled access-mode interface with no VLAN.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Derive the port mode from untagged/tagged memberships.
    ///
    /// Untagged only is access, untagged plus tagged is a trunk with a native
    /// VLAN, tagged only is a plain trunk.
    pub fn apply_memberships(&mut self, untagged: Option<u16>, mut tagged: Vec<u16>) {
        tagged.sort_unstable();
        tagged.dedup();

        match (untagged, tagged.is_empty()) {
            (Some(vlan), true) => {
                self.port_mode = PortMode::Access;
                self.access_vlan = Some(vlan);
            }
            (Some(vlan), false) => {
                self.port_mode = PortMode::Trunk;
                self.trunk_native_vlan = Some(vlan);
                self.trunk_vlans = tagged;
            }
            (None, false) => {
                self.port_mode = PortMode::Trunk;
                self.trunk_vlans = tagged;
            }
            (None, true) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_only_is_access() {
        let mut interface = Interface::new("ethernet 1/1");
        interface.apply_memberships(Some(10), vec![]);
        assert_eq!(interface.port_mode, PortMode::Access);
        assert_eq!(interface.access_vlan, Some(10));
        assert_eq!(interface.trunk_native_vlan, None);
    }

    #[test]
    fn test_untagged_and_tagged_is_trunk_with_native() {
        let mut interface = Interface::new("ethernet 1/1");
        interface.apply_memberships(Some(10), vec![30, 20, 30]);
        assert_eq!(interface.port_mode, PortMode::Trunk);
        assert_eq!(interface.access_vlan, None);
        assert_eq!(interface.trunk_native_vlan, Some(10));
        assert_eq!(interface.trunk_vlans, vec![20, 30]);
    }

    #[test]
    fn test_tagged_only_is_trunk() {
        let mut interface = Interface::new("ethernet 1/1");
        interface.apply_memberships(None, vec![5]);
        assert_eq!(interface.port_mode, PortMode::Trunk);
        assert_eq!(interface.trunk_native_vlan, None);
        assert_eq!(interface.trunk_vlans, vec![5]);
    }

    #[test]
    fn test_no_membership_stays_access() {
        let mut interface = Interface::new("ethernet 1/1");
        interface.apply_memberships(None, vec![]);
        assert_eq!(interface, Interface::new("ethernet 1/1"));
    }
}
