//! # Netswitch
//!
//! Async, vendor-neutral switch configuration over interactive CLI sessions.
//!
//! Netswitch drives network switches through the same SSH command line an
//! operator would use, behind one typed API: VLANs, port memberships, routed
//! VLAN interfaces, VRRP and DHCP relay.
//!
//! ## Features
//!
//! - Async SSH shells via russh, with pager handling and prompt tracking
//! - Configuration modes left in LIFO order on every exit path
//! - Device replies classified into typed errors
//! - Per-device locking and implicit transaction bracketing
//! - Sessions that keep a switch reserved across requests, with idle eviction
//! - Capability groups so callers can ask what a driver supports
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use netswitch::{Switch, SwitchBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), netswitch::Error> {
//!     let mut switch = SwitchBuilder::new("192.168.1.1")
//!         .username("admin")
//!         .password("secret")
//!         .model("brocade")
//!         .build()?;
//!
//!     switch.connect().await?;
//!
//!     switch.add_vlan(100, Some("servers")).await?;
//!     switch.set_access_vlan("ethernet 1/4", 100).await?;
//!     for vlan in switch.get_vlans().await? {
//!         println!("{} {:?}", vlan.number, vlan.name);
//!     }
//!
//!     switch.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod driver;
pub mod error;
pub mod model;
pub mod platform;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use driver::{Capability, Switch, SwitchBuilder, TransactionalSwitch};
pub use error::{Error, ErrorKind, Result};
pub use model::{Direction, Interface, PortMode, SwitchDescriptor, Vlan, VlanIp, VrrpGroup};
pub use platform::{PlatformRegistry, create_switch};
pub use session::{SessionConfig, SessionManager};
pub use transport::{HostKeyVerification, SshOptions};
