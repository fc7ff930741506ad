//! Sessions reserving a connected switch across independent requests.
//!
//! A [`SessionManager`] opens a switch through a [`SwitchFactory`], keeps it
//! connected under a session id and evicts it after a period of inactivity.
//! The switch holds its device lock for as long as the session lives.

mod factory;
mod manager;
mod registry;

pub use factory::{RegistryFactory, SwitchFactory};
pub use manager::{Session, SessionConfig, SessionManager};
pub use registry::{InMemorySwitchRegistry, SwitchRegistry};
