//! Model tags and the vendor dialects behind them.
//!
//! A [`SwitchDescriptor`](crate::model::SwitchDescriptor) names its model;
//! the [`PlatformRegistry`] turns that tag into a driver implementing
//! [`Switch`](crate::driver::Switch).

mod registry;
pub mod vendors;

pub use registry::{PlatformRegistry, SwitchConstructor, create_switch};
