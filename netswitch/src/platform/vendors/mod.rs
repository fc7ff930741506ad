//! Vendor dialect drivers.

pub mod brocade;
