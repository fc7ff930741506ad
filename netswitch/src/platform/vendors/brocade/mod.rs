//! Brocade FastIron / ICX dialect.
//!
//! Commands apply immediately, so there is no candidate configuration:
//! commit saves with `write memory` and rollback is a no-op. Ports are
//! addressed as `ethernet <slot>/<port>`; routed VLANs go through a virtual
//! interface (`ve`) attached with `router-interface`.

mod driver;
mod parse;

pub use driver::Brocade;
