//! HAL device tree and device classification.
//!
//! - `bus` - bus kinds and classification tables
//! - `tree` - arena-backed device tree built from a validated HAL structure
//! - `classify` - real bus, real-device and reliable-data decisions, vendor
//!   and product identification

pub mod bus;
pub mod classify;
pub mod tree;

pub use bus::*;
pub use classify::*;
pub use tree::*;
