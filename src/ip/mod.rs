//! Address management.
//!
//! This module hands out the uplink subnets of topology nodes and derives the
//! link-layer addresses of hosts.

pub mod allocator;
pub mod mac;

// Re-export commonly used types
pub use allocator::{AllocationError, SubnetAllocator};
pub use mac::{MacAddress, ParseMacAddressError, ROUTER_NEXT_HOP_MAC};
