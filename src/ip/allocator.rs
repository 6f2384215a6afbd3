//! Subnet allocation.
//!
//! Every node of a topology owns exactly one uplink network. The networks are
//! carved out of a single address block (the address space of the
//! [`AddressPlan`]) by splitting it at a fixed prefix length and handing the
//! resulting subnets out in ascending order.

use ipnet::{Ipv4Net, Ipv4Subnets};
use thiserror::Error;

use crate::config::AddressPlan;

/// Errors raised by the [`SubnetAllocator`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    /// All subnets of the address space have been handed out.
    #[error("Subnet pool of {address_space} exhausted, all {capacity} subnets are in use")]
    PoolExhausted {
        address_space: Ipv4Net,
        capacity: usize,
    },
    /// The configured prefix length cannot split the address space.
    #[error("Cannot split {address_space} into /{prefix_len} subnets")]
    InvalidPrefixLength { address_space: Ipv4Net, prefix_len: u8 },
}

/// Hands out the subnets of one address block, in order, exactly once.
#[derive(Debug, Clone)]
pub struct SubnetAllocator {
    address_space: Ipv4Net,
    prefix_len: u8,
    subnets: Ipv4Subnets,
    allocated: usize,
}

impl SubnetAllocator {
    /// Create an allocator for the given address plan.
    ///
    /// Fails if the prefix length is shorter than the prefix of the address
    /// space or longer than 32 bits.
    pub fn new(plan: &AddressPlan) -> Result<Self, AllocationError> {
        let subnets = plan.address_space.subnets(plan.prefix_len).map_err(|_| {
            AllocationError::InvalidPrefixLength {
                address_space: plan.address_space,
                prefix_len: plan.prefix_len,
            }
        })?;
        Ok(Self {
            address_space: plan.address_space,
            prefix_len: plan.prefix_len,
            subnets,
            allocated: 0,
        })
    }

    /// Return the next unused subnet.
    pub fn next_subnet(&mut self) -> Result<Ipv4Net, AllocationError> {
        match self.subnets.next() {
            Some(subnet) => {
                self.allocated += 1;
                log::trace!("Allocated subnet {} ({} in use)", subnet, self.allocated);
                Ok(subnet)
            }
            None => Err(AllocationError::PoolExhausted {
                address_space: self.address_space,
                capacity: self.capacity(),
            }),
        }
    }

    /// Rewind the allocator so the next call returns the first subnet again.
    pub fn reset(&mut self) {
        // Cannot fail: the same split succeeded in `new`.
        if let Ok(subnets) = self.address_space.subnets(self.prefix_len) {
            self.subnets = subnets;
        }
        self.allocated = 0;
    }

    /// Number of subnets handed out since creation or the last reset.
    pub fn allocated(&self) -> usize {
        self.allocated
    }

    /// Total number of subnets the address space can provide.
    pub fn capacity(&self) -> usize {
        1usize
            .checked_shl(u32::from(self.prefix_len - self.address_space.prefix_len()))
            .unwrap_or(usize::MAX)
    }
}
