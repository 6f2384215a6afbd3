//! Node construction context.
//!
//! Ids and subnets are handed out in construction order. Both counters live in
//! one [`AllocatorContext`] that is passed to every node constructor, so two
//! topologies built from fresh (or reset) contexts are numbered identically.

use crate::config::AddressPlan;
use crate::ip::{AllocationError, SubnetAllocator};

use super::types::{Host, NodeId, Router};

/// Source of node ids and uplink subnets for one topology.
#[derive(Debug, Clone)]
pub struct AllocatorContext {
    next_id: u32,
    subnets: SubnetAllocator,
}

impl AllocatorContext {
    pub fn new(plan: &AddressPlan) -> Result<Self, AllocationError> {
        Ok(Self {
            next_id: 1,
            subnets: SubnetAllocator::new(plan)?,
        })
    }

    /// Rewind the id counter to 1 and the subnet pool to its first subnet.
    pub fn reset(&mut self) {
        self.next_id = 1;
        self.subnets.reset();
    }

    /// Construct a router with the next id and subnet.
    pub fn router(&mut self) -> Result<Router, AllocationError> {
        let (id, subnet) = self.allocate()?;
        Ok(Router::new(id, subnet))
    }

    /// Construct a host with the next id and subnet.
    pub fn host(&mut self) -> Result<Host, AllocationError> {
        let (id, subnet) = self.allocate()?;
        Ok(Host::new(id, subnet))
    }

    /// Number of nodes constructed so far.
    pub fn allocated(&self) -> usize {
        self.subnets.allocated()
    }

    fn allocate(&mut self) -> Result<(NodeId, ipnet::Ipv4Net), AllocationError> {
        // Take the subnet first so an exhausted pool does not burn an id
        let subnet = self.subnets.next_subnet()?;
        let id = NodeId(self.next_id);
        self.next_id += 1;
        Ok((id, subnet))
    }
}
