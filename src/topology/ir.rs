//! Intermediate representation.
//!
//! The IR is a serializable snapshot of a topology, independent of the
//! in-memory tree: one map of router records and one of host records, both
//! keyed by node id. It is what `topogen` writes to disk and what the
//! physical mapper consumes.
//!
//! ```json
//! {
//!   "Router": {
//!     "1": {
//!       "name": "vRouter-1",
//!       "uplink_network": "10.0.0.0/24",
//!       "neighbors": [[1, 2, "Host"], [2, 3, "Host"]],
//!       "routing_table": [[1, "10.0.1.0/24"], [2, "10.0.2.0/24"]]
//!     }
//!   },
//!   "Host": {
//!     "2": { "name": "Host-2", "ip": "10.0.1.1/24", "mac": "08:00:0a:00:01:01" },
//!     "3": { "name": "Host-3", "ip": "10.0.2.1/24", "mac": "08:00:0a:00:02:01" }
//!   }
//! }
//! ```

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::io::{Read, Write};
use thiserror::Error;

use super::types::{EgressIndex, Host, NodeId, NodeKind, Router, RoutingEntry};
use super::visitor::{Order, Visitor};
use crate::ip::MacAddress;

/// Adjacency entry of a router record: `[egress index, neighbor id, neighbor kind]`.
pub type NeighborEntry = (EgressIndex, NodeId, NodeKind);

/// Errors found while reading or checking an IR document
#[derive(Debug, Error)]
pub enum IrError {
    #[error("IR contains no root router")]
    MissingRoot,
    #[error("IR contains more than one root router: {0:?}")]
    MultipleRoots(Vec<NodeId>),
    #[error("Router {router} references unknown {kind} {node}")]
    UnknownNode {
        router: NodeId,
        node: NodeId,
        kind: NodeKind,
    },
    #[error("Node {node} is a neighbor of both router {first} and router {second}")]
    MultipleParents {
        node: NodeId,
        first: NodeId,
        second: NodeId,
    },
    #[error("Node id {0} is used by both a router and a host")]
    DuplicateId(NodeId),
    #[error("Nodes {0:?} are not reachable from the root")]
    Unreachable(Vec<NodeId>),
    #[error("Malformed IR document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Router record of the IR
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterRecord {
    pub name: String,
    pub uplink_network: Ipv4Net,
    pub neighbors: Vec<NeighborEntry>,
    #[serde(alias = "routingtable")]
    pub routing_table: Vec<RoutingEntry>,
}

/// Host record of the IR, also the per-host entry of the host configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    pub name: String,
    /// Primary address with prefix length
    pub ip: Ipv4Net,
    pub mac: MacAddress,
}

/// The intermediate representation of a topology
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ir {
    #[serde(rename = "Router", alias = "vRouter")]
    pub routers: BTreeMap<NodeId, RouterRecord>,
    #[serde(rename = "Host")]
    pub hosts: BTreeMap<NodeId, HostRecord>,
}

impl Ir {
    /// Parse an IR document
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, IrError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Write the IR as indented JSON
    pub fn to_writer_pretty<W: Write>(&self, writer: W) -> Result<(), IrError> {
        Ok(serde_json::to_writer_pretty(writer, self)?)
    }

    /// The root router: the only router that is nobody's neighbor.
    pub fn root(&self) -> Result<NodeId, IrError> {
        let children: BTreeSet<NodeId> = self
            .routers
            .values()
            .flat_map(|r| r.neighbors.iter().map(|(_, id, _)| *id))
            .collect();
        let roots: Vec<NodeId> = self
            .routers
            .keys()
            .filter(|id| !children.contains(id))
            .copied()
            .collect();

        match roots.as_slice() {
            [] => Err(IrError::MissingRoot),
            [root] => Ok(*root),
            _ => Err(IrError::MultipleRoots(roots)),
        }
    }

    /// Check that the IR describes a single tree.
    ///
    /// Ids must be unique across routers and hosts. Every referenced node
    /// must exist with the referenced kind, no node may have two parents, and
    /// every node must be reachable from the root. Returns the root.
    pub fn validate(&self) -> Result<NodeId, IrError> {
        if let Some(id) = self.routers.keys().find(|id| self.hosts.contains_key(id)) {
            return Err(IrError::DuplicateId(*id));
        }

        let mut parent: BTreeMap<NodeId, NodeId> = BTreeMap::new();
        for (router_id, router) in &self.routers {
            for (_, neighbor, kind) in &router.neighbors {
                let exists = match kind {
                    NodeKind::Router => self.routers.contains_key(neighbor),
                    NodeKind::Host => self.hosts.contains_key(neighbor),
                };
                if !exists {
                    return Err(IrError::UnknownNode {
                        router: *router_id,
                        node: *neighbor,
                        kind: *kind,
                    });
                }
                if let Some(first) = parent.insert(*neighbor, *router_id) {
                    return Err(IrError::MultipleParents {
                        node: *neighbor,
                        first,
                        second: *router_id,
                    });
                }
            }
        }

        let root = self.root()?;

        // Every node except the root must be reached exactly once
        let mut reached = BTreeSet::from([root]);
        let mut queue = VecDeque::from([root]);
        while let Some(id) = queue.pop_front() {
            if let Some(router) = self.routers.get(&id) {
                for (_, neighbor, kind) in &router.neighbors {
                    if reached.insert(*neighbor) && *kind == NodeKind::Router {
                        queue.push_back(*neighbor);
                    }
                }
            }
        }
        let unreachable: Vec<NodeId> = self
            .routers
            .keys()
            .chain(self.hosts.keys())
            .filter(|id| !reached.contains(id))
            .copied()
            .collect();
        if !unreachable.is_empty() {
            return Err(IrError::Unreachable(unreachable));
        }

        Ok(root)
    }

    /// Total number of nodes
    pub fn node_count(&self) -> usize {
        self.routers.len() + self.hosts.len()
    }
}

/// Pre-order visitor collecting the IR of a topology.
#[derive(Debug, Default)]
pub struct IrBuilder {
    ir: Ir,
}

impl IrBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> Ir {
        self.ir
    }
}

impl Visitor for IrBuilder {
    fn order(&self) -> Order {
        Order::PreOrder
    }

    fn visit_router(&mut self, router: &Router) {
        let neighbors = router
            .egress_neighbors()
            .map(|(egress, n)| (egress, n.id(), n.kind()))
            .collect();
        let record = RouterRecord {
            name: router.name().to_string(),
            uplink_network: router.uplink_network(),
            neighbors,
            routing_table: router.routing_table().to_vec(),
        };
        if self.ir.routers.insert(router.id(), record).is_some() {
            log::error!("Router {} visited twice while building the IR", router.id());
        }
    }

    fn visit_host(&mut self, host: &Host) {
        let record = HostRecord {
            name: host.name().to_string(),
            ip: host.host_ip_with_prefix(),
            mac: host.mac_address(),
        };
        if self.ir.hosts.insert(host.id(), record).is_some() {
            log::error!("Host {} visited twice while building the IR", host.id());
        }
    }
}
