//! Topology node definitions.
//!
//! A topology is a tree of [`Node`]s. Routers own their neighbors, so every
//! node except the root has exactly one parent and the tree can never contain
//! a cycle.

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

use crate::ip::MacAddress;

/// Identifier of a node, unique across routers and hosts of one topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 1-based position of a neighbor in its router's adjacency list.
pub type EgressIndex = u32;

/// One forwarding entry: destination subnet reachable through an egress index.
pub type RoutingEntry = (EgressIndex, Ipv4Net);

/// Kind of a node, as written into the intermediate representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    #[serde(alias = "vRouter")]
    Router,
    #[serde(alias = "host")]
    Host,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Router => write!(f, "Router"),
            NodeKind::Host => write!(f, "Host"),
        }
    }
}

/// A virtual router.
#[derive(Debug, Clone, PartialEq)]
pub struct Router {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) uplink_network: Ipv4Net,
    pub(crate) routing_table: Vec<RoutingEntry>,
    pub(crate) neighbors: Vec<Node>,
}

/// A host attached to exactly one router.
#[derive(Debug, Clone, PartialEq)]
pub struct Host {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) uplink_network: Ipv4Net,
    pub(crate) mac_address: MacAddress,
}

/// A node of the topology tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Router(Router),
    Host(Host),
}

/// First usable address of a subnet (the subnet itself for /31 and /32).
fn first_usable(subnet: &Ipv4Net) -> Ipv4Addr {
    subnet.hosts().next().unwrap_or_else(|| subnet.network())
}

impl Router {
    pub(crate) fn new(id: NodeId, uplink_network: Ipv4Net) -> Self {
        Self {
            id,
            name: format!("vRouter-{}", id),
            uplink_network,
            routing_table: Vec::new(),
            neighbors: Vec::new(),
        }
    }

    /// Attach `node` as the next neighbor; it gets the next egress index.
    pub fn add_link(&mut self, node: impl Into<Node>) -> EgressIndex {
        let node = node.into();
        log::debug!("Link {} -- {}", self.id, node.id());
        self.neighbors.push(node);
        self.neighbors.len() as EgressIndex
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uplink_network(&self) -> Ipv4Net {
        self.uplink_network
    }

    pub fn primary_address(&self) -> Ipv4Addr {
        first_usable(&self.uplink_network)
    }

    pub fn routing_table(&self) -> &[RoutingEntry] {
        &self.routing_table
    }

    pub fn neighbors(&self) -> &[Node] {
        &self.neighbors
    }

    /// Neighbors together with their egress index.
    pub fn egress_neighbors(&self) -> impl Iterator<Item = (EgressIndex, &Node)> {
        self.neighbors
            .iter()
            .enumerate()
            .map(|(i, n)| (i as EgressIndex + 1, n))
    }
}

impl Host {
    pub(crate) fn new(id: NodeId, uplink_network: Ipv4Net) -> Self {
        let primary = first_usable(&uplink_network);
        Self {
            id,
            name: format!("Host-{}", id),
            uplink_network,
            mac_address: MacAddress::for_host(primary),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uplink_network(&self) -> Ipv4Net {
        self.uplink_network
    }

    pub fn primary_address(&self) -> Ipv4Addr {
        first_usable(&self.uplink_network)
    }

    pub fn mac_address(&self) -> MacAddress {
        self.mac_address
    }

    /// Primary address with the prefix length of the uplink network, e.g. `10.0.2.1/24`.
    pub fn host_ip_with_prefix(&self) -> Ipv4Net {
        // The prefix length comes from an existing network, so it is always valid
        Ipv4Net::new(self.primary_address(), self.uplink_network.prefix_len())
            .unwrap_or(self.uplink_network)
    }

    /// Hosts never forward, their table is always empty.
    pub fn routing_table(&self) -> &[RoutingEntry] {
        &[]
    }
}

impl Node {
    pub fn id(&self) -> NodeId {
        match self {
            Node::Router(r) => r.id,
            Node::Host(h) => h.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Node::Router(r) => &r.name,
            Node::Host(h) => &h.name,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Router(_) => NodeKind::Router,
            Node::Host(_) => NodeKind::Host,
        }
    }

    pub fn uplink_network(&self) -> Ipv4Net {
        match self {
            Node::Router(r) => r.uplink_network,
            Node::Host(h) => h.uplink_network,
        }
    }

    pub fn primary_address(&self) -> Ipv4Addr {
        first_usable(&self.uplink_network())
    }

    pub fn routing_table(&self) -> &[RoutingEntry] {
        match self {
            Node::Router(r) => r.routing_table(),
            Node::Host(h) => h.routing_table(),
        }
    }
}

impl From<Router> for Node {
    fn from(router: Router) -> Self {
        Node::Router(router)
    }
}

impl From<Host> for Node {
    fn from(host: Host) -> Self {
        Node::Host(host)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} - id: {})", self.name(), self.id())
    }
}
