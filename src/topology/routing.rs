//! Routing table synthesis.
//!
//! Tables are built bottom-up: a router is visited after all of its
//! neighbors, takes over every subnet they can reach and adds the neighbor's
//! own uplink network, all on the neighbor's egress index. Nothing is ever
//! routed towards the parent; the catch-all route for that direction is added
//! during physical mapping.

use super::types::{Host, Node, Router, RoutingEntry};
use super::visitor::{Order, VisitorMut};

/// Post-order visitor filling in the routing table of every node.
#[derive(Debug, Default)]
pub struct RoutingTableSynthesizer {
    updated_routers: usize,
}

impl RoutingTableSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of routers whose table was computed.
    pub fn updated_routers(&self) -> usize {
        self.updated_routers
    }
}

/// Routes of `router`, computed from the (already final) tables of its neighbors.
pub fn downstream_routes(router: &Router) -> Vec<RoutingEntry> {
    let mut routes = Vec::new();
    for (egress, neighbor) in router.egress_neighbors() {
        routes.extend(
            neighbor
                .routing_table()
                .iter()
                .map(|(_, subnet)| (egress, *subnet)),
        );
        routes.push((egress, neighbor.uplink_network()));
    }
    routes
}

impl VisitorMut for RoutingTableSynthesizer {
    fn order(&self) -> Order {
        Order::PostOrder
    }

    fn visit_router(&mut self, router: &mut Router) {
        let routes = downstream_routes(router);
        log::debug!(
            "{} reaches {} subnets through {} neighbors",
            router.name,
            routes.len(),
            router.neighbors.len()
        );
        router.routing_table.extend(routes);
        self.updated_routers += 1;
    }

    fn visit_host(&mut self, host: &mut Host) {
        log::trace!("{} does not forward", host.name);
    }
}

/// All subnets owned by nodes in the subtree rooted at `node`.
pub fn subtree_subnets(node: &Node) -> Vec<ipnet::Ipv4Net> {
    let mut subnets = vec![node.uplink_network()];
    if let Node::Router(router) = node {
        for neighbor in router.neighbors() {
            subnets.extend(subtree_subnets(neighbor));
        }
    }
    subnets
}
