//! Logical network topology.
//!
//! A [`Topology`] owns a tree of virtual routers and hosts. All analyses run
//! as visitors over that tree: routing table synthesis, IR export and DOT
//! export.

pub mod context;
pub mod dot;
pub mod generator;
pub mod ir;
pub mod routing;
pub mod types;
pub mod visitor;

// Re-export key types and functions for easier access
pub use context::AllocatorContext;
pub use dot::DotVisitor;
pub use generator::{generate, TopologyType};
pub use ir::{HostRecord, Ir, IrBuilder, IrError, RouterRecord};
pub use routing::RoutingTableSynthesizer;
pub use types::{EgressIndex, Host, Node, NodeId, NodeKind, Router, RoutingEntry};
pub use visitor::{Order, Visitor, VisitorMut};

use crate::config::ValidationError;
use crate::ip::AllocationError;

/// Errors raised while building or analysing a topology
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    /// Synthesis appends to the tables, a second pass would duplicate every route
    #[error("Routing tables of this topology have already been synthesized")]
    RoutesAlreadySynthesized,
}

/// A tree of virtual routers and hosts with a single root router.
#[derive(Debug, Clone)]
pub struct Topology {
    root: Router,
    routes_synthesized: bool,
}

impl Topology {
    pub fn new(root: Router) -> Self {
        Self {
            root,
            routes_synthesized: false,
        }
    }

    pub fn root(&self) -> &Router {
        &self.root
    }

    /// Find a node below the root by id.
    pub fn descendant(&self, id: NodeId) -> Option<&Node> {
        fn find(router: &Router, id: NodeId) -> Option<&Node> {
            for neighbor in router.neighbors() {
                if neighbor.id() == id {
                    return Some(neighbor);
                }
                if let Node::Router(r) = neighbor {
                    if let Some(found) = find(r, id) {
                        return Some(found);
                    }
                }
            }
            None
        }
        find(&self.root, id)
    }

    /// Walk the whole tree with `visitor`, starting at the root.
    pub fn apply_visitor<V: Visitor + ?Sized>(&self, visitor: &mut V) {
        visitor::walk_router(&self.root, visitor);
    }

    /// Walk the whole tree with a visitor that may modify nodes.
    pub fn apply_visitor_mut<V: VisitorMut + ?Sized>(&mut self, visitor: &mut V) {
        visitor::walk_router_mut(&mut self.root, visitor);
    }

    /// Compute the routing table of every router.
    ///
    /// May only run once per topology.
    pub fn update_all_routing_tables(&mut self) -> Result<(), TopologyError> {
        if self.routes_synthesized {
            return Err(TopologyError::RoutesAlreadySynthesized);
        }
        let mut synthesizer = RoutingTableSynthesizer::new();
        self.apply_visitor_mut(&mut synthesizer);
        self.routes_synthesized = true;
        log::info!(
            "Synthesized routing tables of {} routers",
            synthesizer.updated_routers()
        );
        Ok(())
    }

    pub fn routes_synthesized(&self) -> bool {
        self.routes_synthesized
    }

    /// Snapshot the topology as its intermediate representation.
    pub fn ir_representation(&self) -> Ir {
        let mut builder = IrBuilder::new();
        self.apply_visitor(&mut builder);
        builder.finish()
    }

    /// Render the topology as DOT text, optionally labelling routers with
    /// their routing tables.
    pub fn dot_representation(&self, annotate: bool) -> String {
        let mut dot = DotVisitor::new(annotate);
        self.apply_visitor(&mut dot);
        dot.representation()
    }
}

#[cfg(test)]
mod tests {
    use super::generator::create_4_node_topo;
    use super::*;

    #[test]
    fn test_second_synthesis_is_rejected() {
        let mut topo = create_4_node_topo().unwrap();
        assert!(!topo.routes_synthesized());
        topo.update_all_routing_tables().unwrap();
        let before = topo.root().routing_table().to_vec();

        assert!(matches!(
            topo.update_all_routing_tables(),
            Err(TopologyError::RoutesAlreadySynthesized)
        ));
        assert_eq!(topo.root().routing_table(), before.as_slice());
    }

    #[test]
    fn test_tables_empty_before_synthesis() {
        let topo = create_4_node_topo().unwrap();
        let ir = topo.ir_representation();
        assert!(ir.routers.values().all(|r| r.routing_table.is_empty()));
    }

    #[test]
    fn test_medium_tables() {
        // 1 -> [2 -> [4], 3]
        let mut topo = create_4_node_topo().unwrap();
        topo.update_all_routing_tables().unwrap();

        let subnet = |id| topo.descendant(NodeId(id)).map(|n| n.uplink_network()).unwrap();
        assert_eq!(
            topo.root().routing_table(),
            &[(1, subnet(4)), (1, subnet(2)), (2, subnet(3))]
        );
        assert!(topo.descendant(NodeId(5)).is_none());
    }

    #[test]
    fn test_dot_shortcut() {
        let topo = create_4_node_topo().unwrap();
        assert_eq!(
            topo.dot_representation(false),
            "graph graphname {\n1[shape=box]\n1 -- 2\n1 -- 3\n2[shape=box]\n2 -- 4\n4\n3\n}"
        );
    }
}
