//! Topology generators.
//!
//! Each generator resets its [`AllocatorContext`] before building, so the
//! same generator always yields the same ids and subnets. A router has to be
//! complete before it is linked to its parent (the parent takes ownership),
//! which is why child links are added bottom-up while the nodes themselves are
//! constructed top-down.

use log::{debug, info};

use crate::config::{AddressPlan, ValidationError};

use super::context::AllocatorContext;
use super::types::Router;
use super::{Topology, TopologyError};

/// Kinds of topologies the generator can build
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TopologyType {
    /// One router with two hosts
    Minimal,
    /// Two routers with one host each
    Medium,
    /// Three-layer router tree with 18 hosts
    Large,
    /// Chain of routers between two hosts
    NHops,
}

/// Build a topology of the given type with the given address plan.
pub fn generate(
    topology_type: TopologyType,
    hops: Option<u32>,
    plan: &AddressPlan,
) -> Result<Topology, TopologyError> {
    let mut ctx = AllocatorContext::new(plan)?;
    match topology_type {
        TopologyType::Minimal => build_3_node_topo(&mut ctx),
        TopologyType::Medium => build_4_node_topo(&mut ctx),
        TopologyType::Large => build_multi_layer_topo(&mut ctx),
        TopologyType::NHops => {
            let hops = hops.ok_or_else(|| {
                ValidationError::InvalidTopology(
                    "For type `n-hops` a number of hops has to be specified using --hops <int>"
                        .to_string(),
                )
            })?;
            build_n_hop_topo(&mut ctx, hops)
        }
    }
}

/// One router with two hosts; the router only forwards between them.
pub fn create_3_node_topo() -> Result<Topology, TopologyError> {
    build_3_node_topo(&mut AllocatorContext::new(&AddressPlan::default())?)
}

/// Two connected routers, each with one host. The minimal multi-router setup.
pub fn create_4_node_topo() -> Result<Topology, TopologyError> {
    build_4_node_topo(&mut AllocatorContext::new(&AddressPlan::default())?)
}

/// One core router with three routers below it, each of those with three
/// routers below, each of those with two hosts.
pub fn create_multi_layer_topo() -> Result<Topology, TopologyError> {
    build_multi_layer_topo(&mut AllocatorContext::new(&AddressPlan::default())?)
}

/// `hops` routers in a chain, with one host at each end of the chain.
pub fn create_n_hop_topo(hops: u32) -> Result<Topology, TopologyError> {
    build_n_hop_topo(&mut AllocatorContext::new(&AddressPlan::default())?, hops)
}

pub fn build_3_node_topo(ctx: &mut AllocatorContext) -> Result<Topology, TopologyError> {
    info!("Instantiate new 3 node topology");
    ctx.reset();

    let mut root = ctx.router()?;
    root.add_link(ctx.host()?);
    root.add_link(ctx.host()?);

    Ok(finish(ctx, root))
}

pub fn build_4_node_topo(ctx: &mut AllocatorContext) -> Result<Topology, TopologyError> {
    info!("Instantiate new 4 node topology");
    ctx.reset();

    let mut root = ctx.router()?;
    let mut tmp = ctx.router()?;
    let root_host = ctx.host()?;
    tmp.add_link(ctx.host()?);

    root.add_link(tmp);
    root.add_link(root_host);

    Ok(finish(ctx, root))
}

pub fn build_multi_layer_topo(ctx: &mut AllocatorContext) -> Result<Topology, TopologyError> {
    info!("Instantiate new multilayer topology");
    ctx.reset();

    let mut root = ctx.router()?;
    for _ in 0..3 {
        let mut l1 = ctx.router()?;
        for _ in 0..3 {
            let mut l2 = ctx.router()?;
            for _ in 0..2 {
                l2.add_link(ctx.host()?);
            }
            l1.add_link(l2);
        }
        root.add_link(l1);
    }

    Ok(finish(ctx, root))
}

pub fn build_n_hop_topo(ctx: &mut AllocatorContext, hops: u32) -> Result<Topology, TopologyError> {
    if hops == 0 {
        return Err(ValidationError::InvalidTopology(
            "an n-hop topology needs at least one router".to_string(),
        )
        .into());
    }
    info!("Instantiate new {} hop topology", hops);
    ctx.reset();

    let root = chain(ctx, hops, true)?;
    Ok(finish(ctx, root))
}

fn finish(ctx: &AllocatorContext, root: Router) -> Topology {
    debug!("Topology below {} uses {} subnets", root.name(), ctx.allocated());
    Topology::new(root)
}

/// Build `remaining` routers in a chain; the last one gets the tail host and
/// the head gets the head host after the rest of the chain was attached.
fn chain(
    ctx: &mut AllocatorContext,
    remaining: u32,
    is_head: bool,
) -> Result<Router, TopologyError> {
    let mut router = ctx.router()?;
    if remaining > 1 {
        let next = chain(ctx, remaining - 1, false)?;
        router.add_link(next);
    } else {
        router.add_link(ctx.host()?);
    }
    if is_head {
        router.add_link(ctx.host()?);
    }
    Ok(router)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::types::{Host, NodeId};
    use crate::topology::visitor::{Order, Visitor};

    /// Counts nodes and edges, and how often each node is reached
    #[derive(Default)]
    struct Shape {
        nodes: usize,
        edges: usize,
        routers: usize,
        seen: Vec<NodeId>,
    }

    impl Visitor for Shape {
        fn order(&self) -> Order {
            Order::PreOrder
        }

        fn visit_router(&mut self, router: &Router) {
            self.nodes += 1;
            self.routers += 1;
            self.edges += router.neighbors().len();
            self.seen.push(router.id());
        }

        fn visit_host(&mut self, host: &Host) {
            self.nodes += 1;
            self.seen.push(host.id());
        }
    }

    fn shape(topo: &Topology) -> Shape {
        let mut shape = Shape::default();
        topo.apply_visitor(&mut shape);
        shape
    }

    #[test]
    fn test_tree_well_formed() {
        for topo in [
            create_3_node_topo().unwrap(),
            create_4_node_topo().unwrap(),
            create_multi_layer_topo().unwrap(),
            create_n_hop_topo(5).unwrap(),
        ] {
            let shape = shape(&topo);
            assert_eq!(shape.edges, shape.nodes - 1);

            // Every id in 1..=n is reached exactly once
            let mut seen = shape.seen.clone();
            seen.sort();
            let expected: Vec<NodeId> = (1..=shape.nodes as u32).map(NodeId).collect();
            assert_eq!(seen, expected);
        }
    }

    #[test]
    fn test_n_hop_shape() {
        let topo = create_n_hop_topo(3).unwrap();
        let shape = shape(&topo);
        assert_eq!(shape.routers, 3);
        assert_eq!(shape.nodes, 5);

        // Head router: next router first, then its own host
        let root = topo.root();
        let ids: Vec<NodeId> = root.neighbors().iter().map(|n| n.id()).collect();
        assert_eq!(ids, vec![NodeId(2), NodeId(5)]);

        let single = create_n_hop_topo(1).unwrap();
        assert_eq!(single.root().neighbors().len(), 2);
    }

    #[test]
    fn test_n_hop_requires_hops() {
        assert!(create_n_hop_topo(0).is_err());
        assert!(generate(TopologyType::NHops, None, &AddressPlan::default()).is_err());
        assert!(generate(TopologyType::NHops, Some(2), &AddressPlan::default()).is_ok());
    }

    #[test]
    fn test_deterministic_generation() {
        let plan = AddressPlan::default();
        let a = generate(TopologyType::Large, None, &plan).unwrap();
        let b = generate(TopologyType::Large, None, &plan).unwrap();
        assert_eq!(a.ir_representation(), b.ir_representation());

        // Reusing one context gives the same numbering again
        let mut ctx = AllocatorContext::new(&plan).unwrap();
        let first = build_4_node_topo(&mut ctx).unwrap();
        let second = build_4_node_topo(&mut ctx).unwrap();
        assert_eq!(ctx.allocated(), 4);
        assert_eq!(first.ir_representation(), second.ir_representation());
    }

    #[test]
    fn test_small_address_plan_is_exhausted() {
        let plan = AddressPlan {
            address_space: "10.0.0.0/24".parse().unwrap(),
            prefix_len: 27,
        };
        // 8 subnets for 31 nodes
        assert!(matches!(
            generate(TopologyType::Large, None, &plan),
            Err(TopologyError::Allocation(_))
        ));
    }
}
