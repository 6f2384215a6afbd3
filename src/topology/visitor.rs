//! Tree traversal.
//!
//! Every analysis of a topology is a visitor. The visitor decides what happens
//! at a node, [`walk`] and [`walk_mut`] decide the order in which nodes are
//! reached: depth-first from the root, neighbors in stored order, with routers
//! visited either before ([`Order::PreOrder`]) or after ([`Order::PostOrder`])
//! their neighbors. Hosts are leaves and are visited exactly once.

use super::types::{Host, Node, Router};

/// When a router is visited relative to its neighbors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    PreOrder,
    PostOrder,
}

/// Read-only visitor.
pub trait Visitor {
    fn order(&self) -> Order;
    fn visit_router(&mut self, router: &Router);
    fn visit_host(&mut self, host: &Host);
}

/// Visitor that may modify the nodes it visits.
pub trait VisitorMut {
    fn order(&self) -> Order;
    fn visit_router(&mut self, router: &mut Router);
    fn visit_host(&mut self, host: &mut Host);
}

/// Walk the subtree rooted at `node`.
pub fn walk<V: Visitor + ?Sized>(node: &Node, visitor: &mut V) {
    match node {
        Node::Router(router) => walk_router(router, visitor),
        Node::Host(host) => visitor.visit_host(host),
    }
}

/// Walk the subtree rooted at `router`.
pub fn walk_router<V: Visitor + ?Sized>(router: &Router, visitor: &mut V) {
    let order = visitor.order();
    if order == Order::PreOrder {
        visitor.visit_router(router);
    }
    for neighbor in &router.neighbors {
        walk(neighbor, visitor);
    }
    if order == Order::PostOrder {
        visitor.visit_router(router);
    }
}

/// Walk the subtree rooted at `node`, allowing modifications.
pub fn walk_mut<V: VisitorMut + ?Sized>(node: &mut Node, visitor: &mut V) {
    match node {
        Node::Router(router) => walk_router_mut(router, visitor),
        Node::Host(host) => visitor.visit_host(host),
    }
}

/// Walk the subtree rooted at `router`, allowing modifications.
pub fn walk_router_mut<V: VisitorMut + ?Sized>(router: &mut Router, visitor: &mut V) {
    let order = visitor.order();
    if order == Order::PreOrder {
        visitor.visit_router(router);
    }
    for neighbor in router.neighbors.iter_mut() {
        walk_mut(neighbor, visitor);
    }
    if order == Order::PostOrder {
        visitor.visit_router(router);
    }
}
