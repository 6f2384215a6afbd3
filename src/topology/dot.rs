//! Graphviz export.

use std::fmt::Write as _;
use std::io;
use std::path::Path;

use super::types::{Host, Router};
use super::visitor::{Order, Visitor};

/// Pre-order visitor rendering the topology as an undirected DOT graph.
///
/// Routers are drawn as boxes with one edge per neighbor. With
/// `annotate` set, each router box is labelled with its routing table.
#[derive(Debug)]
pub struct DotVisitor {
    annotate: bool,
    body: String,
}

impl DotVisitor {
    pub fn new(annotate: bool) -> Self {
        Self {
            annotate,
            body: String::new(),
        }
    }

    /// The complete DOT text.
    pub fn representation(&self) -> String {
        format!("graph graphname {{\n{}}}", self.body)
    }

    pub fn store_representation(&self, path: &Path) -> io::Result<()> {
        log::info!("Store DOT representation at {}", path.display());
        std::fs::write(path, self.representation())
    }
}

impl Visitor for DotVisitor {
    fn order(&self) -> Order {
        Order::PreOrder
    }

    fn visit_router(&mut self, router: &Router) {
        // Writing into a String cannot fail
        if self.annotate {
            let mut label = router.name().to_string();
            for (egress, subnet) in router.routing_table() {
                let _ = write!(label, "\\n({}, {})", egress, subnet);
            }
            let _ = writeln!(self.body, "{}[shape=box label=\"{}\"]", router.id(), label);
        } else {
            let _ = writeln!(self.body, "{}[shape=box]", router.id());
        }
        for neighbor in router.neighbors() {
            let _ = writeln!(self.body, "{} -- {}", router.id(), neighbor.id());
        }
    }

    fn visit_host(&mut self, host: &Host) {
        let _ = writeln!(self.body, "{}", host.id());
    }
}
