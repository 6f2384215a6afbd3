//! # Virntup - Virtual network topologies on a single programmable switch
//!
//! This library builds logical router/host topologies, computes their routing
//! tables and maps them onto the physical ports of one switch that emulates
//! every virtual router.
//!
//! ## Overview
//!
//! A topology is a tree: every virtual router owns its neighbors, hosts are
//! leaves. Each node receives its own uplink subnet from an address plan.
//! Routing tables are synthesized bottom-up, so a router knows every subnet
//! below it and sends everything else towards its parent.
//!
//! The topology is exported as an intermediate representation (IR), a JSON
//! document that the controller later maps onto an environment: a list of
//! pre-wired port loops for router-to-router edges and named host links.
//!
//! ## Architecture
//!
//! - `config`: Configuration file structures and validation
//! - `config_loader`: Configuration file loading
//! - `ip`: Subnet allocation and MAC addresses
//! - `topology`: Topology model, visitors, routing synthesis, IR and DOT export
//! - `controller`: Environment loading, physical port mapping and deployment
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use virntup::config::RootDefaultRoute;
//! use virntup::controller::{Environment, MappingOptions, RecordingSink, TopologyController};
//! use virntup::topology::generator::create_4_node_topo;
//!
//! let mut topo = create_4_node_topo()?;
//! topo.update_all_routing_tables()?;
//! let ir = topo.ir_representation();
//!
//! let env = Environment::load("env.json".as_ref())?;
//! let controller = TopologyController::new(
//!     &ir,
//!     env,
//!     MappingOptions {
//!         address_space: "10.0.0.0/16".parse()?,
//!         root_default_route: RootDefaultRoute::Omit,
//!     },
//! )?;
//!
//! let mut sink = RecordingSink::new();
//! controller.deploy(&mut sink)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Error Handling
//!
//! Every module reports failures through its own `thiserror` enum. The binary
//! wraps them with `color_eyre` to add context.

pub mod config;
pub mod config_loader;
pub mod controller;
pub mod ip;
pub mod topology;
