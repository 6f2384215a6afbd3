//! Mapping of a logical topology onto physical switch ports.
//!
//! Routers are processed in IR order (ascending id), neighbors in stored
//! order. Every router-to-router edge consumes one link loop of the
//! environment, every router-to-host edge consumes one host link. Routing
//! entries are translated from egress indices to the physical ports of the
//! matching edge.
//!
//! The catch-all route of a router points at the first port it was assigned.
//! For a non-root router that port comes from the link towards its parent, as
//! long as the parent was processed first; this is checked. The root has no
//! parent and follows [`RootDefaultRoute`].

use ipnet::Ipv4Net;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

use super::environment::{Environment, PortId};
use super::sink::DeploymentSink;
use crate::config::RootDefaultRoute;
use crate::ip::{MacAddress, ROUTER_NEXT_HOP_MAC};
use crate::topology::{HostRecord, Ir, IrError, NodeId, NodeKind, RouterRecord};

/// Errors raised while mapping or deploying a topology
#[derive(Debug, Error)]
pub enum MappingError {
    #[error(transparent)]
    Ir(#[from] IrError),
    #[error("No physical link left for the edge between router {router} and router {neighbor}")]
    LinkPoolExhausted { router: NodeId, neighbor: NodeId },
    #[error("No host link left for the edge between router {router} and host {host}")]
    HostLinkPoolExhausted { router: NodeId, host: NodeId },
    #[error("Router {router} has no uplink port: its parent must be mapped before it")]
    UplinkNotAssigned { router: NodeId },
    #[error("Deployment sink failed for router {router}: {source}")]
    Sink {
        router: NodeId,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Cannot store host configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot serialize host configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// One forwarding entry bound to a physical port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RouteEntry {
    pub subnet: Ipv4Net,
    pub port: PortId,
    pub mac: MacAddress,
}

/// Options of one mapping pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingOptions {
    /// Destination of every catch-all route
    pub address_space: Ipv4Net,
    pub root_default_route: RootDefaultRoute,
}

/// Deployment plan of a topology on one environment.
///
/// The mapping is computed once, in [`TopologyController::new`], and consumes
/// the environment it was given.
#[derive(Debug, Clone)]
pub struct TopologyController {
    root: NodeId,
    port_mapping: BTreeMap<NodeId, Vec<PortId>>,
    route_mapping: BTreeMap<NodeId, Vec<RouteEntry>>,
    host_env: BTreeMap<String, HostRecord>,
}

impl TopologyController {
    /// Map `ir` onto the links of `env`.
    pub fn new(
        ir: &Ir,
        mut env: Environment,
        options: MappingOptions,
    ) -> Result<Self, MappingError> {
        log::debug!(
            "New TopologyController with {} routers, {} hosts, {} links, {} host links",
            ir.routers.len(),
            ir.hosts.len(),
            env.links.len(),
            env.host_links.len()
        );
        let root = ir.validate()?;

        let mut controller = Self {
            root,
            port_mapping: ir.routers.keys().map(|id| (*id, Vec::new())).collect(),
            route_mapping: ir.routers.keys().map(|id| (*id, Vec::new())).collect(),
            host_env: BTreeMap::new(),
        };

        for (router_id, router) in &ir.routers {
            if *router_id != root && controller.ports(*router_id).is_empty() {
                return Err(MappingError::UplinkNotAssigned { router: *router_id });
            }

            for (egress, neighbor, kind) in &router.neighbors {
                match kind {
                    NodeKind::Router => {
                        let (local_port, remote_port) =
                            env.pop_link().ok_or(MappingError::LinkPoolExhausted {
                                router: *router_id,
                                neighbor: *neighbor,
                            })?;
                        controller.assign_port(*router_id, local_port);
                        controller.assign_port(*neighbor, remote_port);
                        controller.add_routes(
                            *router_id,
                            router,
                            *egress,
                            local_port,
                            ROUTER_NEXT_HOP_MAC,
                        );
                    }
                    NodeKind::Host => {
                        let (hostname, switch_port) =
                            env.pop_host_link().ok_or(MappingError::HostLinkPoolExhausted {
                                router: *router_id,
                                host: *neighbor,
                            })?;
                        // `validate` guarantees the host exists
                        let host = ir.hosts.get(neighbor).ok_or(IrError::UnknownNode {
                            router: *router_id,
                            node: *neighbor,
                            kind: NodeKind::Host,
                        })?;
                        log::debug!(
                            "{} is deployed as {} on port {}",
                            host.name,
                            hostname,
                            switch_port
                        );

                        controller.assign_port(*router_id, switch_port);
                        controller.add_routes(*router_id, router, *egress, switch_port, host.mac);
                        let previous = controller.host_env.insert(hostname.clone(), host.clone());
                        if let Some(previous) = previous {
                            log::warn!(
                                "Host link {} is used by both {} and {}",
                                hostname,
                                previous.name,
                                host.name
                            );
                        }
                    }
                }
            }

            controller.add_default_route(*router_id, &options);
        }

        log::info!(
            "Mapped {} routers onto {} ports with {} routes, \
             {} links and {} host links left unused",
            controller.port_mapping.len(),
            controller.port_mapping.values().map(Vec::len).sum::<usize>(),
            controller.route_mapping.values().map(Vec::len).sum::<usize>(),
            env.links.len(),
            env.host_links.len()
        );
        Ok(controller)
    }

    fn ports(&self, router: NodeId) -> &[PortId] {
        self.port_mapping.get(&router).map(Vec::as_slice).unwrap_or(&[])
    }

    fn assign_port(&mut self, router: NodeId, port: PortId) {
        self.port_mapping.entry(router).or_default().push(port);
    }

    /// Bind every routing entry of `egress` to `port`.
    fn add_routes(
        &mut self,
        router_id: NodeId,
        router: &RouterRecord,
        egress: u32,
        port: PortId,
        mac: MacAddress,
    ) {
        let routes = self.route_mapping.entry(router_id).or_default();
        routes.extend(
            router
                .routing_table
                .iter()
                .filter(|(e, _)| *e == egress)
                .map(|(_, subnet)| RouteEntry {
                    subnet: *subnet,
                    port,
                    mac,
                }),
        );
    }

    /// Append the catch-all route towards the parent.
    fn add_default_route(&mut self, router: NodeId, options: &MappingOptions) {
        if router == self.root && options.root_default_route == RootDefaultRoute::Omit {
            log::debug!("Root router {} gets no catch-all route", router);
            return;
        }
        let Some(&uplink) = self.ports(router).first() else {
            // Only possible for a root without any neighbor
            log::warn!("Router {} has no ports, skipping its catch-all route", router);
            return;
        };
        self.route_mapping.entry(router).or_default().push(RouteEntry {
            subnet: options.address_space,
            port: uplink,
            mac: ROUTER_NEXT_HOP_MAC,
        });
    }

    /// Physical ports assigned to each router, in assignment order
    pub fn port_mapping(&self) -> &BTreeMap<NodeId, Vec<PortId>> {
        &self.port_mapping
    }

    /// Forwarding entries of each router; the catch-all route comes last
    pub fn route_mapping(&self) -> &BTreeMap<NodeId, Vec<RouteEntry>> {
        &self.route_mapping
    }

    /// Host records by the hostname of the host link they were deployed on
    pub fn host_environment(&self) -> &BTreeMap<String, HostRecord> {
        &self.host_env
    }

    /// Replay the mapping against `sink`: for every router its port mappings,
    /// then its routes. The first failing instruction aborts the replay.
    pub fn deploy<S: DeploymentSink>(&self, sink: &mut S) -> Result<(), MappingError> {
        log::debug!("Port mapping: {:?}", self.port_mapping);
        log::debug!("Route mapping: {:?}", self.route_mapping);

        for (router, ports) in &self.port_mapping {
            let sink_err = |e: S::Error| MappingError::Sink {
                router: *router,
                source: Box::new(e),
            };

            for port in ports {
                sink.insert_port_mapping(*port, *router).map_err(sink_err)?;
            }
            for route in self.route_mapping.get(router).into_iter().flatten() {
                sink.insert_route(*router, route.subnet, route.mac, route.port)
                    .map_err(sink_err)?;
            }
        }
        Ok(())
    }

    /// Host configuration as a JSON document
    pub fn host_config_json(&self) -> Result<String, MappingError> {
        Ok(serde_json::to_string(&self.host_env)?)
    }

    /// Store the host configuration as indented JSON
    pub fn store_host_config(&self, path: &Path) -> Result<(), MappingError> {
        log::info!("Store host-config to json file at {}", path.display());
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, &self.host_env)?;
        Ok(())
    }
}
