//! Deployment sinks.
//!
//! The controller replays its mapping as two kinds of instructions. Whatever
//! finally programs the switch (a P4Runtime connector, a file, a test double)
//! implements [`DeploymentSink`].

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::io::Write;

use super::environment::PortId;
use crate::ip::MacAddress;
use crate::topology::NodeId;

/// Receiver of deployment instructions
pub trait DeploymentSink {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Forward packets for `destination` of virtual router `router` out of
    /// `egress_port`, rewriting the destination MAC to `mac`.
    fn insert_route(
        &mut self,
        router: NodeId,
        destination: Ipv4Net,
        mac: MacAddress,
        egress_port: PortId,
    ) -> Result<(), Self::Error>;

    /// Assign packets arriving on `ingress_port` to virtual router `router`.
    fn insert_port_mapping(
        &mut self,
        ingress_port: PortId,
        router: NodeId,
    ) -> Result<(), Self::Error>;
}

/// One deployment instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "table", rename_all = "snake_case")]
pub enum Instruction {
    PortMapping {
        ingress_port: PortId,
        router: NodeId,
    },
    Route {
        router: NodeId,
        destination: Ipv4Net,
        mac: MacAddress,
        egress_port: PortId,
    },
}

/// Sink that keeps every instruction in memory, in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub instructions: Vec<Instruction>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write the recorded instructions as an indented JSON list.
    pub fn write_plan<W: Write>(&self, writer: W) -> serde_json::Result<()> {
        serde_json::to_writer_pretty(writer, &self.instructions)
    }
}

impl DeploymentSink for RecordingSink {
    type Error = Infallible;

    fn insert_route(
        &mut self,
        router: NodeId,
        destination: Ipv4Net,
        mac: MacAddress,
        egress_port: PortId,
    ) -> Result<(), Self::Error> {
        log::debug!(
            "route: router {} {} -> port {} ({})",
            router,
            destination,
            egress_port,
            mac
        );
        self.instructions.push(Instruction::Route {
            router,
            destination,
            mac,
            egress_port,
        });
        Ok(())
    }

    fn insert_port_mapping(
        &mut self,
        ingress_port: PortId,
        router: NodeId,
    ) -> Result<(), Self::Error> {
        log::debug!("port mapping: port {} -> router {}", ingress_port, router);
        self.instructions.push(Instruction::PortMapping {
            ingress_port,
            router,
        });
        Ok(())
    }
}
