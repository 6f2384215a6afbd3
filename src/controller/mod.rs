//! Physical mapping of a logical topology.
//!
//! The controller reads an IR document and an environment description,
//! assigns switch ports to every edge of the topology and replays the result
//! into a [`DeploymentSink`].

pub mod environment;
pub mod mapper;
pub mod sink;

pub use environment::{Environment, EnvironmentError, PortId};
pub use mapper::{MappingError, MappingOptions, RouteEntry, TopologyController};
pub use sink::{DeploymentSink, Instruction, RecordingSink};
