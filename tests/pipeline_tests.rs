//! End-to-end tests: generate a topology, export the IR, map it onto an
//! environment and replay the deployment plan.

use pretty_assertions::assert_eq;
use std::fs::File;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

use virntup::config::{AddressPlan, RootDefaultRoute};
use virntup::controller::{
    Environment, Instruction, MappingError, MappingOptions, PortId, RecordingSink,
    TopologyController,
};
use virntup::ip::ROUTER_NEXT_HOP_MAC;
use virntup::topology::{generate, Ir, NodeId, Topology, TopologyType};

fn synthesized(topology_type: TopologyType, hops: Option<u32>, plan: &AddressPlan) -> Topology {
    let mut topo = generate(topology_type, hops, plan).unwrap();
    topo.update_all_routing_tables().unwrap();
    topo
}

fn options(plan: &AddressPlan) -> MappingOptions {
    MappingOptions {
        address_space: plan.address_space,
        root_default_route: RootDefaultRoute::Omit,
    }
}

/// An environment with exactly enough links for `ir`
fn environment_for(ir: &Ir) -> Environment {
    let router_edges = ir.routers.len() as PortId - 1;
    let json = serde_json::json!({
        "links": (0..router_edges).map(|i| [100 + 2 * i, 101 + 2 * i]).collect::<Vec<_>>(),
        "host_links": (0..ir.hosts.len())
            .map(|i| (format!("h{}", i + 1), i as PortId + 1))
            .collect::<Vec<_>>(),
    });
    Environment::from_reader(json.to_string().as_bytes()).unwrap()
}

#[test]
fn test_ir_file_round_trip() {
    let plan = AddressPlan::default();
    let topo = synthesized(TopologyType::Large, None, &plan);
    let ir = topo.ir_representation();

    let mut file = NamedTempFile::new().unwrap();
    ir.to_writer_pretty(&mut file).unwrap();
    file.flush().unwrap();
    let reloaded = Ir::from_reader(File::open(file.path()).unwrap()).unwrap();
    assert_eq!(reloaded, ir);

    // Exporting twice gives the same document
    let first = serde_json::to_string_pretty(&topo.ir_representation()).unwrap();
    let second = serde_json::to_string_pretty(&topo.ir_representation()).unwrap();
    assert_eq!(first, second);

    // Mapping does not depend on whether the IR went through a file
    let direct = TopologyController::new(&ir, environment_for(&ir), options(&plan)).unwrap();
    let from_file =
        TopologyController::new(&reloaded, environment_for(&reloaded), options(&plan)).unwrap();
    assert_eq!(direct.port_mapping(), from_file.port_mapping());
    assert_eq!(direct.route_mapping(), from_file.route_mapping());
    assert_eq!(direct.host_environment(), from_file.host_environment());
}

#[test]
fn test_n_hop_pipeline() {
    let plan = AddressPlan {
        address_space: "192.168.0.0/16".parse().unwrap(),
        prefix_len: 26,
    };
    let topo = synthesized(TopologyType::NHops, Some(2), &plan);
    let ir = topo.ir_representation();
    assert_eq!(ir.routers.len(), 2);
    assert_eq!(ir.hosts.len(), 2);

    // Tail host is built right after the last router of the chain
    let tail = &ir.hosts[&NodeId(3)];
    assert_eq!(tail.ip, "192.168.0.129/26".parse().unwrap());
    assert_eq!(tail.mac.to_string(), "08:00:c0:a8:00:81");

    let controller = TopologyController::new(&ir, environment_for(&ir), options(&plan)).unwrap();

    // Router 2 sends everything it does not know back through its uplink
    let r2_routes = &controller.route_mapping()[&NodeId(2)];
    let catch_all = r2_routes.last().unwrap();
    assert_eq!(catch_all.subnet, plan.address_space);
    assert_eq!(catch_all.mac, ROUTER_NEXT_HOP_MAC);
    assert_eq!(catch_all.port, controller.port_mapping()[&NodeId(2)][0]);

    let host_config: serde_json::Value =
        serde_json::from_str(&controller.host_config_json().unwrap()).unwrap();
    // The head router links the chain before its own host
    assert_eq!(host_config["h1"]["name"], "Host-4");
    assert_eq!(host_config["h1"]["ip"], "192.168.0.193/26");
    assert_eq!(host_config["h2"]["name"], "Host-3");
}

#[test]
fn test_deployment_plan() {
    let plan = AddressPlan::default();
    let topo = synthesized(TopologyType::Medium, None, &plan);
    let ir = topo.ir_representation();
    let controller = TopologyController::new(&ir, environment_for(&ir), options(&plan)).unwrap();

    let mut sink = RecordingSink::new();
    controller.deploy(&mut sink).unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plan.json");
    sink.write_plan(File::create(&path).unwrap()).unwrap();
    let plan_doc: Vec<Instruction> = serde_json::from_reader(File::open(&path).unwrap()).unwrap();
    assert_eq!(plan_doc, sink.instructions);

    // Every port a router owns is mapped to that router exactly once
    let mapped: Vec<(PortId, NodeId)> = plan_doc
        .iter()
        .filter_map(|i| match i {
            Instruction::PortMapping { ingress_port, router } => Some((*ingress_port, *router)),
            _ => None,
        })
        .collect();
    assert_eq!(
        mapped,
        vec![(100, NodeId(1)), (1, NodeId(1)), (101, NodeId(2)), (2, NodeId(2))]
    );
}

#[test]
fn test_host_config_file() {
    let plan = AddressPlan::default();
    let topo = synthesized(TopologyType::Minimal, None, &plan);
    let ir = topo.ir_representation();
    let controller = TopologyController::new(&ir, environment_for(&ir), options(&plan)).unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("host.json");
    controller.store_host_config(&path).unwrap();

    let stored: serde_json::Value = serde_json::from_reader(File::open(&path).unwrap()).unwrap();
    assert_eq!(
        stored,
        serde_json::json!({
            "h1": {"name": "Host-2", "ip": "10.0.1.1/24", "mac": "08:00:0a:00:01:01"},
            "h2": {"name": "Host-3", "ip": "10.0.2.1/24", "mac": "08:00:0a:00:02:01"}
        })
    );

    // The target directory must exist
    assert!(matches!(
        controller.store_host_config(&dir.path().join("missing").join("host.json")),
        Err(MappingError::Io(_))
    ));
}

#[test]
fn test_environment_too_small() {
    let plan = AddressPlan::default();
    let topo = synthesized(TopologyType::Large, None, &plan);
    let ir = topo.ir_representation();

    let mut env = environment_for(&ir);
    env.links.pop_back();
    assert!(matches!(
        TopologyController::new(&ir, env, options(&plan)),
        Err(MappingError::LinkPoolExhausted { .. })
    ));
}
