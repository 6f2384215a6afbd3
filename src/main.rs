use clap::{Parser, Subcommand};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use virntup::config::{resolve, Config, Target, ValidationError};
use virntup::config_loader;
use virntup::controller::{Environment, MappingOptions, RecordingSink, TopologyController};
use virntup::topology::{generate, DotVisitor, Ir, TopologyType};

/// Virtual network topologies on a single programmable switch
#[derive(Parser, Debug)]
#[command(name = "virntup", author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Path to the configuration file (YAML or JSON)
    #[arg(short = 'c', long = "conf", global = true)]
    conf: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a topology and store its intermediate representation
    Topogen {
        /// Kind of topology to generate
        #[arg(short = 't', long = "type", value_enum)]
        topology_type: TopologyType,

        /// Number of routers for the n-hops topology
        #[arg(long)]
        hops: Option<u32>,

        /// Output path of the intermediate representation
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output path of the DOT rendering
        #[arg(short, long)]
        dot: Option<PathBuf>,

        /// Leave routing tables out of the DOT rendering
        #[arg(long, requires = "dot")]
        plain_dot: bool,
    },

    /// Map a topology onto the environment and store the host configuration
    Envgen {
        #[command(flatten)]
        inputs: MappingInputs,

        /// Output path of the host configuration
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Map a topology onto the environment and write the deployment plan
    Deploy {
        #[command(flatten)]
        inputs: MappingInputs,

        /// Output path of the deployment plan
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Inputs shared by every command that maps an IR onto an environment
#[derive(clap::Args, Debug)]
struct MappingInputs {
    /// Path to the environment description
    #[arg(short, long)]
    env: Option<PathBuf>,

    /// Path to the intermediate representation
    #[arg(short, long)]
    ir: Option<PathBuf>,

    /// Deployment target
    #[arg(short, long, value_enum)]
    target: Option<Target>,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let default_filter = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    let config = config_loader::load_optional_config(cli.conf.as_deref())?;

    match cli.command {
        Commands::Topogen {
            topology_type,
            hops,
            output,
            dot,
            plain_dot,
        } => {
            let ir_path = resolve("ir", output, config.ir.as_ref())?;
            run_topogen(&config, topology_type, hops, &ir_path, dot.as_deref(), !plain_dot)
        }
        Commands::Envgen { inputs, output } => {
            let host_path = resolve("host", output, config.host.as_ref())?;
            let controller = map_topology(&config, inputs)?;
            controller.store_host_config(&host_path).wrap_err_with(|| {
                format!("Failed to store host configuration '{}'", host_path.display())
            })?;
            info!("Host configuration written to {:?}", host_path);
            Ok(())
        }
        Commands::Deploy { inputs, output } => {
            let plan_path = resolve("plan", output, config.plan.as_ref())?;
            let controller = map_topology(&config, inputs)?;
            run_deploy(&controller, &plan_path)
        }
    }
}

/// Generate a topology, synthesize its routes and store the IR (and DOT).
fn run_topogen(
    config: &Config,
    topology_type: TopologyType,
    hops: Option<u32>,
    ir_path: &Path,
    dot_path: Option<&Path>,
    annotate: bool,
) -> Result<()> {
    let mut topo = generate(topology_type, hops, &config.address_plan)?;
    topo.update_all_routing_tables()?;

    let ir = topo.ir_representation();
    let file = File::create(ir_path)
        .wrap_err_with(|| format!("Failed to create IR file '{}'", ir_path.display()))?;
    ir.to_writer_pretty(BufWriter::new(file))
        .wrap_err_with(|| format!("Failed to write IR file '{}'", ir_path.display()))?;
    info!(
        "Stored IR with {} nodes ({} routers) at {:?}",
        ir.node_count(),
        ir.routers.len(),
        ir_path
    );

    if let Some(dot_path) = dot_path {
        let mut dot = DotVisitor::new(annotate);
        topo.apply_visitor(&mut dot);
        dot.store_representation(dot_path)
            .wrap_err_with(|| format!("Failed to write DOT file '{}'", dot_path.display()))?;
        info!("Stored DOT rendering at {:?}", dot_path);
    }

    Ok(())
}

/// Resolve the mapping inputs and compute the physical mapping.
fn map_topology(config: &Config, inputs: MappingInputs) -> Result<TopologyController> {
    let target = resolve("target", inputs.target, config.target.as_ref())?;
    if target == Target::Tofino {
        return Err(ValidationError::UnsupportedTarget(target).into());
    }
    let env_path = resolve("env", inputs.env, config.env.as_ref())?;
    let ir_path = resolve("ir", inputs.ir, config.ir.as_ref())?;

    let env = Environment::load(&env_path)?;
    let file = File::open(&ir_path)
        .wrap_err_with(|| format!("Failed to open IR file '{}'", ir_path.display()))?;
    let ir = Ir::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse IR file '{}'", ir_path.display()))?;

    let options = MappingOptions {
        address_space: config.address_plan.address_space,
        root_default_route: config.mapping.root_default_route,
    };
    let controller = TopologyController::new(&ir, env, options).wrap_err_with(|| {
        format!("Failed to map '{}' onto '{}'", ir_path.display(), env_path.display())
    })?;
    Ok(controller)
}

/// Replay the mapping into a plan and store it as JSON.
fn run_deploy(controller: &TopologyController, plan_path: &Path) -> Result<()> {
    let mut sink = RecordingSink::new();
    controller.deploy(&mut sink)?;

    let file = File::create(plan_path)
        .wrap_err_with(|| format!("Failed to create plan file '{}'", plan_path.display()))?;
    sink.write_plan(BufWriter::new(file))
        .wrap_err_with(|| format!("Failed to write plan file '{}'", plan_path.display()))?;
    info!(
        "Stored {} deployment instructions at {:?}",
        sink.instructions.len(),
        plan_path
    );
    Ok(())
}
