use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use photonswitch::layouts::{cascade, rectangular_mesh};
use photonswitch::{
    Connection, ConnectionPolicy, PortPath, Registry, Role, SimulationConfig, SimulationEngine,
    SwitchState,
};

#[derive(Parser)]
#[command(name = "fabric")]
#[command(about = "Enumerate the routings of a 2x2 photonic switch fabric", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search every switch-state combination and print the distinct routings
    #[command(alias = "r")]
    Run(RunArgs),

    /// Trace one input port under an explicit state vector
    #[command(alias = "t")]
    Trace(TraceArgs),

    /// Print the connection list of a generated layout as JSON
    Layout(FabricArgs),
}

#[derive(Copy, Clone, ValueEnum)]
enum Layout {
    Cascade,
    Mesh,
}

#[derive(Args)]
struct FabricArgs {
    /// Topology file (JSON). Without one, the default fabric is used
    #[arg(short, long, value_name = "FILE")]
    topology: Option<PathBuf>,

    /// Generate the connections instead of reading them from the topology file
    #[arg(short, long, value_enum)]
    layout: Option<Layout>,

    /// Simulation settings file (JSON)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Skip connections naming unknown nodes or ports instead of failing
    #[arg(long)]
    lenient: bool,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    fabric: FabricArgs,

    /// Evaluate trials in parallel
    #[arg(long)]
    parallel: bool,

    /// Override the switch-count ceiling
    #[arg(long, value_name = "N")]
    max_switches: Option<usize>,

    /// Print the structured report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct TraceArgs {
    #[command(flatten)]
    fabric: FabricArgs,

    /// Switch states in registry order, one character each (0/b = bar, 1/c = cross)
    #[arg(short, long, default_value = "")]
    states: String,

    /// Port to trace from, as NODE.PORT
    #[arg(short, long)]
    from: String,
}

/// Node lists and connections of a fabric.
///
/// When all three node lists are empty the default fabric's nodes are
/// used; otherwise only the declared nodes exist.
#[derive(Deserialize, Default)]
#[serde(default)]
struct TopologyFile {
    switches: Vec<String>,
    inputs: Vec<String>,
    outputs: Vec<String>,
    connections: Vec<Connection>,
}

fn load_topology(path: &Path) -> Result<TopologyFile> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read topology file {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse topology file {}", path.display()))
}

fn build_engine(args: &FabricArgs) -> Result<(SimulationEngine, Vec<Connection>)> {
    let file = match &args.topology {
        Some(path) => load_topology(path)?,
        None => TopologyFile::default(),
    };

    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    if args.lenient {
        config.unknown_connections = ConnectionPolicy::Ignore;
    }

    let declared = !(file.switches.is_empty() && file.inputs.is_empty() && file.outputs.is_empty());
    let mut engine = if declared {
        SimulationEngine::new(Registry::new(), config)
    } else {
        SimulationEngine::new(Registry::with_defaults(), config)
    };
    for (names, role) in [
        (&file.switches, Role::Switch),
        (&file.inputs, Role::Input),
        (&file.outputs, Role::Output),
    ] {
        for name in names {
            if !engine.add_node(name, role) {
                bail!("Node name '{name}' is declared twice");
            }
        }
    }

    let connections = match args.layout {
        Some(Layout::Cascade) => cascade(engine.registry()),
        Some(Layout::Mesh) => rectangular_mesh(engine.registry()),
        None => file.connections,
    };
    Ok((engine, connections))
}

fn parse_states(s: &str) -> Result<Vec<SwitchState>> {
    s.chars()
        .map(|c| match c.to_ascii_lowercase() {
            '0' | 'b' => Ok(SwitchState::Bar),
            '1' | 'c' => Ok(SwitchState::Cross),
            other => bail!("Invalid switch state '{other}' (expected 0, 1, b or c)"),
        })
        .collect()
}

fn parse_port(s: &str) -> Result<PortPath> {
    match s.rsplit_once('.') {
        Some((node, port)) if !node.is_empty() && !port.is_empty() => Ok(PortPath::new(node, port)),
        _ => bail!("Invalid port '{s}' (expected NODE.PORT)"),
    }
}

fn run(args: RunArgs) -> Result<()> {
    let (mut engine, connections) = build_engine(&args.fabric)?;
    if args.parallel {
        engine.config_mut().parallel = true;
    }
    if let Some(limit) = args.max_switches {
        engine.config_mut().max_switches = limit;
    }

    let report = engine.search(&connections)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.render());
    }
    Ok(())
}

fn trace(args: TraceArgs) -> Result<()> {
    let (engine, connections) = build_engine(&args.fabric)?;
    let states = parse_states(&args.states)?;
    let start = parse_port(&args.from)?;

    let trace = engine.trace(&connections, &states, &start)?;
    for hop in &trace.hops {
        println!("{hop}");
    }
    println!("{} -> {}", trace.start, trace.outcome);
    Ok(())
}

fn layout(args: FabricArgs) -> Result<()> {
    let (_, connections) = build_engine(&args)?;
    println!("{}", serde_json::to_string_pretty(&connections)?);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run(args),
        Commands::Trace(args) => trace(args),
        Commands::Layout(args) => layout(args),
    }
}
