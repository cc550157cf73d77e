//! Switch Fabric Search Benchmark Suite

use photonswitch::layouts::{cascade, rectangular_mesh};
use photonswitch::search::search;
use photonswitch::{Connection, ConnectionPolicy, PortPath, Registry, Role, SimulationConfig, WiringPlan};

use rand::seq::SliceRandom;
use std::time::Instant;

fn banner(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("BENCHMARK: {title}");
    println!("{}", "=".repeat(60));
}

fn registry_with(n_switches: usize, n_inputs: usize, n_outputs: usize) -> Registry {
    let mut registry = Registry::new();
    for i in 1..=n_inputs {
        registry.register(&format!("IN{i}"), Role::Input);
    }
    for i in 1..=n_outputs {
        registry.register(&format!("OUT{i}"), Role::Output);
    }
    for i in 1..=n_switches {
        registry.register(&format!("X{i}"), Role::Switch);
    }
    registry
}

/// Pair up every port of the registry at random.
fn random_connections(registry: &Registry) -> Vec<Connection> {
    let mut ports: Vec<PortPath> = [Role::Input, Role::Output, Role::Switch]
        .into_iter()
        .flat_map(|role| {
            registry.names(role).iter().flat_map(move |n| {
                role.port_labels()
                    .iter()
                    .map(move |p| PortPath::new(n.as_str(), *p))
            })
        })
        .collect();
    ports.shuffle(&mut rand::thread_rng());

    ports
        .chunks_exact(2)
        .map(|pair| Connection {
            a: pair[0].clone(),
            b: pair[1].clone(),
        })
        .collect()
}

fn time_search(plan: &WiringPlan, config: &SimulationConfig, n_iters: usize) -> (f64, usize) {
    let mut configurations = 0;
    let start = Instant::now();
    for _ in 0..n_iters {
        match search(plan, config) {
            Ok(report) => configurations = report.configurations.len(),
            Err(e) => {
                eprintln!("  search failed: {e}");
                return (f64::NAN, 0);
            }
        }
    }
    (start.elapsed().as_secs_f64() / n_iters as f64, configurations)
}

fn plan(registry: &Registry, conns: &[Connection]) -> Option<WiringPlan> {
    match WiringPlan::new(registry, conns, ConnectionPolicy::Reject) {
        Ok(plan) => Some(plan),
        Err(e) => {
            eprintln!("  invalid wiring: {e}");
            None
        }
    }
}

fn benchmark_cascade() {
    banner("Cascade Chain");

    let sizes = [2, 4, 8, 12, 16];
    let config = SimulationConfig::default();

    for &n in &sizes {
        let registry = registry_with(n, 1, 1);
        let Some(plan) = plan(&registry, &cascade(&registry)) else {
            continue;
        };

        let n_iters = if n <= 8 { 100 } else { 3 };
        let (elapsed, configs) = time_search(&plan, &config, n_iters);
        let trials = 1usize << n;

        println!(
            "  {:>2} switches: {:>9.3} ms ({} trials, {:.2} Mtrials/s, {} configurations)",
            n,
            elapsed * 1000.0,
            trials,
            trials as f64 / elapsed / 1e6,
            configs
        );
    }
}

fn benchmark_mesh() {
    banner("Rectangular Mesh (default fabric)");

    let registry = Registry::with_defaults();
    let Some(plan) = plan(&registry, &rectangular_mesh(&registry)) else {
        return;
    };
    let (elapsed, configs) = time_search(&plan, &SimulationConfig::default(), 1000);

    println!(
        "  {} switches: {:.1} μs per search, {} configurations",
        registry.switches().len(),
        elapsed * 1e6,
        configs
    );
}

fn benchmark_parallel() {
    banner("Sequential vs Parallel Trials");

    let sizes = [10, 14, 18];

    for &n in &sizes {
        let registry = registry_with(n, 1, 1);
        let Some(plan) = plan(&registry, &cascade(&registry)) else {
            continue;
        };

        let sequential = SimulationConfig::default();
        let parallel = SimulationConfig {
            parallel: true,
            ..SimulationConfig::default()
        };

        let (t_seq, _) = time_search(&plan, &sequential, 1);
        let (t_par, _) = time_search(&plan, &parallel, 1);

        println!(
            "  {:>2} switches: {:.1} ms (sequential), {:.1} ms (parallel), speedup {:.2}x",
            n,
            t_seq * 1000.0,
            t_par * 1000.0,
            t_seq / t_par
        );
    }
}

fn benchmark_random_fabrics() {
    banner("Random Fabrics");

    let sizes = [4, 8, 12];
    let n_fabrics = 20;
    let config = SimulationConfig::default();

    for &n in &sizes {
        let registry = registry_with(n, 2, 2);
        let mut total = 0.0;
        let mut routable = 0;

        for _ in 0..n_fabrics {
            let Some(plan) = plan(&registry, &random_connections(&registry)) else {
                continue;
            };
            let (elapsed, configs) = time_search(&plan, &config, 1);
            total += elapsed;
            if configs > 0 {
                routable += 1;
            }
        }

        println!(
            "  {:>2} switches: {:.3} ms avg, {}/{} fabrics routable",
            n,
            total / n_fabrics as f64 * 1000.0,
            routable,
            n_fabrics
        );
    }
}

fn main() {
    env_logger::init();

    println!("\n{}", "#".repeat(60));
    println!("#  Photonic Switch Fabric Benchmark Suite");
    println!("{}", "#".repeat(60));

    benchmark_cascade();
    benchmark_mesh();
    benchmark_parallel();
    benchmark_random_fabrics();

    println!("\n{}", "=".repeat(60));
    println!("BENCHMARK COMPLETE");
    println!("{}", "=".repeat(60));
}
