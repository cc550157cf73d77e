//! Simulation Engine
//!
//! Session-level entry point: owns the node registry, the user's connection
//! list and the run settings. Each run snapshots the registry, so nodes
//! registered later only take part in later runs.

use log::{info, warn};

use crate::config::SimulationConfig;
use crate::error::{FabricError, Result};
use crate::registry::Registry;
use crate::search::{evaluate_trial, search, SearchReport, TrialOutcome};
use crate::topology::{PortPath, Role, SwitchState};
use crate::tracer::{trace_path, Trace};
use crate::wiring::{Connection, WiringPlan};

#[derive(Clone, Debug, Default)]
pub struct SimulationEngine {
    registry: Registry,
    config: SimulationConfig,
    connections: Vec<Connection>,
}

impl SimulationEngine {
    pub fn new(registry: Registry, config: SimulationConfig) -> Self {
        Self {
            registry,
            config,
            connections: Vec::new(),
        }
    }

    /// Engine seeded with the default six-switch fabric.
    pub fn with_defaults() -> Self {
        Self::new(Registry::with_defaults(), SimulationConfig::default())
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SimulationConfig {
        &mut self.config
    }

    /// Register a new node. Returns false if the name is already taken.
    pub fn add_node(&mut self, name: &str, role: Role) -> bool {
        let added = self.registry.register(name, role);
        if added {
            info!("Added {role} node {name}");
        } else {
            warn!("Node name '{name}' already exists");
        }
        added
    }

    /// Append a connection to the session list.
    ///
    /// A port joined to itself is declined.
    pub fn connect(&mut self, connection: Connection) -> bool {
        if connection.a == connection.b {
            return false;
        }
        self.connections.push(connection);
        true
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn clear_connections(&mut self) {
        self.connections.clear();
        info!("Connections cleared");
    }

    fn plan(&self, connections: &[Connection]) -> Result<WiringPlan> {
        if connections.is_empty() {
            warn!("No connections defined");
        }
        WiringPlan::new(&self.registry, connections, self.config.unknown_connections)
    }

    /// Run the exhaustive search and return the structured report.
    pub fn search(&self, connections: &[Connection]) -> Result<SearchReport> {
        search(&self.plan(connections)?, &self.config)
    }

    /// Run the exhaustive search and return the report text.
    pub fn run_simulation(&self, connections: &[Connection]) -> Result<String> {
        Ok(self.search(connections)?.render())
    }

    /// [`run_simulation`](Self::run_simulation) over the session's own list.
    pub fn run(&self) -> Result<String> {
        self.run_simulation(&self.connections)
    }

    /// Trace a single port under an explicit state vector.
    ///
    /// Hops are always recorded here, whatever `record_hops` says.
    pub fn trace(
        &self,
        connections: &[Connection],
        states: &[SwitchState],
        start: &PortPath,
    ) -> Result<Trace> {
        let topo = self.plan(connections)?.build(states)?;
        let port = topo
            .find_port(&start.node, &start.port)
            .ok_or_else(|| match topo.node_id(&start.node) {
                None => FabricError::UnknownNode {
                    node: start.node.clone(),
                },
                Some(_) => FabricError::UnknownPort {
                    node: start.node.clone(),
                    port: start.port.clone(),
                },
            })?;
        Ok(trace_path(&topo, port, true))
    }

    /// Whether `states` routes every input port.
    pub fn is_routable(&self, connections: &[Connection], states: &[SwitchState]) -> Result<bool> {
        let plan = self.plan(connections)?;
        Ok(matches!(
            evaluate_trial(&plan, states, false)?,
            TrialOutcome::Routed(_)
        ))
    }
}
