//! Topology construction for a single switch-state assignment.

use log::warn;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ConnectionPolicy;
use crate::error::{FabricError, Result};
use crate::registry::Registry;
use crate::topology::{Orientation, PortId, PortPath, Role, SwitchState, Topology};

/// A user-supplied fibre between two ports of different (or the same) nodes.
///
/// Serialised as a `[nodeA, portA, nodeB, portB]` array.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(
    from = "(String, String, String, String)",
    into = "(String, String, String, String)"
)]
pub struct Connection {
    pub a: PortPath,
    pub b: PortPath,
}

impl Connection {
    pub fn new(
        node_a: impl Into<String>,
        port_a: impl Into<String>,
        node_b: impl Into<String>,
        port_b: impl Into<String>,
    ) -> Self {
        Self {
            a: PortPath::new(node_a, port_a),
            b: PortPath::new(node_b, port_b),
        }
    }
}

impl From<(String, String, String, String)> for Connection {
    fn from((na, pa, nb, pb): (String, String, String, String)) -> Self {
        Self::new(na, pa, nb, pb)
    }
}

impl From<(&str, &str, &str, &str)> for Connection {
    fn from((na, pa, nb, pb): (&str, &str, &str, &str)) -> Self {
        Self::new(na, pa, nb, pb)
    }
}

impl From<Connection> for (String, String, String, String) {
    fn from(c: Connection) -> Self {
        (c.a.node, c.a.port, c.b.node, c.b.port)
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <-> {}", self.a, self.b)
    }
}

/// Check that `path` names a registered node and one of its declared ports.
fn resolve(registry: &Registry, path: &PortPath) -> Result<()> {
    let role = registry
        .role_of(&path.node)
        .ok_or_else(|| FabricError::UnknownNode {
            node: path.node.clone(),
        })?;
    if !role.port_labels().contains(&path.port.as_str()) {
        return Err(FabricError::UnknownPort {
            node: path.node.clone(),
            port: path.port.clone(),
        });
    }
    Ok(())
}

/// Registry snapshot plus a validated connection list, ready to be built
/// once per trial.
#[derive(Clone, Debug)]
pub struct WiringPlan {
    registry: Registry,
    connections: Vec<Connection>,
}

impl WiringPlan {
    /// Validate `connections` against `registry`.
    ///
    /// Unknown nodes and ports follow `policy`. A port used by two
    /// connections, or joined to itself, is always an error.
    pub fn new(
        registry: &Registry,
        connections: &[Connection],
        policy: ConnectionPolicy,
    ) -> Result<Self> {
        let mut used: FxHashSet<&PortPath> = FxHashSet::default();
        let mut accepted = Vec::with_capacity(connections.len());

        for conn in connections {
            if let Err(e) = resolve(registry, &conn.a).and_then(|_| resolve(registry, &conn.b)) {
                match policy {
                    ConnectionPolicy::Reject => return Err(e),
                    ConnectionPolicy::Ignore => {
                        warn!("Skipping connection {conn}: {e}");
                        continue;
                    }
                }
            }
            if conn.a == conn.b {
                return Err(FabricError::PortAlreadyConnected {
                    port: conn.a.to_string(),
                });
            }
            for end in [&conn.a, &conn.b] {
                if !used.insert(end) {
                    return Err(FabricError::PortAlreadyConnected {
                        port: end.to_string(),
                    });
                }
            }
            accepted.push(conn.clone());
        }

        Ok(Self {
            registry: registry.clone(),
            connections: accepted,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn switch_count(&self) -> usize {
        self.registry.switches().len()
    }

    /// Build a fresh topology for one trial.
    ///
    /// `states` is positional over the registry's switches; missing entries
    /// default to Bar.
    pub fn build(&self, states: &[SwitchState]) -> Result<Topology> {
        let mut topo = Topology::new();

        for name in self.registry.inputs() {
            topo.create_endpoint(name, Role::Input);
        }
        for name in self.registry.outputs() {
            topo.create_endpoint(name, Role::Output);
        }
        for (i, name) in self.registry.switches().iter().enumerate() {
            let state = states.get(i).copied().unwrap_or_default();
            topo.create_switch(name, state);
            for (p, q) in state.internal_pairs() {
                let (a, b) = (port(&topo, name, p)?, port(&topo, name, q)?);
                topo.connect(a, b, Orientation::Internal)?;
            }
        }

        for conn in &self.connections {
            let a = port(&topo, &conn.a.node, &conn.a.port)?;
            let b = port(&topo, &conn.b.node, &conn.b.port)?;
            topo.connect(a, b, Orientation::External)?;
        }

        Ok(topo)
    }
}

fn port(topo: &Topology, node: &str, label: &str) -> Result<PortId> {
    if topo.node_id(node).is_none() {
        return Err(FabricError::UnknownNode {
            node: node.to_string(),
        });
    }
    topo.find_port(node, label)
        .ok_or_else(|| FabricError::UnknownPort {
            node: node.to_string(),
            port: label.to_string(),
        })
}
