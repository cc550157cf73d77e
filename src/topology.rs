//! Switch Fabric Topology
//!
//! Arena of nodes and ports for one trial. Every port owns two link slots,
//! one per [`Orientation`]; a link is recorded on both of its ends.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{FabricError, Result};

/// Role of a node in the fabric. Fixed at creation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Input,
    Output,
    Switch,
}

impl Role {
    /// Port labels every node of this role is created with, in declaration order.
    pub fn port_labels(self) -> &'static [&'static str] {
        match self {
            Role::Input => &["in1", "in2"],
            Role::Output => &["out3", "out4"],
            Role::Switch => &["1", "2", "3", "4"],
        }
    }

    /// Slot a traversal reads when leaving a port of this role.
    ///
    /// Endpoints carry a single link, so they ignore the traversal orientation.
    pub fn read_slot(self, orientation: Orientation) -> Orientation {
        match self {
            Role::Switch => orientation,
            Role::Input | Role::Output => Orientation::External,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Input => "input",
            Role::Output => "output",
            Role::Switch => "switch",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "input" => Ok(Role::Input),
            "output" => Ok(Role::Output),
            "switch" => Ok(Role::Switch),
            other => Err(format!(
                "unknown role '{other}' (expected switch, input or output)"
            )),
        }
    }
}

/// Internal routing state of a 2x2 switch element.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchState {
    /// Pairs ports {1,3} and {2,4}.
    #[default]
    Bar,
    /// Pairs ports {1,4} and {2,3}.
    Cross,
}

impl SwitchState {
    /// Internal port pairs produced by this state.
    pub fn internal_pairs(self) -> [(&'static str, &'static str); 2] {
        match self {
            SwitchState::Bar => [("1", "3"), ("2", "4")],
            SwitchState::Cross => [("1", "4"), ("2", "3")],
        }
    }

    /// Bar = 0, Cross = 1.
    pub fn bit(self) -> u8 {
        match self {
            SwitchState::Bar => 0,
            SwitchState::Cross => 1,
        }
    }

    pub fn from_bit(bit: bool) -> Self {
        if bit {
            SwitchState::Cross
        } else {
            SwitchState::Bar
        }
    }
}

/// Which of a port's two link slots is addressed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Link derived from the owning switch's bar/cross state.
    Internal,
    /// Link supplied by an inter-node connection.
    External,
}

impl Orientation {
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Orientation::Internal => 0,
            Orientation::External => 1,
        }
    }

    #[inline]
    pub fn flip(self) -> Self {
        match self {
            Orientation::Internal => Orientation::External,
            Orientation::External => Orientation::Internal,
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Internal => f.write_str("internal"),
            Orientation::External => f.write_str("external"),
        }
    }
}

// Dense IDs, only meaningful within the topology that issued them.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct PortId(pub(crate) u32);

/// Human-readable port address (node name + port label).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortPath {
    pub node: String,
    pub port: String,
}

impl PortPath {
    pub fn new(node: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            port: port.into(),
        }
    }
}

impl From<(&str, &str)> for PortPath {
    fn from((node, port): (&str, &str)) -> Self {
        Self::new(node, port)
    }
}

impl fmt::Display for PortPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    role: Role,
    /// Only switches carry a state.
    state: Option<SwitchState>,
    ports: Vec<PortId>,
}

impl Node {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> Option<SwitchState> {
        self.state
    }

    pub fn ports(&self) -> &[PortId] {
        &self.ports
    }
}

#[derive(Debug, Clone)]
pub struct Port {
    node: NodeId,
    label: String,
    links: [Option<PortId>; 2],
}

impl Port {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Raw slot contents, without the per-role read rule.
    pub fn link(&self, orientation: Orientation) -> Option<PortId> {
        self.links[orientation.index()]
    }
}

/// Complete set of nodes, ports and links for one switch-state assignment.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    nodes: Vec<Node>,
    ports: Vec<Port>,
    node_by_name: FxHashMap<String, NodeId>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node without ports. Switches start in the Bar state.
    pub fn create_node(&mut self, name: &str, role: Role) -> NodeId {
        debug_assert!(
            !self.node_by_name.contains_key(name),
            "node '{name}' created twice"
        );
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            name: name.to_string(),
            role,
            state: (role == Role::Switch).then_some(SwitchState::Bar),
            ports: Vec::with_capacity(role.port_labels().len()),
        });
        self.node_by_name.insert(name.to_string(), id);
        id
    }

    /// Create a switch with the given state and its four ports.
    pub fn create_switch(&mut self, name: &str, state: SwitchState) -> NodeId {
        let id = self.create_node(name, Role::Switch);
        self.nodes[id.0 as usize].state = Some(state);
        for label in Role::Switch.port_labels() {
            self.add_port(id, label);
        }
        id
    }

    /// Create an input or output node with its declared ports.
    pub fn create_endpoint(&mut self, name: &str, role: Role) -> NodeId {
        let id = self.create_node(name, role);
        for label in role.port_labels() {
            self.add_port(id, label);
        }
        id
    }

    pub fn add_port(&mut self, node: NodeId, label: &str) -> PortId {
        let id = PortId(self.ports.len() as u32);
        self.ports.push(Port {
            node,
            label: label.to_string(),
            links: [None, None],
        });
        self.nodes[node.0 as usize].ports.push(id);
        id
    }

    /// Link two ports in the given orientation slot on both ends.
    ///
    /// Fails with [`FabricError::DuplicateSlot`] if either slot is occupied,
    /// which correct wiring never does.
    pub fn connect(&mut self, a: PortId, b: PortId, orientation: Orientation) -> Result<()> {
        let slot = orientation.index();
        for p in [a, b] {
            if self.ports[p.0 as usize].links[slot].is_some() || a == b {
                return Err(FabricError::DuplicateSlot {
                    port: self.port_path(p).to_string(),
                    orientation,
                });
            }
        }
        self.ports[a.0 as usize].links[slot] = Some(b);
        self.ports[b.0 as usize].links[slot] = Some(a);
        Ok(())
    }

    /// Neighbor reached when leaving `port` in `orientation`, after the
    /// owning node's role rule is applied.
    pub fn neighbor_at(&self, port: PortId, orientation: Orientation) -> Option<PortId> {
        let role = self.role_of(port);
        self.ports[port.0 as usize].link(role.read_slot(orientation))
    }

    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.node_by_name.get(name).copied()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn port(&self, id: PortId) -> &Port {
        &self.ports[id.0 as usize]
    }

    /// Look up a port by node name and label.
    pub fn find_port(&self, node: &str, label: &str) -> Option<PortId> {
        let node = self.node_id(node)?;
        self.node(node)
            .ports
            .iter()
            .copied()
            .find(|&p| self.ports[p.0 as usize].label == label)
    }

    pub fn role_of(&self, port: PortId) -> Role {
        self.node(self.port(port).node).role()
    }

    pub fn port_path(&self, port: PortId) -> PortPath {
        let p = self.port(port);
        PortPath::new(self.node(p.node).name(), p.label())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn port_count(&self) -> usize {
        self.ports.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_records_both_ends() {
        let mut topo = Topology::new();
        let x = topo.create_switch("X1", SwitchState::Bar);
        let p1 = topo.find_port("X1", "1").unwrap();
        let p3 = topo.find_port("X1", "3").unwrap();

        topo.connect(p1, p3, Orientation::Internal).unwrap();

        assert_eq!(topo.neighbor_at(p1, Orientation::Internal), Some(p3));
        assert_eq!(topo.neighbor_at(p3, Orientation::Internal), Some(p1));
        assert_eq!(topo.neighbor_at(p1, Orientation::External), None);
        assert_eq!(topo.node(x).ports().len(), 4);
    }

    #[test]
    fn test_duplicate_slot_rejected() {
        let mut topo = Topology::new();
        topo.create_switch("X1", SwitchState::Bar);
        let p1 = topo.find_port("X1", "1").unwrap();
        let p2 = topo.find_port("X1", "2").unwrap();
        let p3 = topo.find_port("X1", "3").unwrap();

        topo.connect(p1, p3, Orientation::External).unwrap();
        let err = topo.connect(p2, p3, Orientation::External).unwrap_err();
        assert!(matches!(
            err,
            FabricError::DuplicateSlot {
                orientation: Orientation::External,
                ..
            }
        ));
        // Failed connect leaves p2 untouched.
        assert_eq!(topo.port(p2).link(Orientation::External), None);
    }

    #[test]
    fn test_self_link_rejected() {
        let mut topo = Topology::new();
        topo.create_switch("X1", SwitchState::Bar);
        let p1 = topo.find_port("X1", "1").unwrap();
        assert!(topo.connect(p1, p1, Orientation::External).is_err());
    }

    #[test]
    fn test_endpoint_ignores_orientation() {
        let mut topo = Topology::new();
        topo.create_endpoint("IN1", Role::Input);
        topo.create_switch("X1", SwitchState::Cross);
        let in1 = topo.find_port("IN1", "in1").unwrap();
        let x1 = topo.find_port("X1", "1").unwrap();
        topo.connect(in1, x1, Orientation::External).unwrap();

        assert_eq!(topo.neighbor_at(in1, Orientation::Internal), Some(x1));
        assert_eq!(topo.neighbor_at(in1, Orientation::External), Some(x1));
        // Switch ports honour the orientation.
        assert_eq!(topo.neighbor_at(x1, Orientation::Internal), None);
    }

    #[test]
    fn test_declared_ports() {
        let mut topo = Topology::new();
        let i = topo.create_endpoint("IN1", Role::Input);
        let o = topo.create_endpoint("OUT1", Role::Output);
        let labels = |id: NodeId| -> Vec<String> {
            topo.node(id)
                .ports()
                .iter()
                .map(|&p| topo.port(p).label().to_string())
                .collect()
        };
        assert_eq!(labels(i), vec!["in1", "in2"]);
        assert_eq!(labels(o), vec!["out3", "out4"]);
        assert_eq!(topo.node(i).state(), None);
        assert_eq!(topo.node(o).name(), "OUT1");
        assert_eq!(topo.node(o).role(), Role::Output);
        assert_eq!(topo.find_port("OUT1", "1"), None);
        assert_eq!(topo.port_path(topo.find_port("OUT1", "out4").unwrap()).to_string(), "OUT1.out4");
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("Switch".parse::<Role>().unwrap(), Role::Switch);
        assert_eq!("input".parse::<Role>().unwrap(), Role::Input);
        assert!("router".parse::<Role>().is_err());
    }
}
