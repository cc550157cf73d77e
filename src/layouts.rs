//! Generated Fabric Wirings
//!
//! Connection lists for common switch arrangements over a registry's nodes.

use crate::registry::Registry;
use crate::topology::{PortPath, Role};
use crate::wiring::Connection;

/// Input ports of every input node, in registry order.
fn input_lines(registry: &Registry) -> Vec<PortPath> {
    lines(registry.inputs(), Role::Input)
}

fn output_lines(registry: &Registry) -> Vec<PortPath> {
    lines(registry.outputs(), Role::Output)
}

fn lines(names: &[String], role: Role) -> Vec<PortPath> {
    names
        .iter()
        .flat_map(|n| role.port_labels().iter().map(move |p| PortPath::new(n.as_str(), *p)))
        .collect()
}

/// Chain all switches between the first input and the first output.
///
/// `in1`/`in2` feed the first switch's ports 1/2, each switch's 3/4 feed the
/// next switch's 1/2, and the last switch's 3/4 feed `out3`/`out4`. Without
/// switches the input is wired straight to the output. Returns an empty list
/// if the registry has no input or no output.
pub fn cascade(registry: &Registry) -> Vec<Connection> {
    let (Some(input), Some(output)) = (registry.inputs().first(), registry.outputs().first())
    else {
        return Vec::new();
    };

    let mut open = [PortPath::new(input.as_str(), "in1"), PortPath::new(input.as_str(), "in2")];
    let mut conns = Vec::with_capacity(2 * (registry.switches().len() + 1));

    for switch in registry.switches() {
        for (i, (port_in, port_out)) in [("1", "3"), ("2", "4")].into_iter().enumerate() {
            let entry = PortPath::new(switch.as_str(), port_in);
            conns.push(Connection {
                a: std::mem::replace(&mut open[i], PortPath::new(switch.as_str(), port_out)),
                b: entry,
            });
        }
    }

    for (from, label) in open.into_iter().zip(["out3", "out4"]) {
        conns.push(Connection {
            a: from,
            b: PortPath::new(output.as_str(), label),
        });
    }
    conns
}

/// Rectangular mesh of switches over the input lines.
///
/// Switches are placed layer by layer on alternating even/odd line pairs,
/// as in a Clements mesh. With 2k lines and k(2k-1) switches every
/// permutation of lines onto outputs is reachable. Lines are matched to
/// output ports in order; surplus switches stay unconnected.
pub fn rectangular_mesh(registry: &Registry) -> Vec<Connection> {
    let mut open = input_lines(registry);
    let outputs = output_lines(registry);
    let n = open.len().min(outputs.len());
    open.truncate(n);
    if n < 2 {
        return Vec::new();
    }

    let mut conns = Vec::new();
    let mut switches = registry.switches().iter();

    'layers: for layer in 0..(2 * n - 3) {
        let mut pos = layer % 2;
        while pos < n - 1 {
            let Some(switch) = switches.next() else {
                break 'layers;
            };
            for (offset, (port_in, port_out)) in [("1", "3"), ("2", "4")].into_iter().enumerate() {
                let line = pos + offset;
                conns.push(Connection {
                    a: std::mem::replace(&mut open[line], PortPath::new(switch.as_str(), port_out)),
                    b: PortPath::new(switch.as_str(), port_in),
                });
            }
            pos += 2;
        }
    }

    for (from, to) in open.into_iter().zip(outputs) {
        conns.push(Connection { a: from, b: to });
    }
    conns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cascade_without_switches() {
        let mut registry = Registry::new();
        registry.register("IN1", Role::Input);
        registry.register("OUT1", Role::Output);

        let conns = cascade(&registry);
        assert_eq!(
            conns,
            vec![
                Connection::new("IN1", "in1", "OUT1", "out3"),
                Connection::new("IN1", "in2", "OUT1", "out4"),
            ]
        );
    }

    #[test]
    fn test_cascade_chains_switches() {
        let mut registry = Registry::new();
        registry.register("IN1", Role::Input);
        registry.register("OUT1", Role::Output);
        registry.register("X1", Role::Switch);
        registry.register("X2", Role::Switch);

        let conns = cascade(&registry);
        assert_eq!(conns.len(), 6);
        assert_eq!(conns[0], Connection::new("IN1", "in1", "X1", "1"));
        assert_eq!(conns[2], Connection::new("X1", "3", "X2", "1"));
        assert_eq!(conns[5], Connection::new("X2", "4", "OUT1", "out4"));
    }

    #[test]
    fn test_cascade_needs_endpoints() {
        let mut registry = Registry::new();
        registry.register("X1", Role::Switch);
        assert!(cascade(&registry).is_empty());
    }

    #[test]
    fn test_mesh_uses_every_default_switch() {
        let registry = Registry::with_defaults();
        let conns = rectangular_mesh(&registry);

        // 6 switches x 2 entries + 4 output links.
        assert_eq!(conns.len(), 16);
        for switch in registry.switches() {
            assert!(conns.iter().any(|c| &c.b.node == switch));
        }
        assert_eq!(conns[0], Connection::new("INnode1", "in1", "X1", "1"));
        assert_eq!(conns[2], Connection::new("INnode2", "in1", "X2", "1"));
        // Layer 1 joins the middle lines.
        assert_eq!(conns[4], Connection::new("X1", "4", "X3", "1"));
        assert_eq!(conns[5], Connection::new("X2", "3", "X3", "2"));
    }
}
