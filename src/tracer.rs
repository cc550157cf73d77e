//! Light-path tracing through a wired topology.
//!
//! A signal alternates between external links (fibres between nodes) and
//! internal links (a switch's bar/cross routing) until it reaches an output
//! port or fails.

use log::trace;
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::fmt;

use crate::topology::{Orientation, PortId, PortPath, Role, Topology};

/// Terminal result of a single trace.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TraceOutcome {
    /// The signal reached this output port.
    Output(PortPath),
    /// A port was revisited.
    Loop,
    /// The signal re-entered an input port other than its source.
    Invalid,
    /// The next link does not exist.
    BrokenLink,
}

impl TraceOutcome {
    pub fn is_output(&self) -> bool {
        matches!(self, TraceOutcome::Output(_))
    }
}

impl fmt::Display for TraceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceOutcome::Output(path) => write!(f, "{path}"),
            TraceOutcome::Loop => f.write_str("LOOP"),
            TraceOutcome::Invalid => f.write_str("INVALID"),
            TraceOutcome::BrokenLink => f.write_str("BROKEN_LINK"),
        }
    }
}

/// One traversed link.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Hop {
    pub from: PortPath,
    pub to: PortPath,
    pub orientation: Orientation,
}

impl fmt::Display for Hop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Current: {} {} -> Next: {} {} ({})",
            self.from.node, self.from.port, self.to.node, self.to.port, self.orientation
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Trace {
    pub start: PortPath,
    pub outcome: TraceOutcome,
    /// Empty unless hop recording was requested.
    pub hops: Vec<Hop>,
}

/// Follow the signal entering at `start`.
///
/// Terminates within one step per port of the topology: every step either
/// ends the trace or visits a port not seen before.
pub fn trace_path(topo: &Topology, start: PortId, record_hops: bool) -> Trace {
    let mut visited: FxHashSet<PortId> = FxHashSet::default();
    let mut hops = Vec::new();
    let mut current = start;
    // Flipped before the first lookup, so the first link read is external.
    let mut orientation = Orientation::Internal;

    let outcome = loop {
        if !visited.insert(current) {
            break TraceOutcome::Loop;
        }

        match topo.role_of(current) {
            Role::Output => break TraceOutcome::Output(topo.port_path(current)),
            Role::Input if current != start => break TraceOutcome::Invalid,
            _ => {}
        }

        orientation = orientation.flip();
        let Some(next) = topo.neighbor_at(current, orientation) else {
            break TraceOutcome::BrokenLink;
        };

        trace!(
            "{} -> {} ({orientation})",
            topo.port_path(current),
            topo.port_path(next)
        );
        if record_hops {
            hops.push(Hop {
                from: topo.port_path(current),
                to: topo.port_path(next),
                orientation,
            });
        }
        current = next;
    };

    Trace {
        start: topo.port_path(start),
        outcome,
        hops,
    }
}
