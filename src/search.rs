//! Exhaustive State-Space Search
//!
//! Tries every bar/cross assignment of the fabric's switches, keeps the
//! assignments under which every input port reaches an output, and reports
//! each distinct input -> output mapping once.

use log::{debug, info};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::fmt;

use crate::config::SimulationConfig;
use crate::error::{FabricError, Result};
use crate::topology::{PortPath, Role, SwitchState};
use crate::tracer::{trace_path, Hop, TraceOutcome};
use crate::wiring::WiringPlan;

/// Text returned when no trial routes every input.
pub const NO_VALID_CONFIGURATIONS: &str = "No valid configurations found (check connections).";

const SEPARATOR_WIDTH: usize = 30;

/// State vector for trial `index` over `n` switches.
///
/// The first switch is the most significant bit, Bar = 0, Cross = 1, so
/// increasing indices follow lexicographic order.
pub fn states_for(index: usize, n: usize) -> Vec<SwitchState> {
    (0..n)
        .map(|i| SwitchState::from_bit((index >> (n - 1 - i)) & 1 == 1))
        .collect()
}

/// All 2^n state vectors in enumeration order.
pub fn trial_states(n: usize) -> impl ExactSizeIterator<Item = Vec<SwitchState>> {
    (0..1usize << n).map(move |k| states_for(k, n))
}

/// One input port and where its signal ends up.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Route {
    pub input: PortPath,
    pub output: PortPath,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.input, self.output)
    }
}

/// Routes of every input port for one trial, in registry order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Mapping(pub Vec<Route>);

impl Mapping {
    pub fn routes(&self) -> &[Route] {
        &self.0
    }

    /// Destination of `input`, if it is part of the mapping.
    pub fn destination(&self, input: &PortPath) -> Option<&PortPath> {
        self.0.iter().find(|r| &r.input == input).map(|r| &r.output)
    }
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, route) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{route}")?;
        }
        Ok(())
    }
}

/// Result of evaluating one trial.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrialOutcome {
    Routed(Mapping),
    /// The first input port whose trace failed, and how. `hops` is empty
    /// unless hop recording was requested.
    Discarded {
        port: PortPath,
        outcome: TraceOutcome,
        hops: Vec<Hop>,
    },
}

/// Build the topology for `states` and trace every input port.
///
/// Stops at the first failing port; no partial mapping is returned.
pub fn evaluate_trial(
    plan: &WiringPlan,
    states: &[SwitchState],
    record_hops: bool,
) -> Result<TrialOutcome> {
    let topo = plan.build(states)?;
    let mut routes = Vec::with_capacity(plan.registry().inputs().len() * 2);

    for name in plan.registry().inputs() {
        for label in Role::Input.port_labels() {
            let start = topo
                .find_port(name, label)
                .ok_or_else(|| FabricError::UnknownPort {
                    node: name.clone(),
                    port: label.to_string(),
                })?;
            let trace = trace_path(&topo, start, record_hops);
            match trace.outcome {
                TraceOutcome::Output(output) => routes.push(Route {
                    input: trace.start,
                    output,
                }),
                outcome => {
                    return Ok(TrialOutcome::Discarded {
                        port: trace.start,
                        outcome,
                        hops: trace.hops,
                    })
                }
            }
        }
    }

    Ok(TrialOutcome::Routed(Mapping(routes)))
}

/// A distinct routing outcome and the first state vector producing it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Configuration {
    /// 1-based, in discovery order.
    pub number: usize,
    pub states: Vec<SwitchState>,
    pub mapping: Mapping,
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bits: Vec<String> = self.states.iter().map(|s| s.bit().to_string()).collect();
        writeln!(f)?;
        writeln!(
            f,
            "=== Configuration {} | State: ({}) ===",
            self.number,
            bits.join(", ")
        )?;
        writeln!(f, "Mapping: {}", self.mapping)?;
        writeln!(f, "{}", "-".repeat(SEPARATOR_WIDTH))
    }
}

/// Outcome of a full search run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SearchReport {
    pub switches: Vec<String>,
    /// Number of state vectors evaluated (2^switches).
    pub trials: usize,
    /// Trials where some input port failed to reach an output.
    pub discarded: usize,
    /// Valid trials whose mapping was already reported.
    pub duplicates: usize,
    pub configurations: Vec<Configuration>,
}

impl SearchReport {
    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }

    /// Report text shown to the user.
    pub fn render(&self) -> String {
        if self.is_empty() {
            return NO_VALID_CONFIGURATIONS.to_string();
        }
        self.configurations.iter().map(|c| c.to_string()).collect()
    }
}

impl fmt::Display for SearchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Folds trial outcomes, in enumeration order, into a report.
struct Merger {
    seen: FxHashSet<Mapping>,
    report: SearchReport,
}

impl Merger {
    fn new(switches: Vec<String>) -> Self {
        Self {
            seen: FxHashSet::default(),
            report: SearchReport {
                switches,
                ..SearchReport::default()
            },
        }
    }

    fn push(&mut self, states: Vec<SwitchState>, outcome: TrialOutcome) {
        self.report.trials += 1;
        match outcome {
            TrialOutcome::Discarded {
                port,
                outcome,
                hops,
            } => {
                debug!("Trial {:?} discarded: {port} -> {outcome}", states);
                for hop in &hops {
                    debug!("  {hop}");
                }
                self.report.discarded += 1;
            }
            TrialOutcome::Routed(mapping) => {
                if self.seen.contains(&mapping) {
                    self.report.duplicates += 1;
                    return;
                }
                self.seen.insert(mapping.clone());
                let number = self.report.configurations.len() + 1;
                debug!("Configuration {number}: {mapping}");
                self.report.configurations.push(Configuration {
                    number,
                    states,
                    mapping,
                });
            }
        }
    }
}

/// Largest switch count whose trial index fits a `usize`.
fn index_limit() -> usize {
    usize::BITS as usize - 1
}

/// Run the exhaustive search over every state vector of `plan`.
///
/// The result depends only on the plan: sequential and parallel runs
/// produce identical reports.
pub fn search(plan: &WiringPlan, config: &SimulationConfig) -> Result<SearchReport> {
    let n = plan.switch_count();
    let limit = config.max_switches.min(index_limit());
    if n > limit {
        return Err(FabricError::TooManySwitches { count: n, limit });
    }

    let total = 1usize << n;
    info!(
        "Searching {total} trials over {n} switches ({} connections{})",
        plan.connections().len(),
        if config.parallel { ", parallel" } else { "" }
    );

    let mut merger = Merger::new(plan.registry().switches().to_vec());
    if config.parallel {
        let outcomes = (0..total)
            .into_par_iter()
            .map(|k| evaluate_trial(plan, &states_for(k, n), config.record_hops))
            .collect::<Result<Vec<_>>>()?;
        for (k, outcome) in outcomes.into_iter().enumerate() {
            merger.push(states_for(k, n), outcome);
        }
    } else {
        for states in trial_states(n) {
            let outcome = evaluate_trial(plan, &states, config.record_hops)?;
            merger.push(states, outcome);
        }
    }

    let report = merger.report;
    info!(
        "Search finished: {} configurations, {} discarded, {} duplicates",
        report.configurations.len(),
        report.discarded,
        report.duplicates
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionPolicy;
    use crate::registry::Registry;
    use crate::wiring::Connection;
    use crate::topology::SwitchState::{Bar, Cross};

    fn plan(registry: &Registry, conns: &[Connection]) -> WiringPlan {
        WiringPlan::new(registry, conns, ConnectionPolicy::Reject).unwrap()
    }

    #[test]
    fn test_states_enumeration_order() {
        let all: Vec<_> = trial_states(2).collect();
        assert_eq!(
            all,
            vec![
                vec![Bar, Bar],
                vec![Bar, Cross],
                vec![Cross, Bar],
                vec![Cross, Cross]
            ]
        );
        assert_eq!(trial_states(0).len(), 1);
        assert_eq!(trial_states(0).next(), Some(vec![]));
    }

    #[test]
    fn test_states_are_unique() {
        for n in 0..=6 {
            let all: FxHashSet<Vec<SwitchState>> = trial_states(n).collect();
            assert_eq!(all.len(), 1 << n);
        }
    }

    #[test]
    fn test_single_switch_both_states_routed() {
        let mut registry = Registry::new();
        registry.register("X1", Role::Switch);
        registry.register("IN1", Role::Input);
        registry.register("OUT1", Role::Output);
        let conns = [
            Connection::new("IN1", "in1", "X1", "1"),
            Connection::new("IN1", "in2", "X1", "2"),
            Connection::new("X1", "3", "OUT1", "out3"),
            Connection::new("X1", "4", "OUT1", "out4"),
        ];
        let report = search(&plan(&registry, &conns), &SimulationConfig::default()).unwrap();

        assert_eq!(report.trials, 2);
        assert_eq!(report.configurations.len(), 2);
        let bar = &report.configurations[0];
        assert_eq!(bar.states, vec![Bar]);
        assert_eq!(
            bar.mapping.to_string(),
            "IN1.in1->OUT1.out3, IN1.in2->OUT1.out4"
        );
        let cross = &report.configurations[1];
        assert_eq!(cross.number, 2);
        assert_eq!(
            cross.mapping.destination(&PortPath::new("IN1", "in1")),
            Some(&PortPath::new("OUT1", "out4"))
        );
    }

    #[test]
    fn test_unused_switch_produces_duplicates() {
        let mut registry = Registry::new();
        registry.register("IN1", Role::Input);
        registry.register("OUT1", Role::Output);
        registry.register("X1", Role::Switch);
        let conns = [
            Connection::new("IN1", "in1", "OUT1", "out3"),
            Connection::new("IN1", "in2", "OUT1", "out4"),
        ];
        let report = search(&plan(&registry, &conns), &SimulationConfig::default()).unwrap();

        assert_eq!(report.trials, 2);
        assert_eq!(report.configurations.len(), 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.configurations[0].states, vec![Bar]);
    }

    #[test]
    fn test_report_block_format() {
        let config = Configuration {
            number: 3,
            states: vec![Bar, Cross],
            mapping: Mapping(vec![Route {
                input: PortPath::new("IN1", "in1"),
                output: PortPath::new("OUT1", "out4"),
            }]),
        };
        assert_eq!(
            config.to_string(),
            "\n=== Configuration 3 | State: (0, 1) ===\nMapping: IN1.in1->OUT1.out4\n------------------------------\n"
        );
    }

    #[test]
    fn test_empty_report_message() {
        let report = SearchReport::default();
        assert_eq!(report.render(), NO_VALID_CONFIGURATIONS);
    }

    #[test]
    fn test_discarded_trial_keeps_hops_when_recording() {
        let mut registry = Registry::new();
        registry.register("X1", Role::Switch);
        registry.register("IN1", Role::Input);
        registry.register("OUT1", Role::Output);
        let conns = [
            Connection::new("IN1", "in1", "X1", "1"),
            Connection::new("X1", "3", "OUT1", "out3"),
            Connection::new("IN1", "in2", "OUT1", "out4"),
        ];
        let plan = plan(&registry, &conns);

        let TrialOutcome::Discarded { port, outcome, hops } =
            evaluate_trial(&plan, &[Cross], true).unwrap()
        else {
            panic!("cross should dead-end on X1.4");
        };
        assert_eq!(port, PortPath::new("IN1", "in1"));
        assert_eq!(outcome, TraceOutcome::BrokenLink);
        let rendered: Vec<String> = hops.iter().map(|h| h.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "Current: IN1 in1 -> Next: X1 1 (external)",
                "Current: X1 1 -> Next: X1 4 (internal)",
            ]
        );

        match evaluate_trial(&plan, &[Cross], false).unwrap() {
            TrialOutcome::Discarded { hops, .. } => assert!(hops.is_empty()),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_switch_ceiling() {
        let mut registry = Registry::new();
        for i in 0..5 {
            registry.register(&format!("X{i}"), Role::Switch);
        }
        let config = SimulationConfig {
            max_switches: 4,
            ..SimulationConfig::default()
        };
        let err = search(&plan(&registry, &[]), &config).unwrap_err();
        assert!(matches!(err, FabricError::TooManySwitches { count: 5, limit: 4 }));
    }
}
