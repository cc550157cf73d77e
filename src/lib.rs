//! Photonic Switch Fabric Routing Analysis
//!
//! Models a fabric of 2x2 switch elements, each in a bar or cross state,
//! wired to input and output endpoints, and enumerates every distinct
//! input -> output routing the fabric can realise.

pub mod config;
pub mod engine;
pub mod error;
pub mod layouts;
pub mod registry;
pub mod search;
pub mod topology;
pub mod tracer;
pub mod wiring;

pub use config::{ConnectionPolicy, SimulationConfig};
pub use engine::SimulationEngine;
pub use error::{FabricError, Result};
pub use registry::Registry;
pub use search::{search, Configuration, Mapping, Route, SearchReport, NO_VALID_CONFIGURATIONS};
pub use topology::{Orientation, PortPath, Role, SwitchState, Topology};
pub use tracer::{trace_path, Trace, TraceOutcome};
pub use wiring::{Connection, WiringPlan};
