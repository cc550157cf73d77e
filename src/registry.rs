//! Node name catalog read at the start of every run.

use crate::topology::Role;

/// Append-only lists of switch, input and output names.
///
/// Names are unique across all three lists.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Registry {
    switches: Vec<String>,
    inputs: Vec<String>,
    outputs: Vec<String>,
}

impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Six switches, two inputs and two outputs.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for i in 1..=6 {
            registry.register(&format!("X{i}"), Role::Switch);
        }
        for i in 1..=2 {
            registry.register(&format!("INnode{i}"), Role::Input);
            registry.register(&format!("OUTnode{i}"), Role::Output);
        }
        registry
    }

    /// Append `name` to the list for `role`.
    ///
    /// Returns false, leaving every list unchanged, if the name is taken.
    pub fn register(&mut self, name: &str, role: Role) -> bool {
        if self.contains(name) {
            return false;
        }
        let list = match role {
            Role::Switch => &mut self.switches,
            Role::Input => &mut self.inputs,
            Role::Output => &mut self.outputs,
        };
        list.push(name.to_string());
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.role_of(name).is_some()
    }

    pub fn role_of(&self, name: &str) -> Option<Role> {
        [Role::Switch, Role::Input, Role::Output]
            .into_iter()
            .find(|&role| self.names(role).iter().any(|n| n == name))
    }

    pub fn names(&self, role: Role) -> &[String] {
        match role {
            Role::Switch => &self.switches,
            Role::Input => &self.inputs,
            Role::Output => &self.outputs,
        }
    }

    pub fn switches(&self) -> &[String] {
        &self.switches
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }
}
