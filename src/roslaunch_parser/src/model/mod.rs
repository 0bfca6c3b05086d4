//! Runtime model produced by interpretation

mod types;

pub use types::*;

use crate::{
    error::{ErrorKind, Result},
    scope::Scope,
};
use indexmap::IndexMap;
use serde::Serialize;

/// Flattened result of interpreting a launch tree, in document order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RuntimeModel {
    pub nodes: Vec<NodeSpec>,
    pub parameters: Vec<ParamSpec>,
    pub rosparam_commands: Vec<RosparamCommand>,
    pub machines: Vec<MachineSpec>,
    pub args: IndexMap<String, ArgValue>,
}

impl RuntimeModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn push_node(&mut self, node: NodeSpec) {
        self.nodes.push(node);
    }

    /// Record a parameter; a later setting of the same name replaces the earlier one
    pub fn set_param(&mut self, param: ParamSpec) {
        if let Some(pos) = self.parameters.iter().position(|p| p.name == param.name) {
            let previous = self.parameters.remove(pos);
            log::warn!(
                "Parameter '{}' set at {} is overridden at {}",
                param.name,
                previous.location,
                param.location
            );
        }
        self.parameters.push(param);
    }

    pub fn push_rosparam(&mut self, command: RosparamCommand) {
        self.rosparam_commands.push(command);
    }

    /// Register a machine. Identical redefinitions are ignored.
    pub fn add_machine(&mut self, machine: MachineSpec) -> Result<()> {
        match self.machine(&machine.name) {
            Some(existing) if existing.same_definition(&machine) => Ok(()),
            Some(_) => Err(ErrorKind::MachineConflict(machine.name).into()),
            None => {
                self.machines.push(machine);
                Ok(())
            }
        }
    }

    pub fn machine(&self, name: &str) -> Option<&MachineSpec> {
        self.machines.iter().find(|m| m.name == name)
    }

    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn node(&self, name: &str) -> Option<&NodeSpec> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn tests(&self) -> impl Iterator<Item = &NodeSpec> {
        self.nodes.iter().filter(|n| n.is_test())
    }

    /// Record the arguments bound in a file's top-level scope
    pub fn record_args(&mut self, scope: &Scope) {
        for (name, binding) in scope.args() {
            self.args.insert(
                name.clone(),
                ArgValue {
                    name: name.clone(),
                    value: binding.value.clone(),
                    origin: binding.origin,
                    doc: binding.doc.clone(),
                },
            );
        }
    }

    /// Link every node to the parameters under its private namespace.
    /// Runs once the whole tree has been walked, so later params are included.
    pub fn attach_node_params(&mut self) {
        let parameters = &self.parameters;
        for node in &mut self.nodes {
            let prefix = format!("{}/", node.name);
            node.params = parameters
                .iter()
                .filter(|p| p.name.starts_with(&prefix))
                .map(|p| p.name.clone())
                .collect();
        }
    }
}
