//! Runtime model entities

use crate::{error::SourceLocation, scope::ArgOrigin};
use indexmap::IndexMap;
use serde::Serialize;

/// Typed parameter value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<ParamValue>),
    Map(IndexMap<String, ParamValue>),
    /// Contents of a `binfile`
    Binary(Vec<u8>),
    /// A `command` whose output would become the value; never executed here
    Command(String),
}

/// Parameter set on the parameter server
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamSpec {
    pub name: String,
    pub value: ParamValue,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    Node,
    Test {
        test_name: String,
        retry: u32,
        time_limit: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputTarget {
    Log,
    Screen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkingDir {
    RosHome,
    Node,
}

/// Node (or test) as it would be launched
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSpec {
    pub kind: NodeKind,
    pub package: String,
    pub node_type: String,
    /// Fully resolved name, `namespace/name`
    pub name: String,
    pub namespace: String,
    pub remaps: Vec<(String, String)>,
    pub args: String,
    pub machine: String,
    pub env: IndexMap<String, String>,
    pub respawn: bool,
    pub respawn_delay: f64,
    pub required: bool,
    pub output: OutputTarget,
    pub cwd: WorkingDir,
    pub launch_prefix: Option<String>,
    /// Names of every parameter under this node's private namespace
    pub params: Vec<String>,
    pub location: SourceLocation,
}

impl NodeSpec {
    pub fn is_test(&self) -> bool {
        matches!(self.kind, NodeKind::Test { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RosparamOp {
    Load,
    Dump,
    Delete,
}

/// A `rosparam` operation or a `clear_params` request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosparamCommand {
    pub op: RosparamOp,
    /// Resolved target namespace or parameter
    pub namespace: String,
    pub file: Option<String>,
    /// Inline YAML body
    pub text: Option<String>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineDefault {
    True,
    False,
    Never,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineSpec {
    pub name: String,
    pub address: String,
    pub ssh_port: u16,
    pub env_loader: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub timeout: f64,
    pub default: MachineDefault,
    pub location: SourceLocation,
}

impl MachineSpec {
    /// Whether nodes may be assigned to this machine by default
    pub fn is_assignable(&self) -> bool {
        self.default != MachineDefault::Never
    }

    /// Same connection definition, wherever it was declared
    pub fn same_definition(&self, other: &MachineSpec) -> bool {
        self.name == other.name
            && self.address == other.address
            && self.ssh_port == other.ssh_port
            && self.env_loader == other.env_loader
            && self.user == other.user
            && self.password == other.password
            && self.timeout == other.timeout
            && self.default == other.default
    }
}

/// Resolved top-level argument
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArgValue {
    pub name: String,
    pub value: Option<String>,
    pub origin: ArgOrigin,
    pub doc: Option<String>,
}
