//! Node and test action implementation

use super::{optional_subs, required_subs, resolve, resolve_bool, resolve_opt};
use crate::{
    error::{ErrorKind, LaunchError, Result},
    model::{NodeKind, NodeSpec, OutputTarget, RosparamCommand, RosparamOp, RuntimeModel, WorkingDir},
    scope::{check_base_name, check_graph_name, Scope, LOCAL_MACHINE},
    substitution::{Substitution, SubstitutionContext},
    xml::Element,
};
use indexmap::IndexMap;

const DEFAULT_TIME_LIMIT: f64 = 60.0;

/// `<node>` or `<test>`
#[derive(Debug, Clone)]
pub struct NodeAction {
    pub is_test: bool,
    pub package: Vec<Substitution>,
    pub node_type: Vec<Substitution>,
    pub name: Option<Vec<Substitution>>,
    pub test_name: Option<Vec<Substitution>>,
    pub args: Option<Vec<Substitution>>,
    pub namespace: Option<Vec<Substitution>>,
    pub machine: Option<Vec<Substitution>>,
    pub respawn: Option<Vec<Substitution>>,
    pub respawn_delay: Option<Vec<Substitution>>,
    pub required: Option<Vec<Substitution>>,
    pub clear_params: Option<Vec<Substitution>>,
    pub output: Option<Vec<Substitution>>,
    pub cwd: Option<Vec<Substitution>>,
    pub launch_prefix: Option<Vec<Substitution>>,
    pub retry: Option<Vec<Substitution>>,
    pub time_limit: Option<Vec<Substitution>>,
}

/// A node whose own attributes are resolved, waiting for its children
#[derive(Debug, Clone)]
pub struct NodeTarget {
    /// Scope for the node's children: its namespace, private names under the node
    pub scope: Scope,
    pub clear_params: Option<RosparamCommand>,
    spec: NodeSpec,
}

impl NodeTarget {
    pub fn full_name(&self) -> &str {
        &self.spec.name
    }

    /// Complete the [`NodeSpec`] with the remappings and environment in effect after
    /// the node's children were applied
    pub fn finish(mut self, final_scope: &Scope) -> NodeSpec {
        self.spec.remaps = final_scope.remaps().to_vec();
        self.spec.env = final_scope.env_overrides().clone();
        self.spec
    }
}

impl NodeAction {
    pub fn from_element(element: &Element) -> Result<Self> {
        let is_test = element.type_name() == "test";
        Ok(Self {
            is_test,
            package: required_subs(element, "pkg")?,
            node_type: required_subs(element, "type")?,
            name: if is_test {
                optional_subs(element, "name")?
            } else {
                Some(required_subs(element, "name")?)
            },
            test_name: if is_test {
                Some(required_subs(element, "test-name")?)
            } else {
                None
            },
            args: optional_subs(element, "args")?,
            namespace: optional_subs(element, "ns")?,
            machine: optional_subs(element, "machine")?,
            respawn: optional_subs(element, "respawn")?,
            respawn_delay: optional_subs(element, "respawn_delay")?,
            required: optional_subs(element, "required")?,
            clear_params: optional_subs(element, "clear_params")?,
            output: optional_subs(element, "output")?,
            cwd: optional_subs(element, "cwd")?,
            launch_prefix: optional_subs(element, "launch-prefix")?,
            retry: optional_subs(element, "retry")?,
            time_limit: optional_subs(element, "time-limit")?,
        })
    }

    /// Resolve the node's attributes in the inbound scope
    pub fn enter(
        &self,
        element: &Element,
        scope: &Scope,
        context: &SubstitutionContext,
        model: &RuntimeModel,
    ) -> Result<NodeTarget> {
        let kind = if self.is_test {
            let test_name = resolve(self.test_name.as_deref().unwrap_or_default(), scope, context)?;
            check_base_name(&test_name)?;
            NodeKind::Test {
                test_name,
                retry: self.resolve_retry(scope, context)?,
                time_limit: self.resolve_time_limit(scope, context)?,
            }
        } else {
            NodeKind::Node
        };

        let name = match (&self.name, &kind) {
            (Some(name), _) => resolve(name, scope, context)?,
            (None, NodeKind::Test { test_name, .. }) => test_name.clone(),
            (None, NodeKind::Node) => return Err(LaunchError::missing_attribute("node", "name")),
        };
        check_base_name(&name)?;

        let ns_scope = match resolve_opt(&self.namespace, scope, context)? {
            Some(ns) => {
                check_graph_name(&ns, true)?;
                scope.push_namespace(&ns)
            }
            None => scope.clone(),
        };
        let full_name = ns_scope.resolve_name(&name);
        let node_scope = ns_scope.enter_node(&full_name);

        let machine = match resolve_opt(&self.machine, scope, context)? {
            Some(machine) => {
                if machine != LOCAL_MACHINE && model.machine(&machine).is_none() {
                    return Err(ErrorKind::UndeclaredMachine(machine).into());
                }
                machine
            }
            None => scope.machine().to_string(),
        };

        // Tests are never respawned and never required
        let (respawn, required) = if self.is_test {
            (false, false)
        } else {
            (
                resolve_bool(&self.respawn, "respawn", false, scope, context)?,
                resolve_bool(&self.required, "required", false, scope, context)?,
            )
        };
        if respawn && required {
            return Err(LaunchError::invalid_value(
                "required",
                "true",
                "a node cannot be both respawn and required",
            ));
        }

        let respawn_delay = match resolve_opt(&self.respawn_delay, scope, context)? {
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(delay) if delay >= 0.0 => delay,
                _ => {
                    return Err(LaunchError::invalid_value(
                        "respawn_delay",
                        raw,
                        "must be a non-negative number",
                    ))
                }
            },
            None => 0.0,
        };

        let clear_params = if resolve_bool(&self.clear_params, "clear_params", false, scope, context)? {
            Some(RosparamCommand {
                op: RosparamOp::Delete,
                namespace: full_name.clone(),
                file: None,
                text: None,
                location: element.location().clone(),
            })
        } else {
            None
        };

        let spec = NodeSpec {
            kind,
            package: resolve(&self.package, scope, context)?,
            node_type: resolve(&self.node_type, scope, context)?,
            name: full_name,
            namespace: ns_scope.namespace().to_string(),
            remaps: Vec::new(),
            args: resolve_opt(&self.args, scope, context)?.unwrap_or_default(),
            machine,
            env: IndexMap::new(),
            respawn,
            respawn_delay,
            required,
            output: self.resolve_output(scope, context)?,
            cwd: self.resolve_cwd(scope, context)?,
            launch_prefix: resolve_opt(&self.launch_prefix, scope, context)?
                .filter(|prefix| !prefix.trim().is_empty()),
            params: Vec::new(),
            location: element.location().clone(),
        };

        Ok(NodeTarget {
            scope: node_scope,
            clear_params,
            spec,
        })
    }

    fn resolve_output(&self, scope: &Scope, context: &SubstitutionContext) -> Result<OutputTarget> {
        match resolve_opt(&self.output, scope, context)? {
            None => Ok(OutputTarget::Log),
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "log" => Ok(OutputTarget::Log),
                "screen" => Ok(OutputTarget::Screen),
                _ => Err(LaunchError::invalid_value("output", raw, "expected log or screen")),
            },
        }
    }

    fn resolve_cwd(&self, scope: &Scope, context: &SubstitutionContext) -> Result<WorkingDir> {
        match resolve_opt(&self.cwd, scope, context)? {
            None => Ok(WorkingDir::RosHome),
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "ros_home" | "ros-root" => Ok(WorkingDir::RosHome),
                "node" => Ok(WorkingDir::Node),
                _ => Err(LaunchError::invalid_value("cwd", raw, "expected ROS_HOME or node")),
            },
        }
    }

    fn resolve_retry(&self, scope: &Scope, context: &SubstitutionContext) -> Result<u32> {
        match resolve_opt(&self.retry, scope, context)? {
            None => Ok(0),
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|_| LaunchError::invalid_value("retry", raw, "must be a non-negative integer")),
        }
    }

    fn resolve_time_limit(&self, scope: &Scope, context: &SubstitutionContext) -> Result<f64> {
        match resolve_opt(&self.time_limit, scope, context)? {
            None => Ok(DEFAULT_TIME_LIMIT),
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(limit) if limit > 0.0 => Ok(limit),
                _ => Err(LaunchError::invalid_value(
                    "time-limit",
                    raw,
                    "must be a positive number",
                )),
            },
        }
    }
}
