//! Include action implementation

use super::{optional_subs, required_subs, resolve, resolve_bool, resolve_opt};
use crate::{
    error::{LaunchError, Result},
    model::{RosparamCommand, RosparamOp},
    scope::{check_graph_name, Scope},
    substitution::{Substitution, SubstitutionContext},
    xml::Element,
};

/// `<include>` of another launch file
#[derive(Debug, Clone)]
pub struct IncludeAction {
    pub file: Vec<Substitution>,
    pub namespace: Option<Vec<Substitution>>,
    pub clear_params: Option<Vec<Substitution>>,
    pub pass_all_args: Option<Vec<Substitution>>,
}

/// Resolved `<include>` attributes
#[derive(Debug, Clone)]
pub struct IncludeTarget {
    pub file: String,
    /// Including scope with the include's `ns` applied
    pub scope: Scope,
    pub pass_all_args: bool,
    pub clear_params: Option<RosparamCommand>,
}

impl IncludeAction {
    pub fn from_element(element: &Element) -> Result<Self> {
        Ok(Self {
            file: required_subs(element, "file")?,
            namespace: optional_subs(element, "ns")?,
            clear_params: optional_subs(element, "clear_params")?,
            pass_all_args: optional_subs(element, "pass_all_args")?,
        })
    }

    pub fn enter(
        &self,
        element: &Element,
        scope: &Scope,
        context: &SubstitutionContext,
    ) -> Result<IncludeTarget> {
        let file = resolve(&self.file, scope, context)?;
        let namespace = resolve_opt(&self.namespace, scope, context)?;
        let inner = match &namespace {
            Some(ns) => {
                check_graph_name(ns, true)?;
                scope.push_namespace(ns)
            }
            None => scope.clone(),
        };

        let clear_params = if resolve_bool(&self.clear_params, "clear_params", false, scope, context)? {
            if namespace.is_none() {
                return Err(LaunchError::missing_attribute("include", "ns"));
            }
            Some(RosparamCommand {
                op: RosparamOp::Delete,
                namespace: inner.namespace().to_string(),
                file: None,
                text: None,
                location: element.location().clone(),
            })
        } else {
            None
        };

        Ok(IncludeTarget {
            file,
            scope: inner,
            pass_all_args: resolve_bool(&self.pass_all_args, "pass_all_args", false, scope, context)?,
            clear_params,
        })
    }
}

/// `<arg>` child of an include: a value passed into the included file
#[derive(Debug, Clone)]
pub struct IncludeArg {
    pub name: Vec<Substitution>,
    pub value: Option<Vec<Substitution>>,
    pub default: Option<Vec<Substitution>>,
}

impl IncludeArg {
    pub fn from_element(element: &Element) -> Result<Self> {
        let arg = Self {
            name: required_subs(element, "name")?,
            value: optional_subs(element, "value")?,
            default: optional_subs(element, "default")?,
        };
        if arg.value.is_none() && arg.default.is_none() {
            return Err(LaunchError::missing_attribute("arg", "value"));
        }
        Ok(arg)
    }

    /// Resolve in the including scope. A `default` only applies when
    /// `pass_all_args` has not already supplied the argument, in which case
    /// the value is `None`.
    pub fn resolve(
        &self,
        scope: &Scope,
        context: &SubstitutionContext,
        already_passed: impl Fn(&str) -> bool,
    ) -> Result<(String, Option<String>)> {
        let name = resolve(&self.name, scope, context)?;
        let value = match (&self.value, &self.default) {
            (Some(value), _) => resolve(value, scope, context)?,
            (None, Some(_)) if already_passed(&name) => return Ok((name, None)),
            (None, Some(default)) => resolve(default, scope, context)?,
            (None, None) => return Err(LaunchError::missing_attribute("arg", "value")),
        };
        Ok((name, Some(value)))
    }
}
