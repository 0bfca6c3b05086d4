//! Group action implementation

use super::{optional_subs, resolve_bool, resolve_opt};
use crate::{
    error::{LaunchError, Result},
    model::{RosparamCommand, RosparamOp},
    scope::{check_graph_name, Scope},
    substitution::{Substitution, SubstitutionContext},
    xml::Element,
};

/// Group action for scoping namespaces and parameters
#[derive(Debug, Clone)]
pub struct GroupAction {
    pub namespace: Option<Vec<Substitution>>,
    pub clear_params: Option<Vec<Substitution>>,
}

impl GroupAction {
    pub fn from_element(element: &Element) -> Result<Self> {
        Ok(Self {
            namespace: optional_subs(element, "ns")?,
            clear_params: optional_subs(element, "clear_params")?,
        })
    }

    /// Scope for the group's children, plus the parameter clear it requests
    pub fn enter(
        &self,
        element: &Element,
        scope: &Scope,
        context: &SubstitutionContext,
    ) -> Result<(Scope, Option<RosparamCommand>)> {
        let namespace = resolve_opt(&self.namespace, scope, context)?;
        let inner = match &namespace {
            Some(ns) => {
                check_graph_name(ns, true)?;
                scope.push_namespace(ns)
            }
            None => scope.clone(),
        };

        let clear = resolve_bool(&self.clear_params, "clear_params", false, scope, context)?;
        if !clear {
            return Ok((inner, None));
        }
        if namespace.is_none() {
            return Err(LaunchError::missing_attribute("group", "ns"));
        }
        let command = RosparamCommand {
            op: RosparamOp::Delete,
            namespace: inner.namespace().to_string(),
            file: None,
            text: None,
            location: element.location().clone(),
        };
        Ok((inner, Some(command)))
    }
}
