//! Rosparam action implementation

use super::{optional_subs, resolve, resolve_bool, resolve_opt};
use crate::{
    error::{LaunchError, Result},
    model::{ParamSpec, ParamValue, RosparamCommand, RosparamOp},
    params::{parse_yaml, unfold},
    scope::{check_graph_name, join_name, Scope},
    substitution::{self, Substitution, SubstitutionContext},
    system::FileAccess,
    xml::Element,
};

/// `<rosparam>`: load, dump or delete parameters
#[derive(Debug, Clone)]
pub struct RosparamAction {
    pub command: Option<Vec<Substitution>>,
    pub file: Option<Vec<Substitution>>,
    pub param: Option<Vec<Substitution>>,
    pub namespace: Option<Vec<Substitution>>,
    pub subst_value: Option<Vec<Substitution>>,
    /// Inline YAML, substituted only when `subst_value` is true
    pub text: Option<String>,
}

impl RosparamAction {
    pub fn from_element(element: &Element) -> Result<Self> {
        Ok(Self {
            command: optional_subs(element, "command")?,
            file: optional_subs(element, "file")?,
            param: optional_subs(element, "param")?,
            namespace: optional_subs(element, "ns")?,
            subst_value: optional_subs(element, "subst_value")?,
            text: element
                .text()
                .filter(|text| !text.trim().is_empty())
                .map(str::to_string),
        })
    }

    /// Resolve the command; an inline `load` also yields the parameters it sets
    pub fn resolve(
        &self,
        element: &Element,
        scope: &Scope,
        context: &SubstitutionContext,
        files: &dyn FileAccess,
    ) -> Result<(RosparamCommand, Vec<ParamSpec>)> {
        let op = match resolve_opt(&self.command, scope, context)? {
            None => RosparamOp::Load,
            Some(raw) => match raw.trim() {
                "load" => RosparamOp::Load,
                "dump" => RosparamOp::Dump,
                "delete" => RosparamOp::Delete,
                _ => {
                    return Err(LaunchError::invalid_value(
                        "command",
                        raw,
                        "expected load, dump or delete",
                    ))
                }
            },
        };

        let base = match resolve_opt(&self.namespace, scope, context)? {
            Some(ns) => {
                check_graph_name(&ns, true)?;
                scope.resolve_param_name(&ns)
            }
            None => scope.param_namespace().to_string(),
        };
        let param = resolve_opt(&self.param, scope, context)?;
        if let Some(param) = &param {
            check_graph_name(param, false)?;
        }
        let target = match &param {
            Some(param) if param.starts_with('/') || param.starts_with('~') => {
                scope.resolve_name(param)
            }
            Some(param) => join_name(&base, param),
            None => base,
        };

        let file = match &self.file {
            Some(subs) => {
                let reference = resolve(subs, scope, context)?;
                let path = files.resolve_path(&reference, scope.current_dir().as_deref())?;
                Some(path.to_string_lossy().into_owned())
            }
            None => None,
        };

        let mut command = RosparamCommand {
            op,
            namespace: target.clone(),
            file,
            text: None,
            location: element.location().clone(),
        };

        match op {
            RosparamOp::Dump if command.file.is_none() => {
                Err(LaunchError::missing_attribute("rosparam", "file"))
            }
            RosparamOp::Delete if param.is_none() => {
                Err(LaunchError::missing_attribute("rosparam", "param"))
            }
            RosparamOp::Delete if command.file.is_some() => Err(LaunchError::invalid_value(
                "file",
                command.file.clone().unwrap_or_default(),
                "rosparam delete does not take a file",
            )),
            RosparamOp::Load if command.file.is_none() => {
                let Some(raw) = &self.text else {
                    return Err(LaunchError::missing_attribute("rosparam", "file"));
                };
                let text = if resolve_bool(&self.subst_value, "subst_value", false, scope, context)? {
                    substitution::evaluate(raw, scope, context)?
                } else {
                    raw.clone()
                };
                let params = inline_params(&target, param.is_some(), &text, element)?;
                command.text = Some(text);
                Ok((command, params))
            }
            _ => Ok((command, Vec::new())),
        }
    }
}

fn inline_params(
    target: &str,
    has_param: bool,
    text: &str,
    element: &Element,
) -> Result<Vec<ParamSpec>> {
    let value = parse_yaml(text)?;
    if !has_param && !matches!(value, ParamValue::Map(_)) {
        return Err(LaunchError::invalid_value(
            "param",
            text.trim(),
            "loading a non-mapping value needs a 'param' name",
        ));
    }
    let leaves = match value {
        ParamValue::Map(map) if map.is_empty() => Vec::new(),
        value => unfold(target, value),
    };
    Ok(leaves
        .into_iter()
        .map(|(name, value)| ParamSpec {
            name,
            value,
            location: element.location().clone(),
        })
        .collect())
}
