//! Param action implementation

use super::{optional_subs, required_subs, resolve, resolve_opt};
use crate::{
    error::{LaunchError, Result},
    model::{ParamSpec, ParamValue},
    params::{coerce_value, unfold, ParamType},
    scope::{check_graph_name, Scope},
    substitution::{Substitution, SubstitutionContext},
    system::FileAccess,
    xml::Element,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ParamSource {
    Value(Vec<Substitution>),
    TextFile(Vec<Substitution>),
    BinFile(Vec<Substitution>),
    Command(Vec<Substitution>),
}

/// `<param>`
#[derive(Debug, Clone)]
pub struct ParamAction {
    pub name: Vec<Substitution>,
    pub source: ParamSource,
    pub param_type: Option<Vec<Substitution>>,
}

impl ParamAction {
    pub fn from_element(element: &Element) -> Result<Self> {
        let sources: Vec<&str> = ["value", "textfile", "binfile", "command"]
            .into_iter()
            .filter(|attr| element.has_attr(attr))
            .collect();
        let source = match sources.as_slice() {
            [attr] => {
                let subs = required_subs(element, attr)?;
                match *attr {
                    "value" => ParamSource::Value(subs),
                    "textfile" => ParamSource::TextFile(subs),
                    "binfile" => ParamSource::BinFile(subs),
                    _ => ParamSource::Command(subs),
                }
            }
            [] => return Err(LaunchError::missing_attribute("param", "value")),
            _ => {
                return Err(LaunchError::invalid_value(
                    &sources.join("|"),
                    "",
                    "<param> takes exactly one of value, textfile, binfile, command",
                ))
            }
        };
        Ok(Self {
            name: required_subs(element, "name")?,
            source,
            param_type: optional_subs(element, "type")?,
        })
    }

    /// Resolve into parameter specs; yaml mappings unfold into one spec per leaf
    pub fn resolve(
        &self,
        element: &Element,
        scope: &Scope,
        context: &SubstitutionContext,
        files: &dyn FileAccess,
    ) -> Result<Vec<ParamSpec>> {
        let raw_name = resolve(&self.name, scope, context)?;
        check_graph_name(&raw_name, false)?;
        let name = scope.resolve_param_name(&raw_name);
        let param_type = match resolve_opt(&self.param_type, scope, context)? {
            Some(ty) => ParamType::parse(&ty)?,
            None => ParamType::Auto,
        };

        let value = match &self.source {
            ParamSource::Value(subs) => coerce_value(&resolve(subs, scope, context)?, param_type)?,
            ParamSource::TextFile(subs) => {
                let path = files.resolve_path(&resolve(subs, scope, context)?, scope.current_dir().as_deref())?;
                ParamValue::Str(files.read(&path)?)
            }
            ParamSource::BinFile(subs) => {
                let path = files.resolve_path(&resolve(subs, scope, context)?, scope.current_dir().as_deref())?;
                ParamValue::Binary(files.read_binary(&path)?)
            }
            ParamSource::Command(subs) => ParamValue::Command(resolve(subs, scope, context)?),
        };

        Ok(unfold(&name, value)
            .into_iter()
            .map(|(name, value)| ParamSpec {
                name,
                value,
                location: element.location().clone(),
            })
            .collect())
    }
}
