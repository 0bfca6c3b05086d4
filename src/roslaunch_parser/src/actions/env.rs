//! Environment variable action

use super::{required_subs, resolve};
use crate::{
    error::Result,
    scope::Scope,
    substitution::{Substitution, SubstitutionContext},
    xml::Element,
};

/// `<env name=".." value=".."/>`, recorded on nodes, never applied
#[derive(Debug, Clone, PartialEq)]
pub struct EnvAction {
    pub name: Vec<Substitution>,
    pub value: Vec<Substitution>,
}

impl EnvAction {
    pub fn from_element(element: &Element) -> Result<Self> {
        Ok(Self {
            name: required_subs(element, "name")?,
            value: required_subs(element, "value")?,
        })
    }

    pub fn resolve(&self, scope: &Scope, context: &SubstitutionContext) -> Result<(String, String)> {
        Ok((
            resolve(&self.name, scope, context)?,
            resolve(&self.value, scope, context)?,
        ))
    }

    pub fn apply(&self, scope: &Scope, context: &SubstitutionContext) -> Result<Scope> {
        let (name, value) = self.resolve(scope, context)?;
        Ok(scope.set_env(&name, &value))
    }
}
