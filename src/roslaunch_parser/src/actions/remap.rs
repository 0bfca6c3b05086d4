//! Topic remapping action

use super::{required_subs, resolve};
use crate::{
    error::Result,
    scope::{check_graph_name, Scope},
    substitution::{Substitution, SubstitutionContext},
    xml::Element,
};

/// `<remap from=".." to=".."/>`
///
/// Applies to every node declared later in the same scope and its descendants.
#[derive(Debug, Clone, PartialEq)]
pub struct RemapAction {
    pub from: Vec<Substitution>,
    pub to: Vec<Substitution>,
}

impl RemapAction {
    pub fn from_element(element: &Element) -> Result<Self> {
        Ok(Self {
            from: required_subs(element, "from")?,
            to: required_subs(element, "to")?,
        })
    }

    pub fn apply(&self, scope: &Scope, context: &SubstitutionContext) -> Result<Scope> {
        let from = resolve(&self.from, scope, context)?;
        let to = resolve(&self.to, scope, context)?;
        check_graph_name(&from, false)?;
        check_graph_name(&to, false)?;
        Ok(scope.add_remap(&from, &to))
    }
}
