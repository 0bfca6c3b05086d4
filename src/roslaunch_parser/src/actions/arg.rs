//! Arg action implementation

use super::{optional_subs, required_subs, resolve, resolve_opt};
use crate::{
    error::{LaunchError, Result, ResultExt},
    scope::{ArgBinding, ArgOrigin, Scope},
    substitution::{Substitution, SubstitutionContext},
    xml::Element,
};

/// `<arg>` declaration
#[derive(Debug, Clone)]
pub struct ArgAction {
    pub name: Vec<Substitution>,
    pub value: Option<Vec<Substitution>>,
    pub default: Option<Vec<Substitution>>,
    pub doc: Option<Vec<Substitution>>,
}

impl ArgAction {
    pub fn from_element(element: &Element) -> Result<Self> {
        let value = optional_subs(element, "value")?;
        let default = optional_subs(element, "default")?;
        if value.is_some() && default.is_some() {
            return Err(LaunchError::invalid_value(
                "value",
                element.get_attr_str("value").unwrap_or_default(),
                "<arg> may have 'value' or 'default', not both",
            )
            .at(element.location()));
        }
        Ok(Self {
            name: required_subs(element, "name")?,
            value,
            default,
            doc: optional_subs(element, "doc")?,
        })
    }

    /// Bind the argument, returning the scope seen by following siblings.
    ///
    /// An override already present in the scope (command line or include
    /// pass-through) wins over `default`.
    pub fn apply(&self, scope: &Scope, context: &SubstitutionContext) -> Result<Scope> {
        let name = resolve(&self.name, scope, context)?;
        let binding = match (&self.value, &self.default) {
            (Some(value), _) => ArgBinding::new(Some(resolve(value, scope, context)?), ArgOrigin::Value),
            (None, Some(default)) => {
                // An overridden default is never used, so it is not resolved either
                if scope.arg(&name).is_some_and(|b| b.origin == ArgOrigin::Override) {
                    ArgBinding::new(None, ArgOrigin::Default)
                } else {
                    ArgBinding::new(Some(resolve(default, scope, context)?), ArgOrigin::Default)
                }
            }
            (None, None) => ArgBinding::new(None, ArgOrigin::Declared),
        };
        let doc = resolve_opt(&self.doc, scope, context)?;
        log::trace!("Declaring arg '{}' = {:?}", name, binding.value);
        scope.bind(&name, binding.with_doc(doc))
    }
}
