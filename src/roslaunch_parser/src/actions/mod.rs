//! Element interpreters, one per launch tag
//!
//! Each action is parsed from an [`Element`] with its attribute values split
//! into substitutions up front; resolution against a [`Scope`] happens when
//! the traverser applies it.

pub mod arg;
pub mod env;
pub mod group;
pub mod include;
pub mod machine;
pub mod node;
pub mod param;
pub mod remap;
pub mod rosparam;

pub use arg::ArgAction;
pub use env::EnvAction;
pub use group::GroupAction;
pub use include::{IncludeAction, IncludeArg, IncludeTarget};
pub use machine::MachineAction;
pub use node::{NodeAction, NodeTarget};
pub use param::ParamAction;
pub use remap::RemapAction;
pub use rosparam::RosparamAction;

use crate::{
    condition::parse_bool,
    error::{Result, ResultExt},
    scope::Scope,
    substitution::{parse_substitutions, resolve_substitutions, Substitution, SubstitutionContext},
    xml::Element,
};

pub(crate) fn required_subs(element: &Element, attribute: &str) -> Result<Vec<Substitution>> {
    let raw = element.required_attr(attribute)?;
    parse_substitutions(raw).at(element.location())
}

pub(crate) fn optional_subs(
    element: &Element,
    attribute: &str,
) -> Result<Option<Vec<Substitution>>> {
    element
        .get_attr_str(attribute)
        .map(|raw| parse_substitutions(raw).at(element.location()))
        .transpose()
}

pub(crate) fn resolve(
    subs: &[Substitution],
    scope: &Scope,
    context: &SubstitutionContext,
) -> Result<String> {
    Ok(resolve_substitutions(subs, scope, context)?)
}

pub(crate) fn resolve_opt(
    subs: &Option<Vec<Substitution>>,
    scope: &Scope,
    context: &SubstitutionContext,
) -> Result<Option<String>> {
    subs.as_deref()
        .map(|subs| resolve(subs, scope, context))
        .transpose()
}

pub(crate) fn resolve_bool(
    subs: &Option<Vec<Substitution>>,
    attribute: &str,
    default: bool,
    scope: &Scope,
    context: &SubstitutionContext,
) -> Result<bool> {
    match resolve_opt(subs, scope, context)? {
        Some(value) => parse_bool(attribute, &value),
        None => Ok(default),
    }
}
