//! Condition evaluation for if/unless attributes

use crate::{
    error::{ErrorKind, LaunchError, Result, ResultExt},
    scope::Scope,
    substitution::{self, SubstitutionContext},
    xml::Element,
};

/// Evaluate whether an element should be processed based on if/unless conditions
pub fn should_process_element(
    element: &Element,
    scope: &Scope,
    context: &SubstitutionContext,
) -> Result<bool> {
    let (attribute, negate) = match (element.get_attr_str("if"), element.get_attr_str("unless")) {
        (Some(_), Some(_)) => {
            return Err(LaunchError::from(ErrorKind::ConflictingCondition(
                element.type_name().to_string(),
            ))
            .at(element.location()))
        }
        (Some(expr), None) => (("if", expr), false),
        (None, Some(expr)) => (("unless", expr), true),
        (None, None) => return Ok(true),
    };

    let (name, expr) = attribute;
    let resolved = substitution::evaluate(expr, scope, context).at(element.location())?;
    let value = parse_bool(name, &resolved).at(element.location())?;
    Ok(value != negate)
}

/// Strict launch boolean: `true`/`1` or `false`/`0`, case-insensitive
pub fn parse_bool(attribute: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ErrorKind::MalformedBoolean {
            attribute: attribute.to_string(),
            value: value.to_string(),
        }
        .into()),
    }
}
