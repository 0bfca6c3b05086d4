//! Substitution module

pub mod context;
pub mod eval;
pub mod parser;
pub mod types;

pub use context::SubstitutionContext;
pub use parser::parse_substitutions;
pub use types::{resolve_substitutions, Substitution};

use crate::{error::SubstitutionError, scope::Scope};

/// Parse and resolve an attribute value in one step
pub fn evaluate(
    text: &str,
    scope: &Scope,
    context: &SubstitutionContext,
) -> Result<String, SubstitutionError> {
    let subs = parse_substitutions(text)?;
    resolve_substitutions(&subs, scope, context)
}
