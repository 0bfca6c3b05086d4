//! Substitution parser

use crate::{error::SubstitutionError, substitution::types::Substitution};
use lru::LruCache;
use std::{cell::RefCell, num::NonZeroUsize};

// Caches parsed sequences, never resolved values: parsing does not depend on
// the scope, resolution does.
const SUBSTITUTION_CACHE_SIZE: NonZeroUsize = match NonZeroUsize::new(1024) {
    Some(size) => size,
    None => panic!("cache size must be non-zero"),
};

thread_local! {
    static PARSE_CACHE: RefCell<LruCache<String, Vec<Substitution>>> =
        RefCell::new(LruCache::new(SUBSTITUTION_CACHE_SIZE));
}

/// Parse a value like `"text $(arg x) more"` into literal and directive segments.
///
/// Directives may only nest inside `$(eval ...)`. `$$` is a literal `$`.
pub fn parse_substitutions(input: &str) -> Result<Vec<Substitution>, SubstitutionError> {
    let cached = PARSE_CACHE.with(|cache| cache.borrow_mut().get(input).cloned());
    if let Some(cached) = cached {
        log::trace!("Substitution parse cache hit: {}", input);
        return Ok(cached);
    }

    log::trace!("Substitution parse cache miss: {}", input);
    let result = parse_sequence(input, input, false)?;
    PARSE_CACHE.with(|cache| {
        cache.borrow_mut().put(input.to_string(), result.clone());
    });
    Ok(result)
}

/// Parse `text`, reporting errors against the full attribute value `whole`.
///
/// Inside an eval body parentheses and quotes belong to the expression, so
/// bare `)` is left for the expression parser to judge.
fn parse_sequence(
    whole: &str,
    text: &str,
    in_eval: bool,
) -> Result<Vec<Substitution>, SubstitutionError> {
    let bytes = text.as_bytes();
    let mut result = Vec::new();
    let mut literal = String::new();
    let mut literal_depth = 0usize;
    let mut segment_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'$' if bytes.get(i + 1) == Some(&b'$') => {
                literal.push_str(&text[segment_start..i]);
                literal.push('$');
                i += 2;
                segment_start = i;
            }
            b'$' if bytes.get(i + 1) == Some(&b'(') => {
                literal.push_str(&text[segment_start..i]);
                if !literal.is_empty() {
                    result.push(Substitution::Text(std::mem::take(&mut literal)));
                }
                let (substitution, end) = parse_directive(whole, text, i + 2)?;
                result.push(substitution);
                i = end;
                segment_start = i;
            }
            b'(' if !in_eval => {
                literal_depth += 1;
                i += 1;
            }
            b')' if !in_eval => {
                if literal_depth == 0 {
                    return Err(SubstitutionError::syntax(whole, "unmatched ')'"));
                }
                literal_depth -= 1;
                i += 1;
            }
            _ => i += 1,
        }
    }

    literal.push_str(&text[segment_start..]);
    if !literal.is_empty() || result.is_empty() {
        result.push(Substitution::Text(literal));
    }
    Ok(result)
}

/// Parse the directive whose body starts at `start` (just past `$(`).
/// Returns the directive and the offset just past its closing `)`.
fn parse_directive(
    whole: &str,
    text: &str,
    start: usize,
) -> Result<(Substitution, usize), SubstitutionError> {
    let rest = &text[start..];
    let body = rest.trim_start();
    let kind_len = body
        .find(|c: char| c.is_whitespace() || c == ')')
        .unwrap_or(body.len());

    if &body[..kind_len] == "eval" {
        let expr_start = start + (rest.len() - body.len()) + kind_len;
        let end = find_eval_close(text, expr_start)
            .ok_or_else(|| SubstitutionError::syntax(whole, "unclosed '$(eval'"))?;
        let expression = text[expr_start..end].trim();
        if expression.is_empty() {
            return Err(SubstitutionError::syntax(whole, "$(eval) requires an expression"));
        }
        let parts = parse_sequence(whole, expression, true)?;
        return Ok((Substitution::Eval(parts), end + 1));
    }

    let close = rest
        .find(')')
        .ok_or_else(|| SubstitutionError::syntax(whole, "unclosed '$('"))?;
    let content = &rest[..close];
    if content.contains("$(") {
        return Err(SubstitutionError::syntax(
            whole,
            "substitutions may only be nested inside $(eval ...)",
        ));
    }
    Ok((parse_simple(whole, content)?, start + close + 1))
}

/// Offset of the `)` closing an eval body, skipping quoted strings and
/// balanced parentheses (nested directives included)
fn find_eval_close(text: &str, from: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut quote: Option<u8> = None;
    for (offset, &byte) in text.as_bytes()[from..].iter().enumerate() {
        match (quote, byte) {
            (Some(q), b) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'\'' | b'"') => quote = Some(byte),
            (None, b'(') => depth += 1,
            (None, b')') => {
                depth -= 1;
                if depth == 0 {
                    return Some(from + offset);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_simple(whole: &str, content: &str) -> Result<Substitution, SubstitutionError> {
    let mut tokens = content.split_whitespace();
    let kind = tokens
        .next()
        .ok_or_else(|| SubstitutionError::syntax(whole, "empty substitution '$()'"))?;
    let args: Vec<&str> = tokens.collect();

    let single = |args: &[&str]| -> Result<String, SubstitutionError> {
        match args {
            [arg] => Ok(arg.to_string()),
            _ => Err(SubstitutionError::syntax(
                whole,
                format!("$({}) takes exactly one argument, got {}", kind, args.len()),
            )),
        }
    };

    match kind {
        "arg" => Ok(Substitution::Arg(single(&args)?)),
        "env" => Ok(Substitution::Env(single(&args)?)),
        "find" => Ok(Substitution::Find(single(&args)?)),
        "anon" => Ok(Substitution::Anon(single(&args)?)),
        "optenv" => {
            let name = args.first().ok_or_else(|| {
                SubstitutionError::syntax(whole, "$(optenv) requires a variable name")
            })?;
            // The default keeps its inner whitespace: $(optenv HOST local host)
            let default = content
                .trim_start()
                .strip_prefix(kind)
                .map(str::trim_start)
                .and_then(|s| s.strip_prefix(name))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);
            Ok(Substitution::OptEnv {
                name: name.to_string(),
                default,
            })
        }
        "dirname" if args.is_empty() => Ok(Substitution::Dirname),
        "dirname" => Err(SubstitutionError::syntax(whole, "$(dirname) takes no arguments")),
        other => Err(SubstitutionError::syntax(
            whole,
            format!("unknown substitution '{}'", other),
        )),
    }
}
