//! Parameter typing and YAML conversion

use crate::{
    condition::parse_bool,
    error::{ErrorKind, LaunchError, Result},
    model::ParamValue,
    scope::join_name,
};
use indexmap::IndexMap;
use serde_yaml::Value;

/// `type` attribute of `<param>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Auto,
    Str,
    Int,
    Double,
    Bool,
    Yaml,
}

impl ParamType {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim() {
            "" | "auto" => Ok(ParamType::Auto),
            "str" | "string" => Ok(ParamType::Str),
            "int" => Ok(ParamType::Int),
            "double" => Ok(ParamType::Double),
            "bool" | "boolean" => Ok(ParamType::Bool),
            "yaml" => Ok(ParamType::Yaml),
            other => Err(LaunchError::invalid_value(
                "type",
                other,
                "expected one of auto, str, string, int, double, bool, yaml",
            )),
        }
    }
}

/// Convert a resolved attribute string to a typed value
pub fn coerce_value(raw: &str, ty: ParamType) -> Result<ParamValue> {
    match ty {
        ParamType::Auto => Ok(auto_value(raw)),
        ParamType::Str => Ok(ParamValue::Str(raw.to_string())),
        ParamType::Int => raw
            .trim()
            .parse::<i64>()
            .map(ParamValue::Int)
            .map_err(|_| LaunchError::invalid_value("value", raw, "not an int")),
        ParamType::Double => raw
            .trim()
            .parse::<f64>()
            .map(ParamValue::Float)
            .map_err(|_| LaunchError::invalid_value("value", raw, "not a double")),
        ParamType::Bool => parse_bool("value", raw).map(ParamValue::Bool),
        ParamType::Yaml => parse_yaml(raw),
    }
}

/// Auto typing: float when it has a `.`, else int, else bool, else string
pub fn auto_value(raw: &str) -> ParamValue {
    let trimmed = raw.trim();
    if trimmed.contains('.') {
        if let Ok(f) = trimmed.parse::<f64>() {
            return ParamValue::Float(f);
        }
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return ParamValue::Int(n);
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "true" => ParamValue::Bool(true),
        "false" => ParamValue::Bool(false),
        _ => ParamValue::Str(raw.to_string()),
    }
}

pub fn parse_yaml(text: &str) -> Result<ParamValue> {
    let value: Value =
        serde_yaml::from_str(text).map_err(|e| ErrorKind::InvalidYaml(e.to_string()))?;
    yaml_to_param_value(value)
}

pub fn yaml_to_param_value(value: Value) -> Result<ParamValue> {
    Ok(match value {
        Value::Null => {
            return Err(ErrorKind::InvalidYaml("parameters cannot be null".to_string()).into())
        }
        Value::Bool(b) => ParamValue::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => ParamValue::Int(i),
            None => ParamValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => ParamValue::Str(s),
        Value::Sequence(items) => ParamValue::List(
            items
                .into_iter()
                .map(yaml_to_param_value)
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::Mapping(map) => {
            let mut entries = IndexMap::new();
            for (key, value) in map {
                entries.insert(yaml_key(&key)?, yaml_to_param_value(value)?);
            }
            ParamValue::Map(entries)
        }
        Value::Tagged(tagged) => yaml_to_param_value(tagged.value)?,
    })
}

fn yaml_key(key: &Value) -> Result<String> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(ErrorKind::InvalidYaml(format!("unsupported mapping key {:?}", other)).into()),
    }
}

/// Split a mapping into one `(name, value)` per leaf under `name`.
/// Empty mappings and non-mapping values stay whole.
pub fn unfold(name: &str, value: ParamValue) -> Vec<(String, ParamValue)> {
    let mut leaves = Vec::new();
    unfold_into(name, value, &mut leaves);
    leaves
}

fn unfold_into(name: &str, value: ParamValue, leaves: &mut Vec<(String, ParamValue)>) {
    match value {
        ParamValue::Map(map) if !map.is_empty() => {
            for (key, child) in map {
                unfold_into(&join_name(name, &key), child, leaves);
            }
        }
        other => leaves.push((name.to_string(), other)),
    }
}
