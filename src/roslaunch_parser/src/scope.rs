//! Hierarchical interpretation scope
//!
//! A [`Scope`] is cheap to clone: every field is reference counted and only
//! copied when a derived scope actually changes it. Deriving a child never
//! affects the parent or its siblings. The [`AnonRegistry`] is the one
//! exception, being shared by every scope of a run.

use crate::error::{ErrorKind, LaunchError, Result};
use indexmap::IndexMap;
use serde::Serialize;
use std::{
    cell::RefCell,
    collections::HashMap,
    path::{Path, PathBuf},
    rc::Rc,
};

/// Machine name used when no machine is assigned
pub const LOCAL_MACHINE: &str = "local";

/// Where an argument's value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgOrigin {
    /// Supplied from outside the file: command line or include pass-through
    Override,
    /// `default` attribute
    Default,
    /// `value` attribute
    Value,
    /// Declared without a value
    Declared,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArgBinding {
    pub value: Option<String>,
    pub origin: ArgOrigin,
    pub doc: Option<String>,
}

impl ArgBinding {
    pub fn new(value: Option<String>, origin: ArgOrigin) -> Self {
        Self {
            value,
            origin,
            doc: None,
        }
    }

    pub fn with_doc(mut self, doc: Option<String>) -> Self {
        self.doc = doc;
        self
    }
}

/// Run-wide `$(anon)` name table, shared by handle
#[derive(Debug, Clone, Default)]
pub struct AnonRegistry(Rc<RefCell<HashMap<String, String>>>);

impl AnonRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name recorded for `seed`, generating it on first use
    pub fn resolve(&self, seed: &str) -> String {
        if let Some(name) = self.0.borrow().get(seed) {
            return name.clone();
        }
        let mut names = self.0.borrow_mut();
        let name = loop {
            let candidate = anonymous_name(seed);
            if !names.values().any(|existing| *existing == candidate) {
                break candidate;
            }
        };
        log::debug!("Anonymous name for '{}': {}", seed, name);
        names.insert(seed.to_string(), name.clone());
        name
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn shares_with(&self, other: &AnonRegistry) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

fn anonymous_name(seed: &str) -> String {
    let unique = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}_{}", seed, std::process::id(), &unique[..16])
        .replace(['.', '-', ':'], "_")
}

#[derive(Debug, Clone)]
pub struct Scope {
    namespace: Rc<str>,
    private_namespace: Option<Rc<str>>,
    args: Rc<IndexMap<String, ArgBinding>>,
    remaps: Rc<Vec<(String, String)>>,
    env_overrides: Rc<IndexMap<String, String>>,
    condition: Option<bool>,
    machine: Rc<str>,
    current_file: Option<Rc<Path>>,
    anon_registry: AnonRegistry,
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope {
    /// Root scope with a fresh anonymous-name registry
    pub fn new() -> Self {
        Self::with_anon_registry(AnonRegistry::new())
    }

    pub fn with_anon_registry(anon_registry: AnonRegistry) -> Self {
        Self {
            namespace: Rc::from("/"),
            private_namespace: None,
            args: Rc::default(),
            remaps: Rc::default(),
            env_overrides: Rc::default(),
            condition: None,
            machine: Rc::from(LOCAL_MACHINE),
            current_file: None,
            anon_registry,
        }
    }

    /// Top scope of an included file: namespace, condition, file and the
    /// anonymous-name registry carry over, everything else starts empty
    pub fn for_include(&self, file: &Path) -> Self {
        Self {
            namespace: self.namespace.clone(),
            condition: self.condition,
            ..Self::with_anon_registry(self.anon_registry.clone())
        }
        .with_current_file(file)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn push_namespace(&self, name: &str) -> Self {
        let namespace = self.resolve_name(name);
        Self {
            namespace: Rc::from(namespace),
            ..self.clone()
        }
    }

    /// Scope inside a node: `~name` resolves under the node's full name
    pub fn enter_node(&self, node_fullname: &str) -> Self {
        Self {
            private_namespace: Some(Rc::from(node_fullname)),
            ..self.clone()
        }
    }

    pub fn arg(&self, name: &str) -> Option<&ArgBinding> {
        self.args.get(name)
    }

    pub fn args(&self) -> &IndexMap<String, ArgBinding> {
        &self.args
    }

    pub fn bind_arg(&self, name: &str, value: Option<String>, origin: ArgOrigin) -> Result<Self> {
        self.bind(name, ArgBinding::new(value, origin))
    }

    /// Bind an argument.
    ///
    /// Overrides always take the slot. A declaration meeting an override keeps
    /// the override, unless it is a `value` disagreeing with it. Any other
    /// redeclaration must agree with the existing value.
    pub fn bind(&self, name: &str, binding: ArgBinding) -> Result<Self> {
        let existing = match self.args.get(name) {
            None => return Ok(self.with_binding(name, binding)),
            Some(existing) => existing,
        };

        if binding.origin == ArgOrigin::Override {
            return Ok(self.with_binding(name, binding));
        }

        let agrees = existing.value == binding.value;
        if existing.origin == ArgOrigin::Override {
            if binding.origin == ArgOrigin::Value && !agrees {
                return Err(arg_conflict(name, existing, &binding));
            }
            if binding.doc.is_some() && existing.doc.is_none() {
                let mut kept = existing.clone();
                kept.doc = binding.doc;
                return Ok(self.with_binding(name, kept));
            }
            return Ok(self.clone());
        }

        if agrees {
            Ok(self.clone())
        } else {
            Err(arg_conflict(name, existing, &binding))
        }
    }

    fn with_binding(&self, name: &str, binding: ArgBinding) -> Self {
        let mut scope = self.clone();
        Rc::make_mut(&mut scope.args).insert(name.to_string(), binding);
        scope
    }

    /// Add a remapping, resolving both sides against the current namespace
    pub fn add_remap(&self, from: &str, to: &str) -> Self {
        let mut scope = self.clone();
        let pair = (self.resolve_name(from), self.resolve_name(to));
        let remaps = Rc::make_mut(&mut scope.remaps);
        // A later remapping of the same source replaces the earlier one
        remaps.retain(|(existing, _)| *existing != pair.0);
        remaps.push(pair);
        scope
    }

    pub fn remaps(&self) -> &[(String, String)] {
        &self.remaps
    }

    pub fn set_env(&self, name: &str, value: &str) -> Self {
        let mut scope = self.clone();
        Rc::make_mut(&mut scope.env_overrides).insert(name.to_string(), value.to_string());
        scope
    }

    pub fn env_overrides(&self) -> &IndexMap<String, String> {
        &self.env_overrides
    }

    pub fn set_condition(&self, condition: bool) -> Self {
        Self {
            condition: Some(condition),
            ..self.clone()
        }
    }

    pub fn condition(&self) -> Option<bool> {
        self.condition
    }

    pub fn set_machine(&self, name: &str) -> Self {
        Self {
            machine: Rc::from(name),
            ..self.clone()
        }
    }

    pub fn machine(&self) -> &str {
        &self.machine
    }

    pub fn with_current_file(&self, file: &Path) -> Self {
        Self {
            current_file: Some(Rc::from(file)),
            ..self.clone()
        }
    }

    pub fn current_file(&self) -> Option<&Path> {
        self.current_file.as_deref()
    }

    pub fn current_dir(&self) -> Option<PathBuf> {
        self.current_file()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
    }

    pub fn anon_registry(&self) -> &AnonRegistry {
        &self.anon_registry
    }

    pub fn anon(&self, seed: &str) -> String {
        self.anon_registry.resolve(seed)
    }

    /// Resolve a graph name against this scope.
    ///
    /// Empty names resolve to the namespace itself, `/x` is absolute, `~x` is
    /// private to the enclosing node (the namespace outside of nodes) and
    /// anything else is relative.
    pub fn resolve_name(&self, name: &str) -> String {
        let name = name.trim();
        if let Some(absolute) = name.strip_prefix('/') {
            return normalize_name(absolute);
        }
        if let Some(private) = name.strip_prefix('~') {
            return join_name(self.param_namespace(), private);
        }
        join_name(&self.namespace, name)
    }

    /// Namespace that relative parameter names land in: the node's private
    /// namespace inside a node, the current namespace elsewhere
    pub fn param_namespace(&self) -> &str {
        self.private_namespace.as_deref().unwrap_or(&self.namespace)
    }

    /// Resolve a parameter name; relative names go under [`Scope::param_namespace`]
    pub fn resolve_param_name(&self, name: &str) -> String {
        let name = name.trim();
        if name.starts_with('/') || name.starts_with('~') {
            return self.resolve_name(name);
        }
        join_name(self.param_namespace(), name)
    }
}

fn arg_conflict(name: &str, existing: &ArgBinding, requested: &ArgBinding) -> LaunchError {
    let show = |value: &Option<String>| value.clone().unwrap_or_else(|| "<unset>".to_string());
    ErrorKind::ArgConflict {
        name: name.to_string(),
        existing: show(&existing.value),
        requested: show(&requested.value),
    }
    .into()
}

/// Validate a graph name as written in a launch file.
///
/// The first segment may carry a `~` and an empty first segment makes the
/// name absolute. Every other segment must be an identifier as in
/// [`check_base_name`]. `allow_empty` admits `""` and a trailing `/`, as namespaces do.
pub fn check_graph_name(name: &str, allow_empty: bool) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return if allow_empty {
            Ok(())
        } else {
            Err(invalid_name(name, "name is empty"))
        };
    }

    let mut segments = name.split('/');
    let first = segments.next().unwrap_or_default();
    let first = first.strip_prefix('~').unwrap_or(first);
    if !first.is_empty() && !is_identifier(first) {
        return Err(invalid_segment(name, first));
    }

    let rest: Vec<&str> = segments.collect();
    if let Some((last, middle)) = rest.split_last() {
        if let Some(segment) = middle.iter().find(|segment| !is_identifier(segment)) {
            return Err(invalid_segment(name, segment));
        }
        if last.is_empty() {
            if !allow_empty {
                return Err(invalid_name(name, "name ends with '/'"));
            }
        } else if !is_identifier(last) {
            return Err(invalid_segment(name, last));
        }
    }
    Ok(())
}

/// Validate a single-segment name, such as a node name
pub fn check_base_name(name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        Err(invalid_name(name, "name is empty"))
    } else if name.contains('/') {
        Err(invalid_name(name, "name cannot contain a namespace"))
    } else if name.starts_with('~') {
        Err(invalid_name(name, "name cannot be private"))
    } else if !is_identifier(name) {
        Err(invalid_segment(name, name))
    } else {
        Ok(())
    }
}

/// `[A-Za-z][A-Za-z0-9_]*`
fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn invalid_segment(name: &str, segment: &str) -> LaunchError {
    let reason = if segment.is_empty() {
        "empty segment".to_string()
    } else {
        format!(
            "'{}' must start with a letter and contain only letters, digits and underscores",
            segment
        )
    };
    invalid_name(name, reason)
}

fn invalid_name(name: &str, reason: impl Into<String>) -> LaunchError {
    ErrorKind::InvalidName {
        name: name.to_string(),
        reason: reason.into(),
    }
    .into()
}

/// Join a relative name onto a namespace
pub fn join_name(base: &str, name: &str) -> String {
    normalize_name(&format!("{}/{}", base, name))
}

/// Absolute form with single separators and no trailing slash
pub fn normalize_name(name: &str) -> String {
    let segments: Vec<&str> = name.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

/// Last segment of a resolved name
pub fn base_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}
