use super::{super::LaunchTraverser, entity::entered};
use crate::{
    actions::{EnvAction, IncludeAction, IncludeArg},
    condition::should_process_element,
    error::{ErrorKind, LaunchError, Result},
    scope::{ArgOrigin, Scope},
    xml::{parse_launch_xml, Element},
};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Values an `<include>` hands to the included file
#[derive(Debug, Default)]
struct IncludeInputs {
    args: IndexMap<String, String>,
    /// Names set by `<arg>` children, as opposed to `pass_all_args`
    explicit: HashSet<String>,
    env: Vec<(String, String)>,
}

impl LaunchTraverser<'_> {
    /// Interpret `<include>`: resolve the target, collect the passed arguments
    /// in the including scope and walk the included file in a fresh scope
    pub(crate) fn traverse_include(&mut self, entity: &Element, scope: &Scope) -> Result<()> {
        let target = IncludeAction::from_element(entity)?.enter(entity, scope, &self.context)?;
        let path = self
            .files
            .resolve_path(&target.file, scope.current_dir().as_deref())?;

        if self.include_chain.contains(&path) {
            let mut chain = self.include_chain.clone();
            chain.push(path);
            return Err(ErrorKind::IncludeCycle(chain).into());
        }

        let mut inputs = IncludeInputs::default();
        if target.pass_all_args {
            for (name, binding) in scope.args() {
                if let Some(value) = &binding.value {
                    inputs.args.insert(name.clone(), value.clone());
                }
            }
        }
        for child in entity.children() {
            self.include_child(child, scope, &mut inputs)
                .map_err(|e| e.at(child.location()))?;
        }

        if let Some(clear) = target.clear_params {
            self.model.push_rosparam(clear);
        }

        let content = self.files.read(&path)?;
        let root = parse_launch_xml(&content, Some(&path))?;

        let mut inner = entered(entity, target.scope.for_include(&path));
        for (name, value) in &inputs.env {
            inner = inner.set_env(name, value);
        }
        for (name, value) in inputs.args {
            inner = inner.bind_arg(&name, Some(value), ArgOrigin::Override)?;
        }

        log::info!("Including launch file: {}", path.display());
        self.include_chain.push(path);
        let result = self.traverse_launch(&root, inner);
        self.include_chain.pop();
        result.map(|_| ())
    }

    fn include_child(
        &mut self,
        child: &Element,
        scope: &Scope,
        inputs: &mut IncludeInputs,
    ) -> Result<()> {
        if !super::INCLUDE_CHILDREN.contains(&child.type_name()) {
            self.unknown_element(child, "include", scope.clone())?;
            return Ok(());
        }
        if !should_process_element(child, scope, &self.context)? {
            log::debug!(
                "Skipping <{}> at {} due to condition",
                child.type_name(),
                child.location()
            );
            return Ok(());
        }

        match child.type_name() {
            "arg" => {
                let passed = &inputs.args;
                let (name, value) = IncludeArg::from_element(child)?.resolve(
                    scope,
                    &self.context,
                    |name| passed.contains_key(name),
                )?;
                if inputs.explicit.contains(&name) {
                    return Err(ErrorKind::ArgConflict {
                        existing: inputs.args.get(&name).cloned().unwrap_or_default(),
                        requested: value.unwrap_or_else(|| "<unset>".to_string()),
                        name,
                    }
                    .into());
                }
                inputs.explicit.insert(name.clone());
                if let Some(value) = value {
                    inputs.args.insert(name, value);
                }
            }
            "env" => {
                let entry = EnvAction::from_element(child)?.resolve(scope, &self.context)?;
                inputs.env.push(entry);
            }
            _ => {}
        }
        Ok(())
    }

    /// Walk a `<launch>` root. Returns the scope left after its last child.
    pub(crate) fn traverse_launch(&mut self, root: &Element, scope: Scope) -> Result<Scope> {
        if root.type_name() != "launch" {
            return Err(LaunchError::from(ErrorKind::MalformedXml(format!(
                "root element must be <launch>, found <{}>",
                root.type_name()
            )))
            .at(root.location()));
        }
        if !should_process_element(root, &scope, &self.context)? {
            log::debug!("Skipping <launch> at {} due to condition", root.location());
            return Ok(scope);
        }
        let inner = entered(root, scope);
        self.traverse_children(root, inner)
    }
}
