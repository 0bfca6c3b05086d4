use super::{super::LaunchTraverser, allowed_children};
use crate::{
    actions::{
        ArgAction, EnvAction, GroupAction, MachineAction, NodeAction, ParamAction, RemapAction,
        RosparamAction,
    },
    condition::should_process_element,
    error::{ErrorKind, LaunchError, Result},
    model::MachineDefault,
    options::UnknownElementPolicy,
    scope::Scope,
    xml::Element,
};

impl LaunchTraverser<'_> {
    /// Walk the children of `element` in document order. Each child sees the
    /// scope left behind by its preceding sibling.
    pub(crate) fn traverse_children(&mut self, element: &Element, scope: Scope) -> Result<Scope> {
        let mut scope = scope;
        for child in element.children() {
            scope = self.traverse_entity(child, element.type_name(), scope)?;
        }
        Ok(scope)
    }

    /// Interpret one element and return the scope for its following siblings
    pub(crate) fn traverse_entity(
        &mut self,
        entity: &Element,
        parent: &str,
        scope: Scope,
    ) -> Result<Scope> {
        self.dispatch(entity, parent, scope)
            .map_err(|e| e.at(entity.location()))
    }

    fn dispatch(&mut self, entity: &Element, parent: &str, scope: Scope) -> Result<Scope> {
        if !allowed_children(parent).contains(&entity.type_name()) {
            return self.unknown_element(entity, parent, scope);
        }

        if !should_process_element(entity, &scope, &self.context)? {
            log::debug!(
                "Skipping <{}> at {} due to condition",
                entity.type_name(),
                entity.location()
            );
            return Ok(scope);
        }

        match entity.type_name() {
            "arg" => ArgAction::from_element(entity)?.apply(&scope, &self.context),
            "remap" => RemapAction::from_element(entity)?.apply(&scope, &self.context),
            "env" => EnvAction::from_element(entity)?.apply(&scope, &self.context),
            "machine" => self.traverse_machine(entity, scope),
            "param" => {
                let params = ParamAction::from_element(entity)?.resolve(
                    entity,
                    &scope,
                    &self.context,
                    self.files,
                )?;
                for param in params {
                    self.model.set_param(param);
                }
                Ok(scope)
            }
            "rosparam" => {
                let (command, params) = RosparamAction::from_element(entity)?.resolve(
                    entity,
                    &scope,
                    &self.context,
                    self.files,
                )?;
                self.model.push_rosparam(command);
                for param in params {
                    self.model.set_param(param);
                }
                Ok(scope)
            }
            "group" => {
                let (inner, clear) =
                    GroupAction::from_element(entity)?.enter(entity, &scope, &self.context)?;
                if let Some(clear) = clear {
                    self.model.push_rosparam(clear);
                }
                self.traverse_children(entity, entered(entity, inner))?;
                Ok(scope)
            }
            "node" | "test" => {
                self.traverse_node(entity, &scope)?;
                Ok(scope)
            }
            "include" => {
                self.traverse_include(entity, &scope)?;
                Ok(scope)
            }
            _ => self.unknown_element(entity, parent, scope),
        }
    }

    fn traverse_node(&mut self, entity: &Element, scope: &Scope) -> Result<()> {
        let action = NodeAction::from_element(entity)?;
        let mut target = action.enter(entity, scope, &self.context, &self.model)?;
        if let Some(clear) = target.clear_params.take() {
            self.model.push_rosparam(clear);
        }

        let inner = entered(entity, target.scope.clone());
        let final_scope = self.traverse_children(entity, inner)?;
        log::debug!("Resolved <{}> {}", entity.type_name(), target.full_name());
        self.model.push_node(target.finish(&final_scope));
        Ok(())
    }

    fn traverse_machine(&mut self, entity: &Element, scope: Scope) -> Result<Scope> {
        let spec = MachineAction::from_element(entity)?.resolve(
            entity,
            &scope,
            &self.context,
            &self.ros_distro,
        )?;
        let name = spec.name.clone();
        let becomes_default = spec.default == MachineDefault::True;
        self.model.add_machine(spec)?;

        if becomes_default {
            log::debug!("Machine '{}' is now the default", name);
            Ok(scope.set_machine(&name))
        } else {
            Ok(scope)
        }
    }

    /// Skip or reject an element the parent does not accept
    pub(crate) fn unknown_element(
        &self,
        entity: &Element,
        parent: &str,
        scope: Scope,
    ) -> Result<Scope> {
        match self.options.unknown_elements {
            UnknownElementPolicy::Warn => {
                log::warn!(
                    "Ignoring unknown element <{}> in <{}> at {}",
                    entity.type_name(),
                    parent,
                    entity.location()
                );
                Ok(scope)
            }
            UnknownElementPolicy::Fail => Err(LaunchError::from(ErrorKind::UnknownElement {
                parent: parent.to_string(),
                child: entity.type_name().to_string(),
            })
            .at(entity.location())),
        }
    }
}

/// Child scope of an element whose condition held
pub(crate) fn entered(entity: &Element, scope: Scope) -> Scope {
    if entity.has_attr("if") || entity.has_attr("unless") {
        scope.set_condition(true)
    } else {
        scope
    }
}
