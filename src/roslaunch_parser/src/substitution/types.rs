//! Substitution types

use crate::{
    error::SubstitutionError,
    scope::Scope,
    substitution::{
        context::SubstitutionContext,
        eval::{self, Bindings, EvalError},
    },
};

/// One segment of a parsed attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum Substitution {
    /// Plain text (no substitution)
    Text(String),
    /// $(arg name)
    Arg(String),
    /// $(env VAR)
    Env(String),
    /// $(optenv VAR [default])
    OptEnv {
        name: String,
        default: Option<String>,
    },
    /// $(find pkg)
    Find(String),
    /// $(anon seed)
    Anon(String),
    /// $(dirname)
    Dirname,
    /// $(eval expr), where the expression text may itself contain directives
    Eval(Vec<Substitution>),
}

impl Substitution {
    /// Resolve substitution to string value
    pub fn resolve(
        &self,
        scope: &Scope,
        context: &SubstitutionContext,
    ) -> Result<String, SubstitutionError> {
        match self {
            Substitution::Text(s) => Ok(s.clone()),
            Substitution::Arg(name) => match scope.arg(name) {
                None => Err(SubstitutionError::UndeclaredArgument(name.clone())),
                Some(binding) => binding
                    .value
                    .clone()
                    .ok_or_else(|| SubstitutionError::UnsetArgument(name.clone())),
            },
            Substitution::Env(name) => context
                .env_var(name)
                .ok_or_else(|| SubstitutionError::UndefinedEnvVar(name.clone())),
            Substitution::OptEnv { name, default } => Ok(context
                .env_var(name)
                .or_else(|| default.clone())
                .unwrap_or_default()),
            Substitution::Find(package) => context
                .find_package(package)
                .ok_or_else(|| SubstitutionError::PackageNotFound(package.clone())),
            Substitution::Anon(seed) => Ok(scope.anon(seed)),
            Substitution::Dirname => current_dir(scope).ok_or_else(|| {
                SubstitutionError::syntax("$(dirname)", "not inside a launch file")
            }),
            Substitution::Eval(parts) => {
                let expression = resolve_substitutions(parts, scope, context)?;
                let bindings = ScopeBindings { scope, context };
                Ok(eval::evaluate_expression(&expression, &bindings)?)
            }
        }
    }
}

fn current_dir(scope: &Scope) -> Option<String> {
    let file = scope.current_file()?;
    let dir = file.parent()?;
    Some(dir.to_string_lossy().into_owned())
}

/// Exposes the scope and collaborators to eval expressions
struct ScopeBindings<'s, 'c> {
    scope: &'s Scope,
    context: &'s SubstitutionContext<'c>,
}

impl Bindings for ScopeBindings<'_, '_> {
    fn arg(&self, name: &str) -> Result<Option<String>, EvalError> {
        match self.scope.arg(name) {
            None => Ok(None),
            Some(binding) => binding.value.clone().map(Some).ok_or_else(|| {
                EvalError::Lookup(format!("argument '{}' is declared without a value", name))
            }),
        }
    }

    fn env(&self, name: &str) -> Option<String> {
        self.context.env_var(name)
    }

    fn find(&self, package: &str) -> Option<String> {
        self.context.find_package(package)
    }

    fn anon(&self, name: &str) -> String {
        self.scope.anon(name)
    }

    fn dirname(&self) -> Option<String> {
        current_dir(self.scope)
    }
}

/// Resolve list of substitutions to single string, left to right
pub fn resolve_substitutions(
    subs: &[Substitution],
    scope: &Scope,
    context: &SubstitutionContext,
) -> Result<String, SubstitutionError> {
    let mut result = String::new();
    for sub in subs {
        result.push_str(&sub.resolve(scope, context)?);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        scope::ArgOrigin,
        system::{StaticEnvironment, StaticPackages},
    };
    use std::path::Path;

    fn fixtures() -> (StaticPackages, StaticEnvironment) {
        (
            StaticPackages::default().with_package("demo", "/opt/ros/share/demo"),
            StaticEnvironment::default().with_var("ROBOT", "pr2"),
        )
    }

    #[test]
    fn test_text_substitution() {
        let (packages, env) = fixtures();
        let context = SubstitutionContext::new(&packages, &env);
        let sub = Substitution::Text("hello".to_string());
        assert_eq!(sub.resolve(&Scope::new(), &context).unwrap(), "hello");
    }

    #[test]
    fn test_arg_lookup() {
        let (packages, env) = fixtures();
        let context = SubstitutionContext::new(&packages, &env);
        let scope = Scope::new()
            .bind_arg("rate", Some("10".into()), ArgOrigin::Default)
            .unwrap()
            .bind_arg("model", None, ArgOrigin::Default)
            .unwrap();

        let rate = Substitution::Arg("rate".into());
        assert_eq!(rate.resolve(&scope, &context).unwrap(), "10");

        let missing = Substitution::Arg("missing".into());
        assert_eq!(
            missing.resolve(&scope, &context),
            Err(SubstitutionError::UndeclaredArgument("missing".into()))
        );

        let unset = Substitution::Arg("model".into());
        assert_eq!(
            unset.resolve(&scope, &context),
            Err(SubstitutionError::UnsetArgument("model".into()))
        );
    }

    #[test]
    fn test_env_and_optenv() {
        let (packages, env) = fixtures();
        let context = SubstitutionContext::new(&packages, &env);
        let scope = Scope::new();

        assert_eq!(Substitution::Env("ROBOT".into()).resolve(&scope, &context).unwrap(), "pr2");
        assert_eq!(
            Substitution::Env("NOPE".into()).resolve(&scope, &context),
            Err(SubstitutionError::UndefinedEnvVar("NOPE".into()))
        );
        let optenv = Substitution::OptEnv {
            name: "NOPE".into(),
            default: Some("fallback".into()),
        };
        assert_eq!(optenv.resolve(&scope, &context).unwrap(), "fallback");
        let bare = Substitution::OptEnv {
            name: "NOPE".into(),
            default: None,
        };
        assert_eq!(bare.resolve(&scope, &context).unwrap(), "");
    }

    #[test]
    fn test_find_package() {
        let (packages, env) = fixtures();
        let context = SubstitutionContext::new(&packages, &env);
        let scope = Scope::new();
        assert_eq!(
            Substitution::Find("demo".into()).resolve(&scope, &context).unwrap(),
            "/opt/ros/share/demo"
        );
        assert_eq!(
            Substitution::Find("ghost".into()).resolve(&scope, &context),
            Err(SubstitutionError::PackageNotFound("ghost".into()))
        );
    }

    #[test]
    fn test_dirname_follows_current_file() {
        let (packages, env) = fixtures();
        let context = SubstitutionContext::new(&packages, &env);
        let scope = Scope::new().with_current_file(Path::new("/ws/launch/robot.launch"));
        assert_eq!(
            Substitution::Dirname.resolve(&scope, &context).unwrap(),
            "/ws/launch"
        );
        assert!(Substitution::Dirname.resolve(&Scope::new(), &context).is_err());
    }

    #[test]
    fn test_eval_with_nested_arg() {
        let (packages, env) = fixtures();
        let context = SubstitutionContext::new(&packages, &env);
        let scope = Scope::new()
            .bind_arg("n", Some("4".into()), ArgOrigin::Default)
            .unwrap();
        let sub = Substitution::Eval(vec![
            Substitution::Arg("n".into()),
            Substitution::Text(" * 2".into()),
        ]);
        assert_eq!(sub.resolve(&scope, &context).unwrap(), "8");
    }

    #[test]
    fn test_resolve_multiple() {
        let (packages, env) = fixtures();
        let context = SubstitutionContext::new(&packages, &env);
        let scope = Scope::new()
            .bind_arg("name", Some("World".into()), ArgOrigin::Override)
            .unwrap();
        let subs = vec![
            Substitution::Text("Hello ".to_string()),
            Substitution::Arg("name".to_string()),
            Substitution::Text("!".to_string()),
        ];
        assert_eq!(
            resolve_substitutions(&subs, &scope, &context).unwrap(),
            "Hello World!"
        );
    }
}
