//! roslaunch_parser library
//!
//! Interprets ROS launch XML into a flat [`RuntimeModel`]: every node, test,
//! parameter, rosparam command and machine the file would produce, with
//! substitutions evaluated and namespaces resolved. Nothing is launched.

pub mod actions;
pub mod condition;
pub mod error;
pub mod model;
pub mod options;
pub mod params;
pub mod scope;
pub mod substitution;
pub mod system;
mod traverser;
pub mod xml;

pub use error::{ErrorKind, LaunchError, Result, SourceLocation};
pub use model::RuntimeModel;
pub use options::{InterpretOptions, UnknownElementPolicy};
pub use scope::{ArgOrigin, Scope};

use options::DEFAULT_ROS_DISTRO;
use std::path::{Path, PathBuf};
use substitution::SubstitutionContext;
use system::{
    normalize_path, EnvironmentAccess, FileAccess, LocalFileSystem, PackageLookup,
    ProcessEnvironment, RosPackagePath,
};
use xml::{parse_launch_xml, Element};

/// Entry point: collaborators plus options, reusable across launch files.
///
/// Each `interpret*` call starts from a fresh scope with its own
/// anonymous-name registry.
pub struct LaunchInterpreter {
    files: Box<dyn FileAccess>,
    packages: Box<dyn PackageLookup>,
    environment: Box<dyn EnvironmentAccess>,
    options: InterpretOptions,
}

impl Default for LaunchInterpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl LaunchInterpreter {
    /// Interpreter backed by the local file system, `ROS_PACKAGE_PATH` and
    /// the process environment
    pub fn new() -> Self {
        Self {
            files: Box::new(LocalFileSystem),
            packages: Box::new(RosPackagePath::from_environment(&ProcessEnvironment)),
            environment: Box::new(ProcessEnvironment),
            options: InterpretOptions::default(),
        }
    }

    pub fn with_files(mut self, files: impl FileAccess + 'static) -> Self {
        self.files = Box::new(files);
        self
    }

    pub fn with_packages(mut self, packages: impl PackageLookup + 'static) -> Self {
        self.packages = Box::new(packages);
        self
    }

    pub fn with_environment(mut self, environment: impl EnvironmentAccess + 'static) -> Self {
        self.environment = Box::new(environment);
        self
    }

    pub fn with_options(mut self, options: InterpretOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &InterpretOptions {
        &self.options
    }

    /// Interpret a parsed `<launch>` tree starting from `initial_scope`
    pub fn interpret(&self, root: &Element, initial_scope: Scope) -> Result<RuntimeModel> {
        let context = SubstitutionContext::new(self.packages.as_ref(), self.environment.as_ref());
        let ros_distro = self
            .options
            .ros_distro
            .clone()
            .or_else(|| context.env_var("ROS_DISTRO"))
            .unwrap_or_else(|| DEFAULT_ROS_DISTRO.to_string());

        let mut traverser = LaunchTraverser {
            include_chain: initial_scope
                .current_file()
                .map(|file| vec![file.to_path_buf()])
                .unwrap_or_default(),
            context,
            files: self.files.as_ref(),
            options: &self.options,
            ros_distro,
            model: RuntimeModel::new(),
        };

        let final_scope = traverser.traverse_launch(root, initial_scope)?;
        traverser.model.record_args(&final_scope);
        Ok(traverser.into_model())
    }

    /// Read, parse and interpret a launch file. `args` are command-line
    /// overrides (`name:=value`).
    pub fn interpret_file(
        &self,
        path: &Path,
        args: impl IntoIterator<Item = (String, String)>,
    ) -> Result<RuntimeModel> {
        let path = normalize_path(path);
        let content = self.files.read(&path)?;
        self.interpret_str(&content, Some(&path), args)
    }

    /// Interpret launch XML held in memory; `file` anchors relative includes
    /// and `$(dirname)`
    pub fn interpret_str(
        &self,
        content: &str,
        file: Option<&Path>,
        args: impl IntoIterator<Item = (String, String)>,
    ) -> Result<RuntimeModel> {
        let root = parse_launch_xml(content, file)?;
        let mut scope = Scope::new();
        if let Some(file) = file {
            scope = scope.with_current_file(file);
        }
        for (name, value) in args {
            scope = scope.bind_arg(&name, Some(value), ArgOrigin::Override)?;
        }
        self.interpret(&root, scope)
    }
}

/// State of one interpretation run, threaded through the `traverser` module
pub(crate) struct LaunchTraverser<'a> {
    context: SubstitutionContext<'a>,
    files: &'a dyn FileAccess,
    options: &'a InterpretOptions,
    ros_distro: String,
    /// Files currently being walked, outermost first
    include_chain: Vec<PathBuf>,
    model: RuntimeModel,
}

impl LaunchTraverser<'_> {
    fn into_model(mut self) -> RuntimeModel {
        self.model.attach_node_params();
        self.model
    }
}

/// Interpret a launch file on disk with the default collaborators
pub fn parse_launch_file(
    path: &Path,
    args: impl IntoIterator<Item = (String, String)>,
) -> Result<RuntimeModel> {
    LaunchInterpreter::new().interpret_file(path, args)
}
