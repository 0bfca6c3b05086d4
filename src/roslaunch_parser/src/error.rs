//! Error types for the roslaunch_parser

use serde::Serialize;
use std::{fmt, path::PathBuf};
use thiserror::Error;

use crate::substitution::eval::EvalError;

/// Position of an element or attribute in a launch file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub file: Option<PathBuf>,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(file: Option<PathBuf>, line: u32, column: u32) -> Self {
        Self { file, line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}:{}", file.display(), self.line, self.column),
            None => write!(f, "<string>:{}:{}", self.line, self.column),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubstitutionError {
    #[error("Invalid substitution syntax in '{text}': {message}")]
    Syntax { text: String, message: String },

    #[error("Undeclared argument: '{0}'. Did you forget to declare it with <arg>?")]
    UndeclaredArgument(String),

    #[error("Argument '{0}' is declared without a value and none was passed in")]
    UnsetArgument(String),

    #[error(
        "Undefined environment variable: '{0}'. Make sure the variable is set in your environment."
    )]
    UndefinedEnvVar(String),

    #[error("Package '{0}' not found. Ensure the package is installed and sourced.")]
    PackageNotFound(String),

    #[error("$(eval) failed: {0}")]
    Eval(#[from] EvalError),
}

impl SubstitutionError {
    pub(crate) fn syntax(text: &str, message: impl Into<String>) -> Self {
        SubstitutionError::Syntax {
            text: text.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ErrorKind {
    #[error("XML parsing error: {0}")]
    MalformedXml(String),

    #[error(transparent)]
    Substitution(#[from] SubstitutionError),

    #[error("Argument '{name}' is already bound to '{existing}', cannot rebind it to '{requested}'")]
    ArgConflict {
        name: String,
        existing: String,
        requested: String,
    },

    #[error("'{value}' is not a valid boolean for '{attribute}' (expected true, false, 1 or 0)")]
    MalformedBoolean { attribute: String, value: String },

    #[error("Element '<{0}>' declares both 'if' and 'unless'")]
    ConflictingCondition(String),

    #[error("Unknown element '<{child}>' in '<{parent}>'")]
    UnknownElement { parent: String, child: String },

    #[error("Include cycle detected: {}", display_chain(.0))]
    IncludeCycle(Vec<PathBuf>),

    #[error("File not found: {path}: {message}")]
    FileNotFound { path: String, message: String },

    #[error("Missing required attribute '{attribute}' on element '<{element}>'")]
    MissingAttribute { element: String, attribute: String },

    #[error("'{value}' is not a valid value for '{attribute}': {reason}")]
    InvalidValue {
        attribute: String,
        value: String,
        reason: String,
    },

    #[error("Invalid ROS name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("Invalid YAML: {0}")]
    InvalidYaml(String),

    #[error("Machine '{0}' is not declared")]
    UndeclaredMachine(String),

    #[error("Machine '{0}' is already declared with a different definition")]
    MachineConflict(String),
}

fn display_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// An interpretation failure, located at the offending element when known
#[derive(Error, Debug)]
#[error("{}{kind}", display_location(.location))]
pub struct LaunchError {
    pub kind: ErrorKind,
    pub location: Option<SourceLocation>,
}

fn display_location(location: &Option<SourceLocation>) -> String {
    match location {
        Some(location) => format!("{}: ", location),
        None => String::new(),
    }
}

impl LaunchError {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            location: None,
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Attach a location unless a more precise one is already present
    pub fn at(mut self, location: &SourceLocation) -> Self {
        if self.location.is_none() {
            self.location = Some(location.clone());
        }
        self
    }

    pub(crate) fn missing_attribute(element: &str, attribute: &str) -> Self {
        ErrorKind::MissingAttribute {
            element: element.to_string(),
            attribute: attribute.to_string(),
        }
        .into()
    }

    pub(crate) fn invalid_value(
        attribute: &str,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ErrorKind::InvalidValue {
            attribute: attribute.to_string(),
            value: value.into(),
            reason: reason.into(),
        }
        .into()
    }
}

impl From<ErrorKind> for LaunchError {
    fn from(kind: ErrorKind) -> Self {
        LaunchError::new(kind)
    }
}

impl From<SubstitutionError> for LaunchError {
    fn from(err: SubstitutionError) -> Self {
        LaunchError::new(ErrorKind::Substitution(err))
    }
}

impl From<roxmltree::Error> for LaunchError {
    fn from(err: roxmltree::Error) -> Self {
        let pos = err.pos();
        LaunchError {
            kind: ErrorKind::MalformedXml(err.to_string()),
            location: Some(SourceLocation::new(None, pos.row, pos.col)),
        }
    }
}

/// Attach element locations to errors bubbling out of element interpreters
pub(crate) trait ResultExt<T> {
    fn at(self, location: &SourceLocation) -> Result<T>;
}

impl<T, E: Into<LaunchError>> ResultExt<T> for std::result::Result<T, E> {
    fn at(self, location: &SourceLocation) -> Result<T> {
        self.map_err(|e| e.into().at(location))
    }
}

pub type Result<T> = std::result::Result<T, LaunchError>;
