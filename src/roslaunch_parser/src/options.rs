//! Interpretation options

use serde::Deserialize;

/// What to do with an element the interpreter does not know
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownElementPolicy {
    /// Log a warning and skip the element with its subtree
    #[default]
    Warn,
    /// Fail with `UnknownElement`
    Fail,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InterpretOptions {
    pub unknown_elements: UnknownElementPolicy,
    /// Distro used for default machine env-loaders; `ROS_DISTRO` when unset
    pub ros_distro: Option<String>,
}

pub const DEFAULT_ROS_DISTRO: &str = "noetic";

impl InterpretOptions {
    pub fn strict() -> Self {
        Self {
            unknown_elements: UnknownElementPolicy::Fail,
            ..Self::default()
        }
    }
}
