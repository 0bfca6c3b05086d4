//! Depth-first walk of a launch tree
//!
//! The walk is split by concern: `entity` dispatches elements to their
//! interpreters and threads sibling scopes, `include` resolves `<include>`
//! into a nested walk of another file.

mod entity;
mod include;

/// Tags allowed directly under `<launch>` and `<group>`
pub(crate) const LAUNCH_CHILDREN: &[&str] = &[
    "arg", "node", "test", "param", "rosparam", "group", "include", "remap", "env", "machine",
];

/// Tags allowed under `<node>` and `<test>`
pub(crate) const NODE_CHILDREN: &[&str] = &["param", "rosparam", "remap", "env", "arg"];

/// Tags allowed under `<include>`
pub(crate) const INCLUDE_CHILDREN: &[&str] = &["arg", "env"];

pub(crate) fn allowed_children(parent: &str) -> &'static [&'static str] {
    match parent {
        "launch" | "group" => LAUNCH_CHILDREN,
        "node" | "test" => NODE_CHILDREN,
        "include" => INCLUDE_CHILDREN,
        _ => &[],
    }
}
