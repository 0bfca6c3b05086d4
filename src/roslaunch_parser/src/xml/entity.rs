//! Generic launch tree element

use crate::error::{LaunchError, Result, SourceLocation};
use indexmap::IndexMap;

/// One element of a parsed launch document.
///
/// The tree is built once by [`parse_launch_xml`](super::parse_launch_xml) (or by hand
/// through the `with_*` builders) and never mutated during interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    tag: String,
    attributes: IndexMap<String, String>,
    children: Vec<Element>,
    text: Option<String>,
    location: SourceLocation,
}

impl Element {
    pub fn new(tag: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            tag: tag.into(),
            attributes: IndexMap::new(),
            children: Vec::new(),
            text: None,
            location,
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Element type name (e.g., "node", "arg")
    pub fn type_name(&self) -> &str {
        &self.tag
    }

    pub fn get_attr_str(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn required_attr(&self, name: &str) -> Result<&str> {
        self.get_attr_str(name).ok_or_else(|| {
            LaunchError::missing_attribute(&self.tag, name).at(&self.location)
        })
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Raw text content, untrimmed
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn location(&self) -> &SourceLocation {
        &self.location
    }
}
