//! XML launch file parser

use super::entity::Element;
use crate::error::{ErrorKind, LaunchError, Result, SourceLocation};
use std::path::Path;

/// Parse launch XML into a generic element tree rooted at `<launch>`.
///
/// `file` only labels source locations; nothing is read from disk here.
pub fn parse_launch_xml(content: &str, file: Option<&Path>) -> Result<Element> {
    let doc = roxmltree::Document::parse(content).map_err(|e| {
        let mut err = LaunchError::from(e);
        if let Some(location) = err.location.as_mut() {
            location.file = file.map(Path::to_path_buf);
        }
        err
    })?;

    let root = doc.root_element();
    let element = convert_node(&doc, root, file);
    if element.type_name() != "launch" {
        return Err(LaunchError::new(ErrorKind::MalformedXml(format!(
            "root element must be <launch>, found <{}>",
            element.type_name()
        )))
        .at(element.location()));
    }
    Ok(element)
}

fn convert_node(doc: &roxmltree::Document, node: roxmltree::Node, file: Option<&Path>) -> Element {
    let pos = doc.text_pos_at(node.range().start);
    let location = SourceLocation::new(file.map(Path::to_path_buf), pos.row, pos.col);
    let mut element = Element::new(node.tag_name().name(), location);

    for attr in node.attributes() {
        element = element.with_attr(attr.name(), attr.value());
    }

    let text: String = node
        .children()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect();
    if !text.is_empty() {
        element = element.with_text(text);
    }

    for child in node.children().filter(|n| n.is_element()) {
        element = element.with_child(convert_node(doc, child, file));
    }
    element
}
