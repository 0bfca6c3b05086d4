//! XML parsing module

pub mod entity;
pub mod parser;

pub use entity::Element;
pub use parser::parse_launch_xml;
