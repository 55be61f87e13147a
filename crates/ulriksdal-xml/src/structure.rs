#![forbid(unsafe_code)]

//! Opaque XML structures.

use crate::document::DomNode;

/// An XML structure handed to the library as opaque content: algorithm
/// parameters, `Object` content, `SignatureProperty` content, or the input
/// of an unmarshal call.
#[derive(Debug, Clone)]
pub enum XmlStructure {
    /// A structure backed by a node of a parsed document.
    Dom(DomNode),
    /// Character content with no element structure.
    Text(String),
}

impl XmlStructure {
    /// The backing DOM node, if this structure has one.
    pub fn as_dom(&self) -> Option<&DomNode> {
        match self {
            XmlStructure::Dom(node) => Some(node),
            XmlStructure::Text(_) => None,
        }
    }

    /// Short name of the structure kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            XmlStructure::Dom(_) => "DOM structure",
            XmlStructure::Text(_) => "text structure",
        }
    }
}

impl From<DomNode> for XmlStructure {
    fn from(node: DomNode) -> Self {
        XmlStructure::Dom(node)
    }
}
