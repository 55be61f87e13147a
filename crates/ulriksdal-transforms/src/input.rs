#![forbid(unsafe_code)]

//! Transform input.

use std::fmt;
use std::io::Read;
use std::sync::Arc;

use ulriksdal_core::Error;
use ulriksdal_xml::{DomNode, NodeSet, XmlDocument};

/// The representation a transform input currently has.  Exactly one is
/// active at a time.
pub enum InputData {
    /// Raw octets.
    Octets(Vec<u8>),
    /// A node-set over a parsed document.
    NodeSet {
        document: Arc<XmlDocument>,
        node_set: NodeSet,
    },
    /// A single element and its subtree.
    Element(DomNode),
    /// Octets not yet read from their source.
    Unprocessed(Box<dyn Read + Send>),
}

impl InputData {
    /// Short name of the active representation, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            InputData::Octets(_) => "octets",
            InputData::NodeSet { .. } => "node-set",
            InputData::Element(_) => "element",
            InputData::Unprocessed(_) => "unprocessed",
        }
    }
}

impl fmt::Debug for InputData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputData::Octets(bytes) => f.debug_tuple("Octets").field(&bytes.len()).finish(),
            InputData::NodeSet { node_set, .. } => {
                f.debug_struct("NodeSet").field("len", &node_set.len()).finish()
            }
            InputData::Element(node) => f.debug_tuple("Element").field(&node.id()).finish(),
            InputData::Unprocessed(_) => f.write_str("Unprocessed"),
        }
    }
}

/// Input to a transform, with the secure-validation flag that travels
/// alongside it.
#[derive(Debug)]
pub struct SignatureInput {
    data: InputData,
    secure_validation: bool,
}

impl SignatureInput {
    pub fn new(data: InputData) -> Self {
        Self {
            data,
            secure_validation: false,
        }
    }

    pub fn from_octets(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(InputData::Octets(bytes.into()))
    }

    pub fn from_node_set(document: Arc<XmlDocument>, node_set: NodeSet) -> Self {
        Self::new(InputData::NodeSet { document, node_set })
    }

    pub fn from_element(element: DomNode) -> Self {
        Self::new(InputData::Element(element))
    }

    pub fn from_reader(reader: impl Read + Send + 'static) -> Self {
        Self::new(InputData::Unprocessed(Box::new(reader)))
    }

    /// Set the secure-validation flag.
    pub fn with_secure_validation(mut self, secure_validation: bool) -> Self {
        self.secure_validation = secure_validation;
        self
    }

    pub fn secure_validation(&self) -> bool {
        self.secure_validation
    }

    pub fn data(&self) -> &InputData {
        &self.data
    }

    pub fn into_data(self) -> InputData {
        self.data
    }

    pub fn is_octets(&self) -> bool {
        matches!(self.data, InputData::Octets(_))
    }

    pub fn is_node_set(&self) -> bool {
        matches!(self.data, InputData::NodeSet { .. })
    }

    pub fn is_element(&self) -> bool {
        matches!(self.data, InputData::Element(_))
    }

    pub fn has_unprocessed_input(&self) -> bool {
        matches!(self.data, InputData::Unprocessed(_))
    }

    /// Read the input as octets.
    ///
    /// Only octet and unprocessed inputs have an octet form without
    /// canonicalization; the other kinds fail with `TypeMismatch`.
    pub fn into_octets(self) -> Result<Vec<u8>, Error> {
        match self.data {
            InputData::Octets(bytes) => Ok(bytes),
            InputData::Unprocessed(mut reader) => {
                let mut bytes = Vec::new();
                reader.read_to_end(&mut bytes)?;
                Ok(bytes)
            }
            other => Err(Error::TypeMismatch(format!(
                "{} input has no octet form",
                other.kind()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one_representation() {
        let input = SignatureInput::from_octets(b"<a/>".to_vec());
        assert!(input.is_octets());
        assert!(!input.is_node_set() && !input.is_element() && !input.has_unprocessed_input());

        let reader = SignatureInput::from_reader(std::io::Cursor::new(b"<a/>".to_vec()));
        assert!(reader.has_unprocessed_input());
        assert!(!reader.is_octets());
    }

    #[test]
    fn test_flag_defaults_off() {
        let input = SignatureInput::from_octets(Vec::new());
        assert!(!input.secure_validation());
        assert!(input.with_secure_validation(true).secure_validation());
    }

    #[test]
    fn test_into_octets() {
        let reader = SignatureInput::from_reader(std::io::Cursor::new(b"abc".to_vec()));
        assert_eq!(reader.into_octets().unwrap(), b"abc");

        let doc = XmlDocument::parse("<a/>".into()).unwrap().into_dom().unwrap();
        let err = SignatureInput::from_element(doc).into_octets().unwrap_err();
        assert!(matches!(err, Error::TypeMismatch(_)));
    }
}
