#![forbid(unsafe_code)]

//! Drives the canonicalization engine over any kind of transform input.

use std::io::{Read, Write};

use ulriksdal_c14n::C14nMode;
use ulriksdal_core::Error;

use crate::input::InputData;

/// Canonicalize `data` with exclusive C14N in `mode`, writing into `out`.
///
/// Octet and unprocessed inputs are parsed first; under secure validation
/// a document type declaration is refused.  Node-set inputs are
/// canonicalized as a document subset and element inputs as a subtree.
pub fn canonicalize_input(
    data: InputData,
    mode: C14nMode,
    inclusive_prefixes: &[String],
    secure_validation: bool,
    out: &mut dyn Write,
) -> Result<(), Error> {
    tracing::trace!(
        input = data.kind(),
        uri = mode.uri(),
        prefixes = inclusive_prefixes.len(),
        secure_validation,
        "canonicalizing transform input"
    );
    match data {
        InputData::Octets(bytes) => {
            canonicalize_octets(&bytes, mode, inclusive_prefixes, secure_validation, out)
        }
        InputData::Unprocessed(mut reader) => {
            let mut bytes = Vec::new();
            reader.read_to_end(&mut bytes)?;
            canonicalize_octets(&bytes, mode, inclusive_prefixes, secure_validation, out)
        }
        InputData::NodeSet { document, node_set } => {
            let doc = document.parse_doc()?;
            ulriksdal_c14n::canonicalize_doc(&doc, mode, Some(&node_set), inclusive_prefixes, out)
        }
        InputData::Element(element) => element.with_node(|node| {
            if !node.is_element() {
                return Err(Error::TypeMismatch(format!(
                    "element input refers to a {:?} node",
                    node.node_type()
                )));
            }
            ulriksdal_c14n::canonicalize_subtree(node, mode, inclusive_prefixes, out)
        }),
    }
}

fn canonicalize_octets(
    bytes: &[u8],
    mode: C14nMode,
    inclusive_prefixes: &[String],
    secure_validation: bool,
    out: &mut dyn Write,
) -> Result<(), Error> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| Error::XmlParse(format!("invalid UTF-8: {e}")))?;
    let options = if secure_validation {
        ulriksdal_xml::secure_parsing_options()
    } else {
        ulriksdal_xml::parsing_options()
    };
    let doc = roxmltree::Document::parse_with_options(text, options)
        .map_err(|e| Error::XmlParse(e.to_string()))?;
    ulriksdal_c14n::canonicalize_doc(&doc, mode, None, inclusive_prefixes, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulriksdal_xml::XmlDocument;

    const DTD_DOC: &str = "<!DOCTYPE a [<!ENTITY e \"v\">]><a>&e;</a>";

    #[test]
    fn test_octets_parsed_and_canonicalized() {
        let mut out = Vec::new();
        canonicalize_input(
            InputData::Octets(br#"<a b="1"   a="2"/>"#.to_vec()),
            C14nMode::Exclusive,
            &[],
            false,
            &mut out,
        )
        .unwrap();
        assert_eq!(out, br#"<a a="2" b="1"></a>"#);
    }

    #[test]
    fn test_secure_validation_refuses_dtd() {
        let mut out = Vec::new();
        canonicalize_input(
            InputData::Octets(DTD_DOC.as_bytes().to_vec()),
            C14nMode::Exclusive,
            &[],
            false,
            &mut out,
        )
        .unwrap();
        assert_eq!(out, b"<a>v</a>");

        let err = canonicalize_input(
            InputData::Octets(DTD_DOC.as_bytes().to_vec()),
            C14nMode::Exclusive,
            &[],
            true,
            &mut Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::XmlParse(_)));
    }

    #[test]
    fn test_element_input_is_subtree() {
        let xml = XmlDocument::parse(r#"<r xmlns:p="urn:p"><p:e>t</p:e><x/></r>"#.into()).unwrap();
        let id = {
            let doc = xml.parse_doc().unwrap();
            doc.descendants().find(|n| n.has_tag_name(("urn:p", "e"))).unwrap().id()
        };
        let node = ulriksdal_xml::DomNode::new(std::sync::Arc::new(xml), id).unwrap();
        let mut out = Vec::new();
        canonicalize_input(InputData::Element(node), C14nMode::Exclusive, &[], false, &mut out)
            .unwrap();
        assert_eq!(out, br#"<p:e xmlns:p="urn:p">t</p:e>"#);
    }
}
