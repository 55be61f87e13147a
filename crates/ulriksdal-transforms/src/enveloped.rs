#![forbid(unsafe_code)]

//! Enveloped signature transform.
//!
//! Removes the `<Signature>` element that contains the transform, with all
//! of its descendants, from the node set.

use std::io::Write;

use ulriksdal_core::{algorithm, ns, Error};
use ulriksdal_xml::document::is_element_named;
use ulriksdal_xml::NodeSet;

use crate::input::{InputData, SignatureInput};
use crate::output::{OutputData, TransformOutput};
use crate::service::TransformService;

/// The enveloped signature transform.
///
/// The signature to remove is the nearest `ds:Signature` ancestor of the
/// `Transform` element, which must come from the same document as the
/// input.  The result is a node-set, so a sink is never written.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvelopedSignatureTransform;

impl TransformService for EnvelopedSignatureTransform {
    fn uri(&self) -> &'static str {
        algorithm::ENVELOPED_SIGNATURE
    }

    fn transform<'s>(
        &self,
        input: SignatureInput,
        element: Option<roxmltree::Node<'_, '_>>,
        _base_uri: Option<&str>,
        _sink: Option<&'s mut dyn Write>,
    ) -> Result<TransformOutput<'s>, Error> {
        let element = element.ok_or_else(|| {
            Error::PreconditionViolation(
                "enveloped-signature transform needs its Transform element".into(),
            )
        })?;
        let signature = element
            .ancestors()
            .find(|n| is_element_named(n, ns::DSIG, ns::node::SIGNATURE))
            .ok_or_else(|| {
                Error::MalformedStructure("enveloped-signature transform outside a Signature".into())
            })?;

        let secure_validation = input.secure_validation();
        let (document, node_set) = match input.into_data() {
            InputData::NodeSet { document, node_set } => (document, node_set),
            InputData::Element(dom) => {
                let node_set = dom.with_node(|n| Ok(NodeSet::tree_with_comments(n)))?;
                (dom.document().clone(), node_set)
            }
            other => {
                return Err(Error::TypeMismatch(format!(
                    "enveloped-signature transform needs XML input, got {}",
                    other.kind()
                )))
            }
        };
        if document.text() != element.document().input_text() {
            return Err(Error::MalformedStructure(
                "Transform element and input belong to different documents".into(),
            ));
        }

        let mut node_set = node_set;
        node_set.remove_subtree(signature);
        tracing::trace!(remaining = node_set.len(), "removed enveloping signature");
        Ok(TransformOutput::new(
            OutputData::NodeSet { document, node_set },
            secure_validation,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use ulriksdal_xml::XmlDocument;

    const DOC: &str = concat!(
        r#"<doc><data>v</data>"#,
        r#"<ds:Signature xmlns:ds="http://www.w3.org/2000/09/xmldsig#"><ds:SignedInfo>"#,
        r#"<ds:Reference URI=""><ds:Transforms>"#,
        r#"<ds:Transform Algorithm="http://www.w3.org/2000/09/xmldsig#enveloped-signature"/>"#,
        r#"</ds:Transforms></ds:Reference></ds:SignedInfo></ds:Signature></doc>"#,
    );

    #[test]
    fn test_signature_subtree_removed() {
        let xml = Arc::new(XmlDocument::parse(DOC.into()).unwrap());
        let doc = xml.parse_doc().unwrap();
        let transform = doc
            .descendants()
            .find(|n| n.has_tag_name((ns::DSIG, "Transform")))
            .unwrap();
        let input = SignatureInput::from_node_set(xml.clone(), NodeSet::all_without_comments(&doc));

        let out = EnvelopedSignatureTransform
            .transform(input, Some(transform), None, None)
            .unwrap();
        let next = out.into_input().unwrap();
        let c14n = crate::exclusive::ExclusiveC14nTransform::new(
            crate::exclusive::CommentMode::Omit,
            None,
        )
        .perform(next, None, None, None)
        .unwrap();
        assert_eq!(c14n.bytes().unwrap(), b"<doc><data>v</data></doc>");
    }

    #[test]
    fn test_requires_transform_element() {
        let input = SignatureInput::from_octets(DOC.as_bytes().to_vec());
        let err = EnvelopedSignatureTransform
            .transform(input, None, None, None)
            .unwrap_err();
        assert!(matches!(err, Error::PreconditionViolation(_)));
    }

    #[test]
    fn test_octet_input_rejected() {
        let doc = roxmltree::Document::parse(DOC).unwrap();
        let transform = doc
            .descendants()
            .find(|n| n.has_tag_name((ns::DSIG, "Transform")))
            .unwrap();
        let input = SignatureInput::from_octets(DOC.as_bytes().to_vec());
        let err = EnvelopedSignatureTransform
            .transform(input, Some(transform), None, None)
            .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch(_)));
    }
}
