#![forbid(unsafe_code)]

//! Unmarshalling of `<Signature>` elements into [`XmlSignature`].
//!
//! Children are read strictly in document order.  Algorithms are resolved
//! through the factory, so the secure validation policy applies here too.

use std::iter::Peekable;
use std::sync::Arc;

use base64::Engine;
use roxmltree::Node;
use ulriksdal_core::{algorithm, ns, Error};
use ulriksdal_xml::document::is_element_named;
use ulriksdal_xml::qname::element_qname;
use ulriksdal_xml::{DomNode, XmlDocument, XmlStructure};

use crate::context::CryptoContext;
use crate::factory::XmlSignatureFactory;
use crate::methods::{CanonicalizationMethod, SignatureMethod, Transform};
use crate::params::{AlgorithmParameters, HmacParameterSpec};
use crate::structures::{
    KeyInfo, KeyInfoContent, Manifest, ObjectContent, Reference, SignatureProperties,
    SignatureProperty, SignatureValue, SignedInfo, XmlObject, XmlSignature,
};

struct Unmarshaller<'f> {
    factory: &'f XmlSignatureFactory,
    document: &'f Arc<XmlDocument>,
    /// Bound onto every transform read from the signature.
    base_uri: Option<&'f str>,
    secure_validation: bool,
}

type Children<'a, 'input> = Peekable<Box<dyn Iterator<Item = Node<'a, 'input>> + 'a>>;

fn element_children<'a, 'input>(node: Node<'a, 'input>) -> Children<'a, 'input> {
    let iter: Box<dyn Iterator<Item = Node<'a, 'input>> + 'a> =
        Box::new(node.children().filter(Node::is_element));
    iter.peekable()
}

/// Take the next child if it is the named DSig element.
fn next_if_named<'a, 'input>(
    children: &mut Children<'a, 'input>,
    local_name: &str,
) -> Option<Node<'a, 'input>> {
    children.next_if(|n| is_element_named(n, ns::DSIG, local_name))
}

fn require_named<'a, 'input>(
    children: &mut Children<'a, 'input>,
    parent: &str,
    local_name: &str,
) -> Result<Node<'a, 'input>, Error> {
    match children.next() {
        Some(n) if is_element_named(&n, ns::DSIG, local_name) => Ok(n),
        Some(n) => Err(Error::MalformedStructure(format!(
            "expected {local_name} in {parent}, found {}",
            element_qname(&n)
        ))),
        None => Err(Error::MalformedStructure(format!(
            "{parent} is missing {local_name}"
        ))),
    }
}

fn reject_rest(children: &mut Children<'_, '_>, parent: &str) -> Result<(), Error> {
    match children.next() {
        Some(n) => Err(Error::MalformedStructure(format!(
            "unexpected element {} in {parent}",
            element_qname(&n)
        ))),
        None => Ok(()),
    }
}

fn algorithm_of<'a>(node: Node<'a, '_>) -> Result<&'a str, Error> {
    node.attribute(ns::attr::ALGORITHM).ok_or_else(|| {
        Error::MalformedStructure(format!(
            "{} is missing its Algorithm attribute",
            node.tag_name().name()
        ))
    })
}

fn optional_attr(node: Node<'_, '_>, name: &str) -> Option<String> {
    node.attribute(name).map(str::to_owned)
}

fn decode_base64(node: Node<'_, '_>) -> Result<Vec<u8>, Error> {
    let text: String = node
        .text()
        .unwrap_or("")
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    base64::engine::general_purpose::STANDARD
        .decode(text)
        .map_err(|e| {
            Error::MalformedStructure(format!("{} is not valid base64: {e}", node.tag_name().name()))
        })
}

fn is_exclusive_c14n(uri: &str) -> bool {
    uri == algorithm::EXC_C14N || uri == algorithm::EXC_C14N_WITH_COMMENTS
}

impl Unmarshaller<'_> {
    fn dom(&self, node: Node<'_, '_>) -> Result<DomNode, Error> {
        DomNode::from_parsed(self.document, node)
    }

    /// Element and non-blank text children, as opaque structures.
    fn opaque_content(&self, node: Node<'_, '_>) -> Result<Vec<XmlStructure>, Error> {
        let mut content = Vec::new();
        for child in node.children() {
            if child.is_element() {
                content.push(XmlStructure::Dom(self.dom(child)?));
            } else if child.is_text() {
                let text = child.text().unwrap_or("");
                if !text.trim().is_empty() {
                    content.push(XmlStructure::Text(text.to_owned()));
                }
            }
        }
        Ok(content)
    }

    fn signature(&self, element: Node<'_, '_>) -> Result<XmlSignature, Error> {
        let mut children = element_children(element);

        let signed_info = require_named(&mut children, ns::node::SIGNATURE, ns::node::SIGNED_INFO)?;
        let signed_info = self.signed_info(signed_info)?;

        let value = require_named(&mut children, ns::node::SIGNATURE, ns::node::SIGNATURE_VALUE)?;
        let signature_value = SignatureValue {
            value: decode_base64(value)?,
            id: optional_attr(value, ns::attr::ID),
        };

        let key_info = match next_if_named(&mut children, ns::node::KEY_INFO) {
            Some(n) => Some(self.key_info(n)?),
            None => None,
        };

        let mut objects = Vec::new();
        while let Some(n) = next_if_named(&mut children, ns::node::OBJECT) {
            objects.push(self.object(n)?);
        }
        reject_rest(&mut children, ns::node::SIGNATURE)?;

        Ok(XmlSignature {
            signed_info,
            signature_value,
            key_info,
            objects,
            id: optional_attr(element, ns::attr::ID),
        })
    }

    fn signed_info(&self, element: Node<'_, '_>) -> Result<SignedInfo, Error> {
        let mut children = element_children(element);

        let cm = require_named(
            &mut children,
            ns::node::SIGNED_INFO,
            ns::node::CANONICALIZATION_METHOD,
        )?;
        let canonicalization_method = self.canonicalization_method(cm)?;

        let sm = require_named(&mut children, ns::node::SIGNED_INFO, ns::node::SIGNATURE_METHOD)?;
        let signature_method = self.signature_method(sm)?;

        let references = self.references(&mut children, ns::node::SIGNED_INFO)?;
        reject_rest(&mut children, ns::node::SIGNED_INFO)?;

        Ok(SignedInfo {
            canonicalization_method,
            signature_method,
            references,
            id: optional_attr(element, ns::attr::ID),
        })
    }

    fn canonicalization_method(&self, element: Node<'_, '_>) -> Result<CanonicalizationMethod, Error> {
        let uri = algorithm_of(element)?;
        let params = self.xml_params(uri, element)?;
        Ok(self
            .factory
            .resolve_canonicalization(uri, params, self.secure_validation)?
            .with_base_uri(self.base_uri))
    }

    fn signature_method(&self, element: Node<'_, '_>) -> Result<SignatureMethod, Error> {
        let uri = algorithm_of(element)?;
        let params = match element
            .children()
            .find(|n| is_element_named(n, ns::DSIG, ns::node::HMAC_OUTPUT_LENGTH))
        {
            Some(n) => {
                let text = n.text().unwrap_or("").trim();
                let bits = text.parse::<usize>().map_err(|_| {
                    Error::MalformedStructure(format!("invalid HMACOutputLength: {text}"))
                })?;
                Some(AlgorithmParameters::Hmac(HmacParameterSpec::new(bits)))
            }
            None => None,
        };
        self.factory
            .resolve_signature(uri, params, self.secure_validation)
    }

    /// Exclusive C14N reads its parameters from its own element.
    fn xml_params(
        &self,
        uri: &str,
        element: Node<'_, '_>,
    ) -> Result<Option<AlgorithmParameters>, Error> {
        if !is_exclusive_c14n(uri) {
            return Ok(None);
        }
        Ok(Some(AlgorithmParameters::Xml(XmlStructure::Dom(
            self.dom(element)?,
        ))))
    }

    /// One or more `<Reference>` children, bounded under secure validation.
    fn references(
        &self,
        children: &mut Children<'_, '_>,
        parent: &str,
    ) -> Result<Vec<Reference>, Error> {
        let mut references = Vec::new();
        while let Some(n) = next_if_named(children, ns::node::REFERENCE) {
            references.push(self.reference(n)?);
            let max = self.factory.config().policy.max_references;
            if self.secure_validation && references.len() > max {
                return Err(Error::MalformedStructure(format!(
                    "{parent} has more than {max} references"
                )));
            }
        }
        if references.is_empty() {
            return Err(Error::MalformedStructure(format!(
                "{parent} needs at least one Reference"
            )));
        }
        Ok(references)
    }

    fn reference(&self, element: Node<'_, '_>) -> Result<Reference, Error> {
        let mut children = element_children(element);

        let transforms = match next_if_named(&mut children, ns::node::TRANSFORMS) {
            Some(n) => self.transforms(n)?,
            None => Vec::new(),
        };

        let dm = require_named(&mut children, ns::node::REFERENCE, ns::node::DIGEST_METHOD)?;
        let digest_method =
            self.factory
                .resolve_digest(algorithm_of(dm)?, None, self.secure_validation)?;

        let dv = require_named(&mut children, ns::node::REFERENCE, ns::node::DIGEST_VALUE)?;
        let digest_value = decode_base64(dv)?;
        reject_rest(&mut children, ns::node::REFERENCE)?;

        Ok(Reference {
            uri: optional_attr(element, ns::attr::URI),
            reference_type: optional_attr(element, ns::attr::TYPE),
            id: optional_attr(element, ns::attr::ID),
            digest_method,
            transforms,
            applied_transforms: Vec::new(),
            applied_result: None,
            digest_value: Some(digest_value),
        })
    }

    fn transforms(&self, element: Node<'_, '_>) -> Result<Vec<Transform>, Error> {
        let mut children = element_children(element);
        let mut transforms = Vec::new();
        while let Some(n) = next_if_named(&mut children, ns::node::TRANSFORM) {
            let max = self.factory.config().policy.max_transforms;
            if self.secure_validation && transforms.len() >= max {
                return Err(Error::MalformedStructure(format!(
                    "Reference has more than {max} transforms"
                )));
            }
            let uri = algorithm_of(n)?;
            let params = self.xml_params(uri, n)?;
            transforms.push(
                self.factory
                    .resolve_transform(uri, params, self.secure_validation)?
                    .with_base_uri(self.base_uri),
            );
        }
        reject_rest(&mut children, ns::node::TRANSFORMS)?;
        Ok(transforms)
    }

    fn key_info(&self, element: Node<'_, '_>) -> Result<KeyInfo, Error> {
        let mut content = Vec::new();
        for child in element.children().filter(Node::is_element) {
            if is_element_named(&child, ns::DSIG, ns::node::KEY_NAME) {
                let name = child.text().unwrap_or("").trim().to_owned();
                content.push(KeyInfoContent::KeyName(name));
            } else {
                content.push(KeyInfoContent::Xml(XmlStructure::Dom(self.dom(child)?)));
            }
        }
        Ok(KeyInfo {
            content,
            id: optional_attr(element, ns::attr::ID),
        })
    }

    fn object(&self, element: Node<'_, '_>) -> Result<XmlObject, Error> {
        let mut content = Vec::new();
        for child in element.children() {
            if is_element_named(&child, ns::DSIG, ns::node::MANIFEST) {
                content.push(ObjectContent::Manifest(self.manifest(child)?));
            } else if is_element_named(&child, ns::DSIG, ns::node::SIGNATURE_PROPERTIES) {
                content.push(ObjectContent::SignatureProperties(
                    self.signature_properties(child)?,
                ));
            } else if child.is_element() {
                content.push(ObjectContent::Xml(XmlStructure::Dom(self.dom(child)?)));
            } else if child.is_text() {
                let text = child.text().unwrap_or("");
                if !text.trim().is_empty() {
                    content.push(ObjectContent::Xml(XmlStructure::Text(text.to_owned())));
                }
            }
        }
        Ok(XmlObject {
            content,
            id: optional_attr(element, ns::attr::ID),
            mime_type: optional_attr(element, ns::attr::MIME_TYPE),
            encoding: optional_attr(element, ns::attr::ENCODING),
        })
    }

    fn manifest(&self, element: Node<'_, '_>) -> Result<Manifest, Error> {
        let mut children = element_children(element);
        let references = self.references(&mut children, ns::node::MANIFEST)?;
        reject_rest(&mut children, ns::node::MANIFEST)?;
        Ok(Manifest {
            references,
            id: optional_attr(element, ns::attr::ID),
        })
    }

    fn signature_properties(&self, element: Node<'_, '_>) -> Result<SignatureProperties, Error> {
        let mut children = element_children(element);
        let mut properties = Vec::new();
        while let Some(n) = next_if_named(&mut children, ns::node::SIGNATURE_PROPERTY) {
            let target = n.attribute(ns::attr::TARGET).ok_or_else(|| {
                Error::MalformedStructure("SignatureProperty is missing its Target attribute".into())
            })?;
            properties.push(SignatureProperty {
                content: self.opaque_content(n)?,
                target: target.to_owned(),
                id: optional_attr(n, ns::attr::ID),
            });
        }
        reject_rest(&mut children, ns::node::SIGNATURE_PROPERTIES)?;
        if properties.is_empty() {
            return Err(Error::MalformedStructure(
                "SignatureProperties needs at least one SignatureProperty".into(),
            ));
        }
        Ok(SignatureProperties {
            properties,
            id: optional_attr(element, ns::attr::ID),
        })
    }
}

/// Unmarshal the signature rooted at `node`, a `<Signature>` element or a
/// document whose root element is one.
pub(crate) fn unmarshal(
    factory: &XmlSignatureFactory,
    node: &DomNode,
    context: &dyn CryptoContext,
) -> Result<XmlSignature, Error> {
    let doc = node.document().parse_doc()?;
    let start = doc.get_node(node.id()).ok_or_else(|| {
        Error::MalformedStructure(format!("node {} is not part of the document", node.id().get()))
    })?;

    let element = if start.is_root() {
        doc.root_element()
    } else if start.is_element() {
        start
    } else {
        return Err(Error::MalformedStructure(format!(
            "cannot unmarshal a {:?} node",
            start.node_type()
        )));
    };

    if element.tag_name().name() != ns::node::SIGNATURE {
        return Err(Error::MalformedStructure(format!(
            "invalid Signature tag: {}",
            element_qname(&element)
        )));
    }

    let unmarshaller = Unmarshaller {
        factory,
        document: node.document(),
        base_uri: context.base_uri().or(node.document().base_uri()),
        secure_validation: context.secure_validation() || factory.config().secure_validation,
    };
    let signature = unmarshaller.signature(element)?;
    tracing::debug!(
        references = signature.signed_info().references().len(),
        objects = signature.objects().len(),
        secure_validation = unmarshaller.secure_validation,
        "unmarshalled signature"
    );
    Ok(signature)
}
