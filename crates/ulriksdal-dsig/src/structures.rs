#![forbid(unsafe_code)]

//! XML-DSig value structures.
//!
//! These are plain immutable aggregates.  They are built by the factory,
//! which checks their shape, or by unmarshalling a `<Signature>` element.

use std::sync::Arc;

use ulriksdal_xml::{NodeSet, XmlDocument, XmlStructure};

use crate::methods::{CanonicalizationMethod, DigestMethod, SignatureMethod, Transform};

/// The result of dereferencing and transforming a reference.
#[derive(Debug, Clone)]
pub enum Data {
    Octets(Vec<u8>),
    NodeSet {
        document: Arc<XmlDocument>,
        node_set: NodeSet,
    },
}

// ── Reference ────────────────────────────────────────────────────────

/// `<Reference>`.
///
/// Besides the plain form, a reference can carry transforms that were
/// already applied together with their result, or a digest value that was
/// computed elsewhere.
#[derive(Debug, Clone)]
pub struct Reference {
    pub(crate) uri: Option<String>,
    pub(crate) reference_type: Option<String>,
    pub(crate) id: Option<String>,
    pub(crate) digest_method: DigestMethod,
    pub(crate) transforms: Vec<Transform>,
    pub(crate) applied_transforms: Vec<Transform>,
    pub(crate) applied_result: Option<Data>,
    pub(crate) digest_value: Option<Vec<u8>>,
}

impl Reference {
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    pub fn reference_type(&self) -> Option<&str> {
        self.reference_type.as_deref()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn digest_method(&self) -> &DigestMethod {
        &self.digest_method
    }

    /// Transforms still to be applied, in order.
    pub fn transforms(&self) -> &[Transform] {
        &self.transforms
    }

    /// Transforms the caller already applied, in order.
    pub fn applied_transforms(&self) -> &[Transform] {
        &self.applied_transforms
    }

    /// The result of the already-applied transforms.
    pub fn applied_result(&self) -> Option<&Data> {
        self.applied_result.as_ref()
    }

    pub fn digest_value(&self) -> Option<&[u8]> {
        self.digest_value.as_deref()
    }
}

// ── SignedInfo ───────────────────────────────────────────────────────

/// `<SignedInfo>`.
#[derive(Debug, Clone)]
pub struct SignedInfo {
    pub(crate) canonicalization_method: CanonicalizationMethod,
    pub(crate) signature_method: SignatureMethod,
    pub(crate) references: Vec<Reference>,
    pub(crate) id: Option<String>,
}

impl SignedInfo {
    pub fn canonicalization_method(&self) -> &CanonicalizationMethod {
        &self.canonicalization_method
    }

    pub fn signature_method(&self) -> &SignatureMethod {
        &self.signature_method
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

// ── Manifest ─────────────────────────────────────────────────────────

/// `<Manifest>`.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub(crate) references: Vec<Reference>,
    pub(crate) id: Option<String>,
}

impl Manifest {
    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

// ── SignatureProperties ──────────────────────────────────────────────

/// `<SignatureProperty>`.
#[derive(Debug, Clone)]
pub struct SignatureProperty {
    pub(crate) content: Vec<XmlStructure>,
    pub(crate) target: String,
    pub(crate) id: Option<String>,
}

impl SignatureProperty {
    pub fn content(&self) -> &[XmlStructure] {
        &self.content
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// `<SignatureProperties>`.
#[derive(Debug, Clone)]
pub struct SignatureProperties {
    pub(crate) properties: Vec<SignatureProperty>,
    pub(crate) id: Option<String>,
}

impl SignatureProperties {
    pub fn properties(&self) -> &[SignatureProperty] {
        &self.properties
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

// ── Object ───────────────────────────────────────────────────────────

/// One item of `<Object>` content.
#[derive(Debug, Clone)]
pub enum ObjectContent {
    Manifest(Manifest),
    SignatureProperties(SignatureProperties),
    /// Anything else, kept as opaque XML.
    Xml(XmlStructure),
}

/// `<Object>`.
#[derive(Debug, Clone)]
pub struct XmlObject {
    pub(crate) content: Vec<ObjectContent>,
    pub(crate) id: Option<String>,
    pub(crate) mime_type: Option<String>,
    pub(crate) encoding: Option<String>,
}

impl XmlObject {
    pub fn content(&self) -> &[ObjectContent] {
        &self.content
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }
}

// ── KeyInfo ──────────────────────────────────────────────────────────

/// One item of `<KeyInfo>` content.
#[derive(Debug, Clone)]
pub enum KeyInfoContent {
    KeyName(String),
    /// Key data this library does not interpret.
    Xml(XmlStructure),
}

/// `<KeyInfo>`.
#[derive(Debug, Clone)]
pub struct KeyInfo {
    pub(crate) content: Vec<KeyInfoContent>,
    pub(crate) id: Option<String>,
}

impl KeyInfo {
    pub fn content(&self) -> &[KeyInfoContent] {
        &self.content
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The first `<KeyName>`, if any.
    pub fn key_name(&self) -> Option<&str> {
        self.content.iter().find_map(|c| match c {
            KeyInfoContent::KeyName(name) => Some(name.as_str()),
            KeyInfoContent::Xml(_) => None,
        })
    }
}

// ── Signature ────────────────────────────────────────────────────────

/// `<SignatureValue>`.  Empty until a signature has been computed.
#[derive(Debug, Clone, Default)]
pub struct SignatureValue {
    pub(crate) value: Vec<u8>,
    pub(crate) id: Option<String>,
}

impl SignatureValue {
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// `<Signature>`.
#[derive(Debug, Clone)]
pub struct XmlSignature {
    pub(crate) signed_info: SignedInfo,
    pub(crate) signature_value: SignatureValue,
    pub(crate) key_info: Option<KeyInfo>,
    pub(crate) objects: Vec<XmlObject>,
    pub(crate) id: Option<String>,
}

impl XmlSignature {
    pub fn signed_info(&self) -> &SignedInfo {
        &self.signed_info
    }

    pub fn signature_value(&self) -> &SignatureValue {
        &self.signature_value
    }

    pub fn key_info(&self) -> Option<&KeyInfo> {
        self.key_info.as_ref()
    }

    pub fn objects(&self) -> &[XmlObject] {
        &self.objects
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}
