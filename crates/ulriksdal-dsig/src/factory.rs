#![forbid(unsafe_code)]

//! The XML signature factory.
//!
//! Resolves algorithm URIs into method instances, builds signature
//! structures from parts, and unmarshals `<Signature>` elements.

use std::sync::Arc;

use ulriksdal_core::Error;
use ulriksdal_transforms::{
    DefaultTransformProvider, ExcC14nParameterSpec, InclusiveNamespaces, TransformParameterSpec,
    TransformProvider, TransformService,
};
use ulriksdal_xml::XmlStructure;

use crate::catalog;
use crate::context::{CryptoContext, FactoryConfig, UnmarshalContext, ValidateContext};
use crate::methods::{CanonicalizationMethod, DigestMethod, SignatureMethod, Transform};
use crate::params::AlgorithmParameters;
use crate::structures::{
    Data, KeyInfo, KeyInfoContent, Manifest, ObjectContent, Reference, SignatureProperties,
    SignatureProperty, SignatureValue, SignedInfo, XmlObject, XmlSignature,
};
use crate::unmarshal;

/// Entry point for algorithm resolution and structure construction.
///
/// The factory holds only its configuration and may be shared freely
/// between threads.
#[derive(Debug, Clone, Default)]
pub struct XmlSignatureFactory {
    config: FactoryConfig,
}

fn require_uri(uri: &str) -> Result<(), Error> {
    if uri.is_empty() {
        return Err(Error::PreconditionViolation("algorithm URI cannot be empty".into()));
    }
    Ok(())
}

impl XmlSignatureFactory {
    pub fn new(config: FactoryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    fn check_policy(&self, uri: &str, secure_validation: bool) -> Result<(), Error> {
        if secure_validation || self.config.secure_validation {
            self.config.policy.check_algorithm(uri)?;
        }
        Ok(())
    }

    // ── Method resolution ────────────────────────────────────────────

    pub fn new_digest_method(
        &self,
        uri: &str,
        params: Option<AlgorithmParameters>,
    ) -> Result<DigestMethod, Error> {
        self.resolve_digest(uri, params, false)
    }

    pub(crate) fn resolve_digest(
        &self,
        uri: &str,
        params: Option<AlgorithmParameters>,
        secure_validation: bool,
    ) -> Result<DigestMethod, Error> {
        require_uri(uri)?;
        self.check_policy(uri, secure_validation)?;
        let (uri, build) =
            catalog::digest(uri).ok_or_else(|| Error::UnsupportedAlgorithm(uri.to_owned()))?;
        tracing::debug!(uri, family = "digest", "resolved algorithm");
        build(uri, params)
    }

    pub fn new_signature_method(
        &self,
        uri: &str,
        params: Option<AlgorithmParameters>,
    ) -> Result<SignatureMethod, Error> {
        self.resolve_signature(uri, params, false)
    }

    pub(crate) fn resolve_signature(
        &self,
        uri: &str,
        params: Option<AlgorithmParameters>,
        secure_validation: bool,
    ) -> Result<SignatureMethod, Error> {
        require_uri(uri)?;
        self.check_policy(uri, secure_validation)?;
        let (uri, build) =
            catalog::signature(uri).ok_or_else(|| Error::UnsupportedAlgorithm(uri.to_owned()))?;
        tracing::debug!(uri, family = "signature", "resolved algorithm");
        build(uri, params)
    }

    pub fn new_transform(
        &self,
        uri: &str,
        params: Option<AlgorithmParameters>,
    ) -> Result<Transform, Error> {
        self.resolve_transform(uri, params, false)
    }

    pub(crate) fn resolve_transform(
        &self,
        uri: &str,
        params: Option<AlgorithmParameters>,
        secure_validation: bool,
    ) -> Result<Transform, Error> {
        require_uri(uri)?;
        self.check_policy(uri, secure_validation)?;
        let params = transform_params(uri, params)?;
        let service = self.lookup_transform(uri, params.as_ref())?;
        Ok(Transform::new(service))
    }

    pub fn new_canonicalization_method(
        &self,
        uri: &str,
        params: Option<AlgorithmParameters>,
    ) -> Result<CanonicalizationMethod, Error> {
        self.resolve_canonicalization(uri, params, false)
    }

    pub(crate) fn resolve_canonicalization(
        &self,
        uri: &str,
        params: Option<AlgorithmParameters>,
        secure_validation: bool,
    ) -> Result<CanonicalizationMethod, Error> {
        let transform = self.resolve_transform(uri, params, secure_validation)?;
        CanonicalizationMethod::new(transform)
    }

    /// Ask the configured provider first, then the built-in one.
    fn lookup_transform(
        &self,
        uri: &str,
        params: Option<&TransformParameterSpec>,
    ) -> Result<Arc<dyn TransformService>, Error> {
        if let Some(provider) = &self.config.provider {
            match provider.get(uri, params) {
                Ok(Some(service)) => {
                    tracing::debug!(uri, provider = provider.name(), "resolved transform");
                    return Ok(Arc::from(service));
                }
                Ok(None) => {
                    tracing::debug!(
                        uri,
                        provider = provider.name(),
                        "provider lacks transform, using built-in"
                    );
                }
                // The provider knows the URI but refused the parameters.
                Err(e @ Error::InvalidAlgorithmParameters(_)) => return Err(e),
                Err(e) => {
                    return Err(Error::UnsupportedAlgorithm(format!(
                        "{uri} (provider {}: {e})",
                        provider.name()
                    )))
                }
            }
        }
        let fallback = DefaultTransformProvider;
        match fallback.get(uri, params)? {
            Some(service) => {
                tracing::debug!(uri, provider = fallback.name(), "resolved transform");
                Ok(Arc::from(service))
            }
            None => Err(Error::UnsupportedAlgorithm(uri.to_owned())),
        }
    }

    // ── Structure construction ───────────────────────────────────────

    pub fn new_reference(
        &self,
        uri: Option<&str>,
        digest_method: DigestMethod,
    ) -> Result<Reference, Error> {
        self.new_reference_with(uri, digest_method, Vec::new(), None, None)
    }

    pub fn new_reference_with(
        &self,
        uri: Option<&str>,
        digest_method: DigestMethod,
        transforms: Vec<Transform>,
        reference_type: Option<&str>,
        id: Option<&str>,
    ) -> Result<Reference, Error> {
        Ok(Reference {
            uri: uri.map(str::to_owned),
            reference_type: reference_type.map(str::to_owned),
            id: id.map(str::to_owned),
            digest_method,
            transforms,
            applied_transforms: Vec::new(),
            applied_result: None,
            digest_value: None,
        })
    }

    /// A reference whose first transforms were already applied by the
    /// caller, who also supplies their result.
    #[allow(clippy::too_many_arguments)]
    pub fn new_reference_with_applied(
        &self,
        uri: Option<&str>,
        digest_method: DigestMethod,
        applied_transforms: Vec<Transform>,
        result: Option<Data>,
        transforms: Vec<Transform>,
        reference_type: Option<&str>,
        id: Option<&str>,
    ) -> Result<Reference, Error> {
        if applied_transforms.is_empty() {
            return Err(Error::PreconditionViolation(
                "appliedTransforms cannot be empty".into(),
            ));
        }
        let result =
            result.ok_or_else(|| Error::PreconditionViolation("result cannot be null".into()))?;
        let mut reference =
            self.new_reference_with(uri, digest_method, transforms, reference_type, id)?;
        reference.applied_transforms = applied_transforms;
        reference.applied_result = Some(result);
        Ok(reference)
    }

    /// A reference whose digest value was computed elsewhere.
    pub fn new_reference_with_digest(
        &self,
        uri: Option<&str>,
        digest_method: DigestMethod,
        transforms: Vec<Transform>,
        reference_type: Option<&str>,
        id: Option<&str>,
        digest_value: Option<Vec<u8>>,
    ) -> Result<Reference, Error> {
        let digest_value = digest_value
            .ok_or_else(|| Error::PreconditionViolation("digestValue cannot be null".into()))?;
        let mut reference =
            self.new_reference_with(uri, digest_method, transforms, reference_type, id)?;
        reference.digest_value = Some(digest_value);
        Ok(reference)
    }

    pub fn new_signed_info(
        &self,
        canonicalization_method: CanonicalizationMethod,
        signature_method: SignatureMethod,
        references: Vec<Reference>,
        id: Option<&str>,
    ) -> Result<SignedInfo, Error> {
        if references.is_empty() {
            return Err(Error::PreconditionViolation("references cannot be empty".into()));
        }
        Ok(SignedInfo {
            canonicalization_method,
            signature_method,
            references,
            id: id.map(str::to_owned),
        })
    }

    pub fn new_manifest(
        &self,
        references: Vec<Reference>,
        id: Option<&str>,
    ) -> Result<Manifest, Error> {
        if references.is_empty() {
            return Err(Error::PreconditionViolation("references cannot be empty".into()));
        }
        Ok(Manifest {
            references,
            id: id.map(str::to_owned),
        })
    }

    pub fn new_xml_object(
        &self,
        content: Vec<ObjectContent>,
        id: Option<&str>,
        mime_type: Option<&str>,
        encoding: Option<&str>,
    ) -> Result<XmlObject, Error> {
        Ok(XmlObject {
            content,
            id: id.map(str::to_owned),
            mime_type: mime_type.map(str::to_owned),
            encoding: encoding.map(str::to_owned),
        })
    }

    pub fn new_signature_properties(
        &self,
        properties: Vec<SignatureProperty>,
        id: Option<&str>,
    ) -> Result<SignatureProperties, Error> {
        if properties.is_empty() {
            return Err(Error::PreconditionViolation("properties cannot be empty".into()));
        }
        Ok(SignatureProperties {
            properties,
            id: id.map(str::to_owned),
        })
    }

    pub fn new_signature_property(
        &self,
        content: Vec<XmlStructure>,
        target: &str,
        id: Option<&str>,
    ) -> Result<SignatureProperty, Error> {
        if content.is_empty() {
            return Err(Error::PreconditionViolation("content cannot be empty".into()));
        }
        if target.is_empty() {
            return Err(Error::PreconditionViolation("target cannot be empty".into()));
        }
        Ok(SignatureProperty {
            content,
            target: target.to_owned(),
            id: id.map(str::to_owned),
        })
    }

    pub fn new_key_info(
        &self,
        content: Vec<KeyInfoContent>,
        id: Option<&str>,
    ) -> Result<KeyInfo, Error> {
        if content.is_empty() {
            return Err(Error::PreconditionViolation("content cannot be empty".into()));
        }
        Ok(KeyInfo {
            content,
            id: id.map(str::to_owned),
        })
    }

    pub fn new_xml_signature(
        &self,
        signed_info: SignedInfo,
        key_info: Option<KeyInfo>,
    ) -> Result<XmlSignature, Error> {
        self.new_xml_signature_with(signed_info, key_info, Vec::new(), None, None)
    }

    pub fn new_xml_signature_with(
        &self,
        signed_info: SignedInfo,
        key_info: Option<KeyInfo>,
        objects: Vec<XmlObject>,
        id: Option<&str>,
        signature_value_id: Option<&str>,
    ) -> Result<XmlSignature, Error> {
        Ok(XmlSignature {
            signed_info,
            signature_value: SignatureValue {
                value: Vec::new(),
                id: signature_value_id.map(str::to_owned),
            },
            key_info,
            objects,
            id: id.map(str::to_owned),
        })
    }

    /// No optional features are implemented.
    pub fn is_feature_supported(&self, feature: &str) -> Result<bool, Error> {
        if feature.is_empty() {
            return Err(Error::PreconditionViolation("feature cannot be empty".into()));
        }
        Ok(false)
    }

    // ── Unmarshalling ────────────────────────────────────────────────

    /// Unmarshal the `<Signature>` the context is bound to.
    pub fn unmarshal_xml_signature(&self, context: &ValidateContext) -> Result<XmlSignature, Error> {
        let node = context.node().ok_or_else(|| {
            Error::PreconditionViolation("validation context is not bound to a node".into())
        })?;
        unmarshal::unmarshal(self, node, context)
    }

    /// Unmarshal a free-standing `<Signature>` structure.
    pub fn unmarshal_xml_structure(&self, structure: &XmlStructure) -> Result<XmlSignature, Error> {
        let node = structure.as_dom().ok_or_else(|| {
            Error::TypeMismatch(format!(
                "only DOM structures can be unmarshalled, got a {}",
                structure.kind()
            ))
        })?;
        let context = UnmarshalContext::default();
        unmarshal::unmarshal(self, node, &context as &dyn CryptoContext)
    }
}

/// Turn factory parameters into transform parameters.
fn transform_params(
    uri: &str,
    params: Option<AlgorithmParameters>,
) -> Result<Option<TransformParameterSpec>, Error> {
    match params {
        None => Ok(None),
        Some(AlgorithmParameters::ExcC14n(spec)) => Ok(Some(TransformParameterSpec::ExcC14n(spec))),
        Some(AlgorithmParameters::Xml(structure)) => {
            let node = structure.as_dom().ok_or_else(|| {
                Error::InvalidAlgorithmParameters(format!(
                    "{uri} parameters must be a DOM structure, got a {}",
                    structure.kind()
                ))
            })?;
            let list = node.with_node(|element| {
                InclusiveNamespaces::from_transform_element(element, node.document().base_uri())
            })?;
            match list {
                None => Ok(None),
                Some(list) => Ok(Some(TransformParameterSpec::ExcC14n(
                    ExcC14nParameterSpec::try_from(list)?,
                ))),
            }
        }
        Some(other) => Err(Error::InvalidAlgorithmParameters(format!(
            "{uri} does not take {}",
            other.kind()
        ))),
    }
}
