#![forbid(unsafe_code)]

//! Contexts and factory configuration.

use std::fmt;
use std::sync::Arc;

use ulriksdal_core::SecureValidationPolicy;
use ulriksdal_transforms::TransformProvider;
use ulriksdal_xml::DomNode;

/// What every crypto context can tell the factory.
pub trait CryptoContext {
    /// Whether secure validation was requested.
    fn secure_validation(&self) -> bool;

    /// Base URI of the signature document.  Takes precedence over the
    /// document's own base URI when unmarshalling.
    fn base_uri(&self) -> Option<&str>;
}

/// Context for validating a signature, bound to its `<Signature>` node.
#[derive(Debug, Clone, Default)]
pub struct ValidateContext {
    node: Option<DomNode>,
    secure_validation: bool,
    base_uri: Option<String>,
}

impl ValidateContext {
    /// Create a context bound to `node` (an element or a document).
    pub fn new(node: DomNode) -> Self {
        Self {
            node: Some(node),
            ..Self::default()
        }
    }

    pub fn node(&self) -> Option<&DomNode> {
        self.node.as_ref()
    }

    pub fn with_secure_validation(mut self, secure_validation: bool) -> Self {
        self.secure_validation = secure_validation;
        self
    }

    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = Some(base_uri.into());
        self
    }
}

impl CryptoContext for ValidateContext {
    fn secure_validation(&self) -> bool {
        self.secure_validation
    }

    fn base_uri(&self) -> Option<&str> {
        self.base_uri.as_deref()
    }
}

/// The empty context used when unmarshalling a free-standing structure.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnmarshalContext;

impl CryptoContext for UnmarshalContext {
    fn secure_validation(&self) -> bool {
        false
    }

    fn base_uri(&self) -> Option<&str> {
        None
    }
}

/// Configuration of an [`XmlSignatureFactory`](crate::XmlSignatureFactory).
#[derive(Clone, Default)]
pub struct FactoryConfig {
    /// Named provider asked first for transforms and canonicalization
    /// methods.  The built-in provider is the fallback.
    pub provider: Option<Arc<dyn TransformProvider>>,
    /// Apply the secure validation policy to every resolution.
    pub secure_validation: bool,
    pub policy: SecureValidationPolicy,
}

impl FactoryConfig {
    pub fn with_provider(mut self, provider: Arc<dyn TransformProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_secure_validation(mut self, secure_validation: bool) -> Self {
        self.secure_validation = secure_validation;
        self
    }

    pub fn with_policy(mut self, policy: SecureValidationPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl fmt::Debug for FactoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryConfig")
            .field("provider", &self.provider.as_ref().map(|p| p.name().to_owned()))
            .field("secure_validation", &self.secure_validation)
            .field("policy", &self.policy)
            .finish()
    }
}
