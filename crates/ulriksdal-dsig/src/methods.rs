#![forbid(unsafe_code)]

//! Method instances: digest, signature, canonicalization, transform.
//!
//! Each binds an algorithm URI to validated parameters and is immutable
//! once built.  Instances come from [`XmlSignatureFactory`].
//!
//! [`XmlSignatureFactory`]: crate::XmlSignatureFactory

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use ulriksdal_core::Error;
use ulriksdal_crypto::{CryptoProvider, KeyMaterial};
use ulriksdal_transforms::{
    SignatureInput, TransformOutput, TransformParameterSpec, TransformService,
};

use crate::params::{AlgorithmParameters, HmacParameterSpec};

// ── DigestMethod ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestMethod {
    uri: &'static str,
}

impl DigestMethod {
    /// Catalog constructor.  Digests take no parameters.
    pub(crate) fn build(
        uri: &'static str,
        params: Option<AlgorithmParameters>,
    ) -> Result<Self, Error> {
        if let Some(params) = params {
            return Err(Error::InvalidAlgorithmParameters(format!(
                "digest method {uri} takes no parameters, got {}",
                params.kind()
            )));
        }
        Ok(Self { uri })
    }

    pub fn algorithm(&self) -> &'static str {
        self.uri
    }

    /// Digest `data` with `provider`.
    pub fn digest(&self, provider: &dyn CryptoProvider, data: &[u8]) -> Result<Vec<u8>, Error> {
        provider.digest(self.uri, data)
    }
}

// ── SignatureMethod ──────────────────────────────────────────────────

/// The kind of key a signature algorithm works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureFamily {
    Rsa,
    Dsa,
    Ecdsa,
    Hmac,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureMethod {
    uri: &'static str,
    family: SignatureFamily,
    hmac: Option<HmacParameterSpec>,
}

impl SignatureMethod {
    /// Catalog constructor for public-key algorithms, which take no
    /// parameters.
    pub(crate) fn asymmetric(
        uri: &'static str,
        family: SignatureFamily,
        params: Option<AlgorithmParameters>,
    ) -> Result<Self, Error> {
        if let Some(params) = params {
            return Err(Error::InvalidAlgorithmParameters(format!(
                "signature method {uri} takes no parameters, got {}",
                params.kind()
            )));
        }
        Ok(Self {
            uri,
            family,
            hmac: None,
        })
    }

    /// Catalog constructor for HMAC algorithms.
    ///
    /// An output length must be a multiple of 8, no longer than the hash and
    /// no shorter than half of it or 80 bits, whichever is larger.
    pub(crate) fn hmac(
        uri: &'static str,
        params: Option<AlgorithmParameters>,
    ) -> Result<Self, Error> {
        let spec = match params {
            None => None,
            Some(AlgorithmParameters::Hmac(spec)) => Some(spec),
            Some(other) => {
                return Err(Error::InvalidAlgorithmParameters(format!(
                    "HMAC method {uri} needs HMAC parameters, got {}",
                    other.kind()
                )))
            }
        };
        if let Some(spec) = spec {
            let hash_bits = ulriksdal_crypto::sign::hmac_hash_bits(uri)
                .ok_or_else(|| Error::UnsupportedAlgorithm(uri.to_owned()))?;
            let bits = spec.output_length();
            let min = usize::max(80, hash_bits / 2);
            if bits < min || bits > hash_bits || bits % 8 != 0 {
                return Err(Error::InvalidAlgorithmParameters(format!(
                    "HMACOutputLength {bits} for {uri} must be a multiple of 8 between {min} and {hash_bits}"
                )));
            }
        }
        Ok(Self {
            uri,
            family: SignatureFamily::Hmac,
            hmac: spec,
        })
    }

    pub fn algorithm(&self) -> &'static str {
        self.uri
    }

    pub fn family(&self) -> SignatureFamily {
        self.family
    }

    pub fn params(&self) -> Option<AlgorithmParameters> {
        self.hmac.map(AlgorithmParameters::Hmac)
    }

    fn output_bits(&self) -> Option<usize> {
        self.hmac.map(|spec| spec.output_length())
    }

    /// Sign `data`, truncating an HMAC to its configured output length.
    pub fn sign(
        &self,
        provider: &dyn CryptoProvider,
        key: &KeyMaterial,
        data: &[u8],
    ) -> Result<Vec<u8>, Error> {
        match self.output_bits() {
            None => provider.sign(self.uri, key, data),
            Some(bits) => provider.truncated_hmac(self.uri, bits)?.sign(key, data),
        }
    }

    pub fn verify(
        &self,
        provider: &dyn CryptoProvider,
        key: &KeyMaterial,
        data: &[u8],
        signature: &[u8],
    ) -> Result<bool, Error> {
        match self.output_bits() {
            None => provider.verify(self.uri, key, data, signature),
            Some(bits) => provider
                .truncated_hmac(self.uri, bits)?
                .verify(key, data, signature),
        }
    }
}

// ── Transform ────────────────────────────────────────────────────────

/// A resolved transform algorithm.
#[derive(Clone)]
pub struct Transform {
    service: Arc<dyn TransformService>,
    base_uri: Option<String>,
}

impl Transform {
    pub(crate) fn new(service: Arc<dyn TransformService>) -> Self {
        Self {
            service,
            base_uri: None,
        }
    }

    /// Bind the base URI of the document the transform was read from.
    pub(crate) fn with_base_uri(mut self, base_uri: Option<&str>) -> Self {
        self.base_uri = base_uri.map(str::to_owned);
        self
    }

    pub fn algorithm(&self) -> &'static str {
        self.service.uri()
    }

    pub fn params(&self) -> Option<AlgorithmParameters> {
        match self.service.params()? {
            TransformParameterSpec::ExcC14n(spec) => Some(AlgorithmParameters::ExcC14n(spec)),
            _ => None,
        }
    }

    /// Base URI bound when the transform was unmarshalled.
    pub fn base_uri(&self) -> Option<&str> {
        self.base_uri.as_deref()
    }

    pub(crate) fn is_canonicalization(&self) -> bool {
        self.service.is_canonicalization()
    }

    /// Run the transform.  See [`TransformService::transform`].
    ///
    /// Without an explicit `base_uri` the bound one is used.
    pub fn transform<'s>(
        &self,
        input: SignatureInput,
        element: Option<roxmltree::Node<'_, '_>>,
        base_uri: Option<&str>,
        sink: Option<&'s mut dyn Write>,
    ) -> Result<TransformOutput<'s>, Error> {
        self.service
            .transform(input, element, base_uri.or(self.base_uri()), sink)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform")
            .field("algorithm", &self.algorithm())
            .field("params", &self.service.params())
            .field("base_uri", &self.base_uri)
            .finish()
    }
}

// ── CanonicalizationMethod ───────────────────────────────────────────

/// A transform that is a canonicalization algorithm.
#[derive(Debug, Clone)]
pub struct CanonicalizationMethod {
    transform: Transform,
}

impl CanonicalizationMethod {
    pub(crate) fn new(transform: Transform) -> Result<Self, Error> {
        if !transform.is_canonicalization() {
            return Err(Error::InvalidAlgorithmParameters(format!(
                "{} is not a canonicalization algorithm",
                transform.algorithm()
            )));
        }
        Ok(Self { transform })
    }

    pub fn algorithm(&self) -> &'static str {
        self.transform.algorithm()
    }

    pub fn params(&self) -> Option<AlgorithmParameters> {
        self.transform.params()
    }

    /// The method viewed as a plain transform.
    pub fn as_transform(&self) -> &Transform {
        &self.transform
    }

    pub(crate) fn with_base_uri(self, base_uri: Option<&str>) -> Self {
        Self {
            transform: self.transform.with_base_uri(base_uri),
        }
    }

    pub fn base_uri(&self) -> Option<&str> {
        self.transform.base_uri()
    }

    pub fn canonicalize<'s>(
        &self,
        input: SignatureInput,
        element: Option<roxmltree::Node<'_, '_>>,
        base_uri: Option<&str>,
        sink: Option<&'s mut dyn Write>,
    ) -> Result<TransformOutput<'s>, Error> {
        self.transform.transform(input, element, base_uri, sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulriksdal_core::algorithm;
    use ulriksdal_crypto::RustCryptoProvider;

    #[test]
    fn test_digest_rejects_params() {
        let err = DigestMethod::build(
            algorithm::SHA256,
            Some(AlgorithmParameters::Hmac(HmacParameterSpec::new(128))),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidAlgorithmParameters(_)));
    }

    #[test]
    fn test_hmac_output_length_limits() {
        let ok = |bits| {
            SignatureMethod::hmac(
                algorithm::HMAC_SHA256,
                Some(HmacParameterSpec::new(bits).into()),
            )
        };
        assert!(ok(128).is_ok());
        assert!(ok(256).is_ok());
        assert!(matches!(ok(120), Err(Error::InvalidAlgorithmParameters(_))));
        assert!(matches!(ok(264), Err(Error::InvalidAlgorithmParameters(_))));
        assert!(matches!(ok(130), Err(Error::InvalidAlgorithmParameters(_))));

        // For SHA-1 the 80-bit floor applies.
        assert!(SignatureMethod::hmac(algorithm::HMAC_SHA1, Some(HmacParameterSpec::new(80).into())).is_ok());
        assert!(SignatureMethod::hmac(algorithm::HMAC_SHA1, Some(HmacParameterSpec::new(72).into())).is_err());
    }

    #[test]
    fn test_truncated_hmac_round_trip() {
        let provider = RustCryptoProvider;
        let key = KeyMaterial::Hmac(b"key".to_vec());
        let method = SignatureMethod::hmac(
            algorithm::HMAC_SHA256,
            Some(HmacParameterSpec::new(128).into()),
        )
        .unwrap();
        let mac = method.sign(&provider, &key, b"msg").unwrap();
        assert_eq!(mac.len(), 16);
        assert!(method.verify(&provider, &key, b"msg", &mac).unwrap());
        assert!(!method.verify(&provider, &key, b"other", &mac).unwrap());

        let full = SignatureMethod::hmac(algorithm::HMAC_SHA256, None).unwrap();
        let full_mac = full.sign(&provider, &key, b"msg").unwrap();
        assert_eq!(full_mac.len(), 32);
        assert_eq!(full_mac[..16], mac[..]);
        assert!(!full.verify(&provider, &key, b"msg", &mac).unwrap());
    }

    #[test]
    fn test_transform_falls_back_to_bound_base_uri() {
        let service: Arc<dyn TransformService> =
            Arc::new(ulriksdal_transforms::base64_transform::Base64DecodeTransform);
        let plain = Transform::new(service.clone());
        assert_eq!(plain.base_uri(), None);
        let bound = Transform::new(service).with_base_uri(Some("file:///sig.xml"));
        assert_eq!(bound.base_uri(), Some("file:///sig.xml"));
        let out = bound
            .transform(SignatureInput::from_octets(b"aGk=".to_vec()), None, None, None)
            .unwrap();
        assert_eq!(out.bytes().unwrap(), b"hi");
    }
}
