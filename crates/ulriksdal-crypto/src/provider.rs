#![forbid(unsafe_code)]

//! Crypto provider seam.
//!
//! Everything above this crate asks a [`CryptoProvider`] for digest and
//! signature work by algorithm URI, so the arithmetic can be swapped out
//! without touching the factory or the transforms.

use ulriksdal_core::Error;

use crate::digest::{self, DigestAlgorithm};
use crate::sign::{self, KeyMaterial, SignatureAlgorithm};

/// Digest and signature operations addressed by algorithm URI.
pub trait CryptoProvider: Send + Sync {
    /// Provider name, for logs.
    fn name(&self) -> &str;

    fn digest_algorithm(&self, uri: &str) -> Result<Box<dyn DigestAlgorithm>, Error>;

    fn signature_algorithm(&self, uri: &str) -> Result<Box<dyn SignatureAlgorithm>, Error>;

    /// An HMAC algorithm whose output is truncated to `output_bits`.
    fn truncated_hmac(
        &self,
        uri: &str,
        output_bits: usize,
    ) -> Result<Box<dyn SignatureAlgorithm>, Error> {
        tracing::trace!(uri, output_bits, provider = self.name(), "truncated HMAC");
        sign::hmac_with_output_length(uri, output_bits)
    }

    /// Compute a digest in one shot.
    fn digest(&self, uri: &str, data: &[u8]) -> Result<Vec<u8>, Error> {
        let mut hasher = self.digest_algorithm(uri)?;
        hasher.update(data);
        Ok(hasher.finalize())
    }

    fn sign(&self, uri: &str, key: &KeyMaterial, data: &[u8]) -> Result<Vec<u8>, Error> {
        tracing::trace!(uri, provider = self.name(), key = key.kind(), "signing");
        self.signature_algorithm(uri)?.sign(key, data)
    }

    fn verify(&self, uri: &str, key: &KeyMaterial, data: &[u8], sig: &[u8]) -> Result<bool, Error> {
        tracing::trace!(uri, provider = self.name(), key = key.kind(), "verifying");
        self.signature_algorithm(uri)?.verify(key, data, sig)
    }

    fn supports_digest(&self, uri: &str) -> bool {
        self.digest_algorithm(uri).is_ok()
    }

    fn supports_signature(&self, uri: &str) -> bool {
        self.signature_algorithm(uri).is_ok()
    }
}

/// The built-in provider, backed by the RustCrypto crates.
#[derive(Debug, Default, Clone, Copy)]
pub struct RustCryptoProvider;

impl CryptoProvider for RustCryptoProvider {
    fn name(&self) -> &str {
        "RustCrypto"
    }

    fn digest_algorithm(&self, uri: &str) -> Result<Box<dyn DigestAlgorithm>, Error> {
        digest::from_uri(uri)
    }

    fn signature_algorithm(&self, uri: &str) -> Result<Box<dyn SignatureAlgorithm>, Error> {
        sign::from_uri(uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulriksdal_core::algorithm;

    #[test]
    fn test_provider_dispatch() {
        let provider = RustCryptoProvider;
        assert!(provider.supports_digest(algorithm::SHA256));
        assert!(provider.supports_signature(algorithm::ECDSA_SHA256));
        assert!(!provider.supports_digest(algorithm::HMAC_SHA256));
        assert!(!provider.supports_signature("urn:nothing"));
        assert_eq!(provider.digest(algorithm::SHA512, b"").unwrap().len(), 64);
    }

    #[test]
    fn test_provider_as_trait_object() {
        let provider: &dyn CryptoProvider = &RustCryptoProvider;
        let key = KeyMaterial::Hmac(b"k".to_vec());
        let mac = provider.sign(algorithm::HMAC_SHA1, &key, b"m").unwrap();
        assert!(provider.verify(algorithm::HMAC_SHA1, &key, b"m", &mac).unwrap());
    }
}
