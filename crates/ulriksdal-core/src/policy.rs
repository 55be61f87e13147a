#![forbid(unsafe_code)]

//! Secure validation policy.
//!
//! When secure validation is requested, algorithm resolution consults this
//! policy and refuses algorithms that are known to be weak, and
//! unmarshalling enforces upper bounds on the amount of work a signature
//! may demand.

use crate::{algorithm, Error};

/// Limits and disallowed algorithms applied under secure validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecureValidationPolicy {
    /// Algorithm URIs that must never be resolved.
    pub disallowed_algorithms: Vec<String>,
    /// Maximum number of `<Reference>` elements in one `<SignedInfo>`.
    pub max_references: usize,
    /// Maximum number of `<Transform>` elements in one `<Reference>`.
    pub max_transforms: usize,
}

impl SecureValidationPolicy {
    /// Whether `uri` is on the disallow-list.
    pub fn is_disallowed(&self, uri: &str) -> bool {
        self.disallowed_algorithms.iter().any(|a| a == uri)
    }

    /// Fail with [`Error::ForbiddenAlgorithm`] if `uri` is disallowed.
    pub fn check_algorithm(&self, uri: &str) -> Result<(), Error> {
        if self.is_disallowed(uri) {
            tracing::warn!(uri, "algorithm rejected by secure validation");
            return Err(Error::ForbiddenAlgorithm(uri.to_owned()));
        }
        Ok(())
    }

    /// Add an algorithm URI to the disallow-list.
    pub fn disallow(mut self, uri: &str) -> Self {
        if !self.is_disallowed(uri) {
            self.disallowed_algorithms.push(uri.to_owned());
        }
        self
    }
}

impl Default for SecureValidationPolicy {
    fn default() -> Self {
        let disallowed = [
            algorithm::XSLT,
            algorithm::MD5,
            algorithm::RSA_MD5,
            algorithm::HMAC_MD5,
            algorithm::RSA_SHA1,
            algorithm::DSA_SHA1,
            algorithm::ECDSA_SHA1,
        ];
        Self {
            disallowed_algorithms: disallowed.iter().map(|s| (*s).to_owned()).collect(),
            max_references: 30,
            max_transforms: 5,
        }
    }
}
