#![forbid(unsafe_code)]

//! The algorithm URI catalog.
//!
//! Each family is a map from URI to the constructor of its method type,
//! built on first use.  Lookup is exact and case-sensitive.

use std::collections::HashMap;
use std::sync::LazyLock;

use ulriksdal_core::{algorithm, Error};

use crate::methods::{DigestMethod, SignatureFamily, SignatureMethod};
use crate::params::AlgorithmParameters;

pub(crate) type DigestConstructor =
    fn(&'static str, Option<AlgorithmParameters>) -> Result<DigestMethod, Error>;

pub(crate) type SignatureConstructor =
    fn(&'static str, Option<AlgorithmParameters>) -> Result<SignatureMethod, Error>;

static DIGESTS: LazyLock<HashMap<&'static str, DigestConstructor>> = LazyLock::new(|| {
    [
        algorithm::SHA1,
        algorithm::SHA224,
        algorithm::SHA256,
        algorithm::SHA384,
        algorithm::SHA512,
        algorithm::RIPEMD160,
    ]
    .into_iter()
    .map(|uri| (uri, DigestMethod::build as DigestConstructor))
    .collect()
});

fn rsa(uri: &'static str, params: Option<AlgorithmParameters>) -> Result<SignatureMethod, Error> {
    SignatureMethod::asymmetric(uri, SignatureFamily::Rsa, params)
}

fn dsa(uri: &'static str, params: Option<AlgorithmParameters>) -> Result<SignatureMethod, Error> {
    SignatureMethod::asymmetric(uri, SignatureFamily::Dsa, params)
}

fn ecdsa(uri: &'static str, params: Option<AlgorithmParameters>) -> Result<SignatureMethod, Error> {
    SignatureMethod::asymmetric(uri, SignatureFamily::Ecdsa, params)
}

static SIGNATURES: LazyLock<HashMap<&'static str, SignatureConstructor>> = LazyLock::new(|| {
    let entries: [(&'static str, SignatureConstructor); 14] = [
        (algorithm::RSA_SHA1, rsa),
        (algorithm::RSA_SHA256, rsa),
        (algorithm::RSA_SHA384, rsa),
        (algorithm::RSA_SHA512, rsa),
        (algorithm::DSA_SHA1, dsa),
        (algorithm::DSA_SHA256, dsa),
        (algorithm::ECDSA_SHA1, ecdsa),
        (algorithm::ECDSA_SHA256, ecdsa),
        (algorithm::ECDSA_SHA384, ecdsa),
        (algorithm::ECDSA_SHA512, ecdsa),
        (algorithm::HMAC_SHA1, SignatureMethod::hmac),
        (algorithm::HMAC_SHA256, SignatureMethod::hmac),
        (algorithm::HMAC_SHA384, SignatureMethod::hmac),
        (algorithm::HMAC_SHA512, SignatureMethod::hmac),
    ];
    entries.into_iter().collect()
});

/// Find the catalog entry for a digest URI.
pub(crate) fn digest(uri: &str) -> Option<(&'static str, DigestConstructor)> {
    DIGESTS.get_key_value(uri).map(|(k, v)| (*k, *v))
}

/// Find the catalog entry for a signature URI.
pub(crate) fn signature(uri: &str) -> Option<(&'static str, SignatureConstructor)> {
    SIGNATURES.get_key_value(uri).map(|(k, v)| (*k, *v))
}

/// Every digest URI in the catalog, sorted.
pub fn digest_uris() -> Vec<&'static str> {
    let mut uris: Vec<_> = DIGESTS.keys().copied().collect();
    uris.sort_unstable();
    uris
}

/// Every signature URI in the catalog, sorted.
pub fn signature_uris() -> Vec<&'static str> {
    let mut uris: Vec<_> = SIGNATURES.keys().copied().collect();
    uris.sort_unstable();
    uris
}

/// Transform URIs the built-in provider implements.
pub fn transform_uris() -> [&'static str; 4] {
    [
        algorithm::EXC_C14N,
        algorithm::EXC_C14N_WITH_COMMENTS,
        algorithm::BASE64,
        algorithm::ENVELOPED_SIGNATURE,
    ]
}

/// Canonicalization URIs the built-in provider implements.
pub fn canonicalization_uris() -> [&'static str; 2] {
    [algorithm::EXC_C14N, algorithm::EXC_C14N_WITH_COMMENTS]
}
