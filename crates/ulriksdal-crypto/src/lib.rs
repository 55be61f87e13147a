#![forbid(unsafe_code)]

//! Cryptographic algorithm implementations for the Ulriksdal XML-DSig library.
//!
//! Provides digests and signature algorithms keyed by their XML-DSig URIs,
//! and the [`CryptoProvider`] seam the higher layers call through.

pub mod digest;
pub mod provider;
pub mod sign;

pub use digest::DigestAlgorithm;
pub use provider::{CryptoProvider, RustCryptoProvider};
pub use sign::{KeyMaterial, SignatureAlgorithm};
