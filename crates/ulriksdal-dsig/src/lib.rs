#![forbid(unsafe_code)]

//! XML Digital Signature (XML-DSig) algorithm factory.
//!
//! Resolves algorithm URIs into method instances, builds signature
//! structures from validated parts, and unmarshals `<Signature>` elements.

pub mod catalog;
pub mod context;
pub mod factory;
pub mod methods;
pub mod params;
pub mod structures;
mod unmarshal;

pub use context::{CryptoContext, FactoryConfig, UnmarshalContext, ValidateContext};
pub use factory::XmlSignatureFactory;
pub use methods::{CanonicalizationMethod, DigestMethod, SignatureFamily, SignatureMethod, Transform};
pub use params::{AlgorithmParameters, HmacParameterSpec};
pub use structures::{
    Data, KeyInfo, KeyInfoContent, Manifest, ObjectContent, Reference, SignatureProperties,
    SignatureProperty, SignatureValue, SignedInfo, XmlObject, XmlSignature,
};
