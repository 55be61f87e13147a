#![forbid(unsafe_code)]

//! XML document abstraction for the Ulriksdal XML-DSig library.
//!
//! Provides a DOM-like interface over `roxmltree`, plus `NodeSet` operations
//! needed for canonicalization and signature transforms.

pub mod document;
pub mod nodeset;
pub mod qname;
pub mod structure;

pub use document::{DomNode, XmlDocument};
pub use nodeset::NodeSet;
pub use structure::XmlStructure;

/// Return roxmltree parsing options that allow DTD.
///
/// DTD is allowed because roxmltree does not expand external entities or
/// perform entity substitution beyond internal entity declarations, so it
/// is safe.  Signed documents in the wild often carry a DTD.
pub fn parsing_options() -> roxmltree::ParsingOptions {
    roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    }
}

/// Parsing options for untrusted input under secure validation: no DTD.
pub fn secure_parsing_options() -> roxmltree::ParsingOptions {
    roxmltree::ParsingOptions {
        allow_dtd: false,
        ..roxmltree::ParsingOptions::default()
    }
}
