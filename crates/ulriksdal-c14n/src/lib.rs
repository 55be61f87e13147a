#![forbid(unsafe_code)]

//! XML Canonicalization (C14N) for the Ulriksdal XML-DSig library.
//!
//! Implements Exclusive Canonical XML 1.0, with and without comments.
//! Output is written into any [`std::io::Write`] sink.

pub mod escape;
pub mod exclusive;
pub mod render;

use std::io::Write;

use ulriksdal_core::{algorithm, Error};
use ulriksdal_xml::NodeSet;

/// The canonicalization mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum C14nMode {
    /// Exclusive Canonical XML 1.0
    Exclusive,
    /// Exclusive Canonical XML 1.0 with comments
    ExclusiveWithComments,
}

impl C14nMode {
    /// Get the algorithm URI for this mode.
    pub fn uri(&self) -> &'static str {
        match self {
            Self::Exclusive => algorithm::EXC_C14N,
            Self::ExclusiveWithComments => algorithm::EXC_C14N_WITH_COMMENTS,
        }
    }

    /// Parse a C14N mode from an algorithm URI.
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            algorithm::EXC_C14N => Some(Self::Exclusive),
            algorithm::EXC_C14N_WITH_COMMENTS => Some(Self::ExclusiveWithComments),
            _ => None,
        }
    }

    pub fn with_comments(&self) -> bool {
        matches!(self, Self::ExclusiveWithComments)
    }
}

/// Canonicalize an XML document given as text.
///
/// - `xml`: the raw XML text
/// - `mode`: which C14N variant to use
/// - `node_set`: optional node set (for document-subset canonicalization)
/// - `inclusive_prefixes`: the InclusiveNamespaces PrefixList
pub fn canonicalize(
    xml: &str,
    mode: C14nMode,
    node_set: Option<&NodeSet>,
    inclusive_prefixes: &[String],
    out: &mut dyn Write,
) -> Result<(), Error> {
    let doc = roxmltree::Document::parse_with_options(xml, ulriksdal_xml::parsing_options())
        .map_err(|e| Error::XmlParse(e.to_string()))?;
    canonicalize_doc(&doc, mode, node_set, inclusive_prefixes, out)
}

/// Canonicalize a pre-parsed document.
pub fn canonicalize_doc(
    doc: &roxmltree::Document<'_>,
    mode: C14nMode,
    node_set: Option<&NodeSet>,
    inclusive_prefixes: &[String],
    out: &mut dyn Write,
) -> Result<(), Error> {
    tracing::trace!(
        uri = mode.uri(),
        subset = node_set.is_some(),
        prefixes = inclusive_prefixes.len(),
        "exclusive canonicalization"
    );
    exclusive::canonicalize(doc, mode.with_comments(), node_set, inclusive_prefixes, out)
}

/// Canonicalize one element and its descendants.
///
/// Comment nodes inside the subtree are kept only in the with-comments
/// mode; namespaces in scope from ancestors are considered for rendering.
pub fn canonicalize_subtree(
    element: roxmltree::Node<'_, '_>,
    mode: C14nMode,
    inclusive_prefixes: &[String],
    out: &mut dyn Write,
) -> Result<(), Error> {
    let node_set = if mode.with_comments() {
        NodeSet::tree_with_comments(element)
    } else {
        NodeSet::tree_without_comments(element)
    };
    canonicalize_doc(element.document(), mode, Some(&node_set), inclusive_prefixes, out)
}

/// Convenience: canonicalize a document given as text into a new buffer.
pub fn canonicalize_to_vec(
    xml: &str,
    mode: C14nMode,
    inclusive_prefixes: &[String],
) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    canonicalize(xml, mode, None, inclusive_prefixes, &mut out)?;
    Ok(out)
}
