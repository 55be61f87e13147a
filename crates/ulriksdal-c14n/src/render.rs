#![forbid(unsafe_code)]

//! Rendering of namespace declarations and attributes in canonical order.

use std::cmp::Ordering;
use std::io::Write;

use crate::escape;

/// A namespace declaration to be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NsDecl {
    /// The prefix ("" for default namespace).
    pub prefix: String,
    /// The namespace URI ("" undeclares the default namespace).
    pub uri: String,
}

impl NsDecl {
    pub fn write_to(&self, out: &mut dyn Write) -> std::io::Result<()> {
        let uri = escape::escape_attr(&self.uri);
        if self.prefix.is_empty() {
            write!(out, " xmlns=\"{uri}\"")
        } else {
            write!(out, " xmlns:{}=\"{uri}\"", self.prefix)
        }
    }
}

impl Ord for NsDecl {
    fn cmp(&self, other: &Self) -> Ordering {
        // The empty prefix sorts before every other string, which puts the
        // default namespace first as C14N requires.
        self.prefix.cmp(&other.prefix)
    }
}

impl PartialOrd for NsDecl {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// An attribute to be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    /// The namespace URI of the attribute ("" for no namespace).
    pub ns_uri: String,
    pub local_name: String,
    /// The name as written (prefix:local or just local).
    pub qualified_name: String,
    pub value: String,
}

impl Attr {
    pub fn write_to(&self, out: &mut dyn Write) -> std::io::Result<()> {
        write!(
            out,
            " {}=\"{}\"",
            self.qualified_name,
            escape::escape_attr(&self.value)
        )
    }
}

impl Ord for Attr {
    fn cmp(&self, other: &Self) -> Ordering {
        // Sort key is (namespace URI, local name).  Unqualified attributes
        // have an empty namespace URI and therefore come first.
        self.ns_uri
            .cmp(&other.ns_uri)
            .then_with(|| self.local_name.cmp(&other.local_name))
    }
}

impl PartialOrd for Attr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(ns: &str, local: &str, qname: &str) -> Attr {
        Attr {
            ns_uri: ns.into(),
            local_name: local.into(),
            qualified_name: qname.into(),
            value: String::new(),
        }
    }

    #[test]
    fn test_attribute_order() {
        let mut attrs = vec![
            attr("urn:b", "a", "b:a"),
            attr("", "z", "z"),
            attr("urn:a", "z", "a:z"),
            attr("", "b", "b"),
        ];
        attrs.sort();
        let names: Vec<_> = attrs.iter().map(|a| a.qualified_name.as_str()).collect();
        assert_eq!(names, ["b", "z", "a:z", "b:a"]);
    }

    #[test]
    fn test_ns_decl_rendering() {
        let mut out = Vec::new();
        let mut decls = vec![
            NsDecl { prefix: "x".into(), uri: "urn:x".into() },
            NsDecl { prefix: String::new(), uri: "urn:d".into() },
        ];
        decls.sort();
        for d in &decls {
            d.write_to(&mut out).unwrap();
        }
        assert_eq!(out, b" xmlns=\"urn:d\" xmlns:x=\"urn:x\"");
    }
}
