#![forbid(unsafe_code)]

//! Exclusive Canonical XML 1.0 (exc-C14N).
//!
//! Algorithm URI: `http://www.w3.org/2001/10/xml-exc-c14n#`
//! With comments: `http://www.w3.org/2001/10/xml-exc-c14n#WithComments`
//!
//! The key difference from inclusive C14N: only "visibly utilized" namespace
//! declarations are output.  A namespace is visibly utilized if:
//! 1. Its prefix is used by the element's tag name, OR
//! 2. Its prefix is used by one of the element's attributes, OR
//! 3. The prefix appears in the InclusiveNamespaces PrefixList, OR
//! 4. It's the default namespace and the element is in that namespace.
//!
//! A declaration is emitted only if the nearest output ancestor has not
//! already rendered the same binding.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

use roxmltree::{Node, NodeType};
use ulriksdal_core::Error;
use ulriksdal_xml::{qname, NodeSet};

use crate::escape;
use crate::render::{Attr, NsDecl};

/// Token in a PrefixList that stands for the default namespace.
pub const DEFAULT_PREFIX_TOKEN: &str = "#default";

/// Canonicalize using Exclusive C14N 1.0, writing into `out`.
pub fn canonicalize(
    doc: &roxmltree::Document<'_>,
    with_comments: bool,
    node_set: Option<&NodeSet>,
    inclusive_prefixes: &[String],
    out: &mut dyn Write,
) -> Result<(), Error> {
    let mut ctx = ExcC14nContext {
        with_comments,
        node_set,
        inclusive_prefixes: normalize_prefixes(inclusive_prefixes),
        out,
    };
    ctx.process_node(doc.root(), &BTreeMap::new())
}

/// Map PrefixList tokens to the prefixes used internally (`#default` → "").
fn normalize_prefixes(prefixes: &[String]) -> BTreeSet<String> {
    prefixes
        .iter()
        .map(|p| {
            if p == DEFAULT_PREFIX_TOKEN {
                String::new()
            } else {
                p.clone()
            }
        })
        .collect()
}

struct ExcC14nContext<'a> {
    with_comments: bool,
    node_set: Option<&'a NodeSet>,
    inclusive_prefixes: BTreeSet<String>,
    out: &'a mut dyn Write,
}

impl ExcC14nContext<'_> {
    fn is_visible(&self, node: &Node<'_, '_>) -> bool {
        match self.node_set {
            None => true,
            Some(ns) => ns.contains(node),
        }
    }

    fn process_node(
        &mut self,
        node: Node<'_, '_>,
        rendered_ns: &BTreeMap<String, String>,
    ) -> Result<(), Error> {
        match node.node_type() {
            NodeType::Root => {
                for child in node.children() {
                    self.process_node(child, rendered_ns)?;
                }
            }
            NodeType::Element => self.process_element(node, rendered_ns)?,
            NodeType::Text => {
                if self.is_visible(&node) {
                    let text = node.text().unwrap_or("");
                    self.out.write_all(escape::escape_text(text).as_bytes())?;
                }
            }
            NodeType::Comment => {
                if self.with_comments && self.is_visible(&node) {
                    let text = node.text().unwrap_or("");
                    self.write_top_level(&node, |out| {
                        write!(out, "<!--{text}-->")
                    })?;
                }
            }
            NodeType::PI => {
                if self.is_visible(&node) {
                    if let Some(pi) = node.pi() {
                        self.write_top_level(&node, |out| {
                            write!(out, "<?{}", pi.target)?;
                            if let Some(value) = pi.value.filter(|v| !v.is_empty()) {
                                write!(out, " {}", escape::escape_pi(value))?;
                            }
                            out.write_all(b"?>")
                        })?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Write a comment or PI, adding the line breaks C14N requires around
    /// nodes that sit outside the document element.
    fn write_top_level(
        &mut self,
        node: &Node<'_, '_>,
        body: impl FnOnce(&mut dyn Write) -> std::io::Result<()>,
    ) -> Result<(), Error> {
        let parent_is_root = node.parent().is_some_and(|p| p.is_root());
        if parent_is_root && node.prev_siblings().any(|s| s.is_element()) {
            self.out.write_all(b"\n")?;
        }
        body(&mut *self.out)?;
        if parent_is_root && node.next_siblings().any(|s| s.is_element()) {
            self.out.write_all(b"\n")?;
        }
        Ok(())
    }

    fn process_element(
        &mut self,
        node: Node<'_, '_>,
        rendered_ns: &BTreeMap<String, String>,
    ) -> Result<(), Error> {
        if !self.is_visible(&node) {
            // Namespace declarations are only rendered on visible element
            // start tags; descendants keep the same rendering context.
            for child in node.children() {
                self.process_node(child, rendered_ns)?;
            }
            return Ok(());
        }

        // Determine which namespace prefixes are "visibly utilized".
        let mut utilized: BTreeSet<String> = BTreeSet::new();
        utilized.insert(qname::element_prefix(&node).unwrap_or("").to_owned());
        for attr in node.attributes() {
            if let Some(prefix) = qname::attribute_prefix(&node, &attr) {
                utilized.insert(prefix);
            }
        }
        utilized.extend(self.inclusive_prefixes.iter().cloned());

        let in_scope: BTreeMap<String, String> =
            qname::in_scope_namespaces(&node).into_iter().collect();

        let mut ns_decls: Vec<NsDecl> = Vec::new();
        for prefix in &utilized {
            if prefix == "xml" {
                continue;
            }
            match in_scope.get(prefix) {
                Some(uri) => {
                    if rendered_ns.get(prefix) != Some(uri) {
                        ns_decls.push(NsDecl {
                            prefix: prefix.clone(),
                            uri: uri.clone(),
                        });
                    }
                }
                None if prefix.is_empty() => {
                    // The element is in no namespace but an output ancestor
                    // rendered a default namespace: undeclare it.
                    if rendered_ns.get("").is_some_and(|u| !u.is_empty()) {
                        ns_decls.push(NsDecl {
                            prefix: String::new(),
                            uri: String::new(),
                        });
                    }
                }
                // Listed prefixes that are not in scope contribute nothing.
                None => {}
            }
        }
        ns_decls.sort();

        let mut attrs: Vec<Attr> = node
            .attributes()
            .map(|attr| Attr {
                ns_uri: attr.namespace().unwrap_or("").to_owned(),
                local_name: attr.name().to_owned(),
                qualified_name: qname::attribute_qname(&node, &attr),
                value: attr.value().to_owned(),
            })
            .collect();
        attrs.sort();

        let elem_name = qname::element_qname(&node);

        write!(self.out, "<{elem_name}")?;
        for ns_decl in &ns_decls {
            ns_decl.write_to(&mut *self.out)?;
        }
        for attr in &attrs {
            attr.write_to(&mut *self.out)?;
        }
        self.out.write_all(b">")?;

        let mut child_rendered = rendered_ns.clone();
        for ns_decl in ns_decls {
            child_rendered.insert(ns_decl.prefix, ns_decl.uri);
        }

        for child in node.children() {
            self.process_node(child, &child_rendered)?;
        }

        write!(self.out, "</{elem_name}>")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exc(xml: &str, with_comments: bool, prefixes: &[&str]) -> String {
        let doc = roxmltree::Document::parse(xml).unwrap();
        let prefixes: Vec<String> = prefixes.iter().map(|s| s.to_string()).collect();
        let mut out = Vec::new();
        canonicalize(&doc, with_comments, None, &prefixes, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_unused_namespace_is_dropped() {
        let out = exc(
            r#"<a xmlns:x="urn:x" xmlns:y="urn:y"><x:b/></a>"#,
            false,
            &[],
        );
        assert_eq!(out, r#"<a><x:b xmlns:x="urn:x"></x:b></a>"#);
    }

    #[test]
    fn test_inclusive_prefix_is_forced() {
        let out = exc(
            r#"<a xmlns:x="urn:x" xmlns:y="urn:y"><x:b/></a>"#,
            false,
            &["y"],
        );
        assert_eq!(out, r#"<a xmlns:y="urn:y"><x:b xmlns:x="urn:x"></x:b></a>"#);
    }

    #[test]
    fn test_default_token_forces_default_namespace() {
        let out = exc(
            r#"<p:a xmlns:p="urn:p" xmlns="urn:d"><p:b/></p:a>"#,
            false,
            &["#default"],
        );
        assert_eq!(out, r#"<p:a xmlns="urn:d" xmlns:p="urn:p"><p:b></p:b></p:a>"#);
    }

    #[test]
    fn test_attribute_prefix_is_utilized_and_sorted() {
        let out = exc(
            r#"<a xmlns:z="urn:z" b="2" z:c="3" a="1"/>"#,
            false,
            &[],
        );
        assert_eq!(out, r#"<a xmlns:z="urn:z" a="1" b="2" z:c="3"></a>"#);
    }

    #[test]
    fn test_attribute_keeps_written_prefix_when_namespace_shared() {
        let out = exc(
            r#"<a xmlns:p="urn:s" xmlns:q="urn:s" q:attr="1"><b p:attr="2"/></a>"#,
            false,
            &[],
        );
        assert_eq!(
            out,
            r#"<a xmlns:q="urn:s" q:attr="1"><b xmlns:p="urn:s" p:attr="2"></b></a>"#
        );
    }

    #[test]
    fn test_default_namespace_undeclared() {
        let out = exc(r#"<a xmlns="urn:d"><b xmlns=""/></a>"#, false, &[]);
        assert_eq!(out, r#"<a xmlns="urn:d"><b xmlns=""></b></a>"#);
    }

    #[test]
    fn test_redundant_redeclaration_is_suppressed() {
        let out = exc(
            r#"<x:a xmlns:x="urn:x"><x:b xmlns:x="urn:x"/></x:a>"#,
            false,
            &[],
        );
        assert_eq!(out, r#"<x:a xmlns:x="urn:x"><x:b></x:b></x:a>"#);
    }

    #[test]
    fn test_comments_follow_mode() {
        let xml = "<!--head--><a><!--in-->t</a><!--tail-->";
        assert_eq!(exc(xml, false, &[]), "<a>t</a>");
        assert_eq!(
            exc(xml, true, &[]),
            "<!--head-->\n<a><!--in-->t</a>\n<!--tail-->"
        );
    }

    #[test]
    fn test_processing_instruction_and_escaping() {
        let out = exc("<?pi data?><a t=\"&quot;&lt;\">1 &lt; 2 &amp; 3 > 2</a>", false, &[]);
        assert_eq!(out, "<?pi data?>\n<a t=\"&quot;&lt;\">1 &lt; 2 &amp; 3 &gt; 2</a>");
    }

    #[test]
    fn test_subset_omits_invisible_ancestors() {
        let xml = r#"<r xmlns:x="urn:x" xmlns:y="urn:y"><x:s y:attr="v"><c/></x:s></r>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        let s = doc.descendants().find(|n| n.has_tag_name(("urn:x", "s"))).unwrap();
        let set = NodeSet::tree_without_comments(s);
        let mut out = Vec::new();
        canonicalize(&doc, false, Some(&set), &[], &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"<x:s xmlns:x="urn:x" xmlns:y="urn:y" y:attr="v"><c></c></x:s>"#
        );
    }
}
