#![forbid(unsafe_code)]

//! Qualified-name recovery.
//!
//! roxmltree resolves every name to its expanded (namespace URI, local
//! name) form and does not keep the prefix an element or attribute was
//! written with.  Canonical output must reproduce the original qualified
//! names, so the prefixes are recovered here from the source text and the
//! in-scope namespace bindings.

use ulriksdal_core::ns;

/// The prefix of an element's start tag, or `None` when it is unprefixed.
pub fn element_prefix<'a>(node: &roxmltree::Node<'a, '_>) -> Option<&'a str> {
    if !node.is_element() {
        return None;
    }
    let start_tag = start_tag_text(node)?;
    let name_end = start_tag
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .unwrap_or(start_tag.len());
    let (prefix, _) = start_tag[..name_end].split_once(':')?;
    Some(prefix)
}

/// The element's name as written: `prefix:local` or `local`.
pub fn element_qname(node: &roxmltree::Node<'_, '_>) -> String {
    let local = node.tag_name().name();
    match element_prefix(node) {
        Some(prefix) => format!("{prefix}:{local}"),
        None => local.to_owned(),
    }
}

/// The prefix an attribute was written with.
///
/// Unqualified attributes have no prefix.  Attributes in the XML namespace
/// always use `xml`.  Otherwise the prefix is read from the attribute's own
/// qualified name in the source, so two prefixes bound to the same
/// namespace stay distinct.
pub fn attribute_prefix(
    node: &roxmltree::Node<'_, '_>,
    attr: &roxmltree::Attribute<'_, '_>,
) -> Option<String> {
    let uri = attr.namespace()?;
    if uri == ns::XML {
        return Some("xml".to_owned());
    }
    let written = node
        .document()
        .input_text()
        .get(attr.range_qname())
        .and_then(|qname| qname.split_once(':'));
    match written {
        Some((prefix, _)) => Some(prefix.to_owned()),
        None => node
            .namespaces()
            .find(|n| n.uri() == uri)
            .and_then(|n| n.name())
            .map(str::to_owned),
    }
}

/// The attribute's name as written: `prefix:local` or `local`.
pub fn attribute_qname(node: &roxmltree::Node<'_, '_>, attr: &roxmltree::Attribute<'_, '_>) -> String {
    match attribute_prefix(node, attr) {
        Some(prefix) => format!("{prefix}:{}", attr.name()),
        None => attr.name().to_owned(),
    }
}

/// The in-scope namespace bindings of an element as (prefix, uri) pairs.
///
/// The default namespace uses the empty prefix.  Undeclarations
/// (`xmlns=""`) leave no binding.
pub fn in_scope_namespaces(node: &roxmltree::Node<'_, '_>) -> Vec<(String, String)> {
    node.namespaces()
        .filter(|n| !n.uri().is_empty())
        .map(|n| (n.name().unwrap_or("").to_owned(), n.uri().to_owned()))
        .collect()
}

/// Source text from just after the element's opening `<`.
fn start_tag_text<'a>(node: &roxmltree::Node<'a, '_>) -> Option<&'a str> {
    let input = node.document().input_text();
    let range = node.range();
    input.get(range.start..)?.strip_prefix('<')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first<'a, 'i>(doc: &'a roxmltree::Document<'i>, local: &str) -> roxmltree::Node<'a, 'i> {
        doc.descendants()
            .find(|n| n.is_element() && n.tag_name().name() == local)
            .unwrap()
    }

    #[test]
    fn test_element_prefix() {
        let doc = roxmltree::Document::parse(
            r#"<a xmlns:x="urn:x"><x:b/><c xmlns="urn:x"/><x:d>t</x:d></a>"#,
        )
        .unwrap();
        assert_eq!(element_prefix(&first(&doc, "a")), None);
        assert_eq!(element_prefix(&first(&doc, "b")), Some("x"));
        // Same namespace URI, but written unprefixed.
        assert_eq!(element_prefix(&first(&doc, "c")), None);
        assert_eq!(element_qname(&first(&doc, "d")), "x:d");
    }

    #[test]
    fn test_attribute_prefix_prefers_written_form() {
        let doc = roxmltree::Document::parse(
            r#"<a xmlns:p="urn:same" xmlns:q="urn:same" q:attr="1" xml:lang="en" plain="2"/>"#,
        )
        .unwrap();
        let a = doc.root_element();
        for attr in a.attributes() {
            let qname = attribute_qname(&a, &attr);
            match attr.name() {
                "attr" => assert_eq!(qname, "q:attr"),
                "lang" => assert_eq!(qname, "xml:lang"),
                "plain" => assert_eq!(qname, "plain"),
                other => panic!("unexpected attribute {other}"),
            }
        }
    }

    #[test]
    fn test_attribute_prefix_ignores_descendants_and_suffixes() {
        let doc = roxmltree::Document::parse(
            r#"<a xmlns:p="urn:s" xmlns:q="urn:s" xmlns:xp="urn:s" q:attr="1"><b p:attr="2" xp:other="3"/></a>"#,
        )
        .unwrap();
        let a = doc.root_element();
        let attr = a.attributes().next().unwrap();
        assert_eq!(attribute_qname(&a, &attr), "q:attr");
        let b = first(&doc, "b");
        let names: Vec<String> = b.attributes().map(|attr| attribute_qname(&b, &attr)).collect();
        assert_eq!(names, ["p:attr", "xp:other"]);
    }

    #[test]
    fn test_in_scope_namespaces_skip_undeclared_default() {
        let doc = roxmltree::Document::parse(r#"<a xmlns="urn:d"><b xmlns=""/></a>"#).unwrap();
        let b = first(&doc, "b");
        assert!(in_scope_namespaces(&b).iter().all(|(p, _)| !p.is_empty()));
        let a = doc.root_element();
        assert!(in_scope_namespaces(&a).contains(&(String::new(), "urn:d".to_owned())));
    }
}
