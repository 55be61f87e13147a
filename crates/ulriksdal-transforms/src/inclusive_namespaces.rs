#![forbid(unsafe_code)]

//! The `InclusiveNamespaces` parameter of exclusive canonicalization.
//!
//! ```xml
//! <Transform Algorithm="http://www.w3.org/2001/10/xml-exc-c14n#">
//!   <ec:InclusiveNamespaces xmlns:ec="http://www.w3.org/2001/10/xml-exc-c14n#"
//!                           PrefixList="soap #default"/>
//! </Transform>
//! ```

use ulriksdal_c14n::exclusive::DEFAULT_PREFIX_TOKEN;
use ulriksdal_core::{ns, Error};
use ulriksdal_xml::document::is_element_named;

/// A prefix list read from an `InclusiveNamespaces` element.
///
/// Prefixes keep document order; repeated prefixes are kept once, at their
/// first position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InclusiveNamespaces {
    prefixes: Vec<String>,
    base_uri: Option<String>,
}

impl InclusiveNamespaces {
    /// Build a list from prefixes given in code.
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::default();
        for prefix in prefixes {
            list.push(prefix.into());
        }
        list
    }

    fn push(&mut self, prefix: String) {
        if !self.prefixes.contains(&prefix) {
            self.prefixes.push(prefix);
        }
    }

    /// Parse an `InclusiveNamespaces` element.
    ///
    /// A missing `PrefixList` attribute yields an empty list.
    pub fn from_element(
        element: roxmltree::Node<'_, '_>,
        base_uri: Option<&str>,
    ) -> Result<Self, Error> {
        if !is_element_named(&element, ns::EXC_C14N, ns::node::INCLUSIVE_NAMESPACES) {
            return Err(Error::MalformedStructure(format!(
                "expected InclusiveNamespaces, found {}",
                element.tag_name().name()
            )));
        }
        let mut list = Self::new(
            element
                .attribute(ns::attr::PREFIX_LIST)
                .unwrap_or("")
                .split_whitespace(),
        );
        list.base_uri = base_uri.map(str::to_owned);
        Ok(list)
    }

    /// Find and parse the `InclusiveNamespaces` child of a `Transform` or
    /// `CanonicalizationMethod` element.
    ///
    /// Only immediate children count.  No child yields `None`; more than one
    /// is a malformed configuration.
    pub fn from_transform_element(
        transform: roxmltree::Node<'_, '_>,
        base_uri: Option<&str>,
    ) -> Result<Option<Self>, Error> {
        let mut found = transform
            .children()
            .filter(|n| is_element_named(n, ns::EXC_C14N, ns::node::INCLUSIVE_NAMESPACES));
        let Some(first) = found.next() else {
            return Ok(None);
        };
        let extra = found.count();
        if extra > 0 {
            return Err(Error::MalformedStructure(format!(
                "{} InclusiveNamespaces elements under {}; at most one is allowed",
                extra + 1,
                transform.tag_name().name()
            )));
        }
        Self::from_element(first, base_uri).map(Some)
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn base_uri(&self) -> Option<&str> {
        self.base_uri.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// The list in `PrefixList` attribute syntax.
    pub fn prefix_list(&self) -> String {
        self.prefixes.join(" ")
    }
}

/// Validated exclusive C14N parameters given in code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcC14nParameterSpec {
    prefixes: Vec<String>,
}

impl ExcC14nParameterSpec {
    /// Each prefix must be `#default` or an NCName.
    pub fn new<I, S>(prefixes: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list = InclusiveNamespaces::new(prefixes);
        if let Some(bad) = list.prefixes().iter().find(|p| !is_valid_prefix(p)) {
            return Err(Error::InvalidAlgorithmParameters(format!(
                "invalid inclusive namespace prefix: {bad:?}"
            )));
        }
        Ok(Self {
            prefixes: list.prefixes,
        })
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}

impl TryFrom<InclusiveNamespaces> for ExcC14nParameterSpec {
    type Error = Error;

    fn try_from(list: InclusiveNamespaces) -> Result<Self, Error> {
        Self::new(list.prefixes)
    }
}

fn is_valid_prefix(prefix: &str) -> bool {
    if prefix == DEFAULT_PREFIX_TOKEN {
        return true;
    }
    let mut chars = prefix.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EC: &str = "http://www.w3.org/2001/10/xml-exc-c14n#";

    fn transform_xml(children: &str) -> String {
        format!(
            r#"<ds:Transform xmlns:ds="http://www.w3.org/2000/09/xmldsig#" xmlns:ec="{EC}" Algorithm="{EC}">{children}</ds:Transform>"#
        )
    }

    #[test]
    fn test_no_child_is_none() {
        let xml = transform_xml("");
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let list = InclusiveNamespaces::from_transform_element(doc.root_element(), None).unwrap();
        assert!(list.is_none());
    }

    #[test]
    fn test_single_child_is_parsed_in_order() {
        let xml = transform_xml(r#"<ec:InclusiveNamespaces PrefixList=" soap  #default xs soap "/>"#);
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let list = InclusiveNamespaces::from_transform_element(doc.root_element(), Some("file:///x"))
            .unwrap()
            .unwrap();
        assert_eq!(list.prefixes(), ["soap", "#default", "xs"]);
        assert_eq!(list.base_uri(), Some("file:///x"));
        assert_eq!(list.prefix_list(), "soap #default xs");
    }

    #[test]
    fn test_missing_prefix_list_is_empty() {
        let xml = transform_xml("<ec:InclusiveNamespaces/>");
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let list = InclusiveNamespaces::from_transform_element(doc.root_element(), None)
            .unwrap()
            .unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_multiple_children_rejected() {
        let xml = transform_xml(
            r#"<ec:InclusiveNamespaces PrefixList="a"/><ec:InclusiveNamespaces PrefixList="b"/>"#,
        );
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let err = InclusiveNamespaces::from_transform_element(doc.root_element(), None).unwrap_err();
        assert!(matches!(err, Error::MalformedStructure(_)));
    }

    #[test]
    fn test_wrong_namespace_and_grandchildren_ignored() {
        let xml = transform_xml(
            r#"<InclusiveNamespaces PrefixList="a"/><w><ec:InclusiveNamespaces PrefixList="b"/></w>"#,
        );
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let list = InclusiveNamespaces::from_transform_element(doc.root_element(), None).unwrap();
        assert!(list.is_none());
    }

    #[test]
    fn test_parameter_spec_validation() {
        let spec = ExcC14nParameterSpec::new(["#default", "soap", "x-1.y"]).unwrap();
        assert_eq!(spec.prefixes(), ["#default", "soap", "x-1.y"]);
        for bad in ["", "a:b", "1x", "has space"] {
            assert!(matches!(
                ExcC14nParameterSpec::new([bad]),
                Err(Error::InvalidAlgorithmParameters(_))
            ));
        }
    }
}
