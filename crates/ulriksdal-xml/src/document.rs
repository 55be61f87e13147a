#![forbid(unsafe_code)]

//! XML document wrapper over roxmltree.

use std::sync::Arc;

use ulriksdal_core::Error;

/// An owned XML document.  Stores the text and pre-computed metadata.
///
/// To work with the parsed tree, call [`XmlDocument::parse_doc`] which
/// returns a temporary `roxmltree::Document` borrowing from the text.
/// Node ids are stable across re-parses of the same text, so a
/// `roxmltree::NodeId` taken from one parse can be resolved in another.
///
/// roxmltree merges adjacent text and CDATA sections and expands entity
/// references while parsing, so every tree handed out here is already in
/// DOM-normalized form.
#[derive(Debug)]
pub struct XmlDocument {
    text: String,
    base_uri: Option<String>,
}

impl XmlDocument {
    /// Parse and validate XML from a string, taking ownership.
    pub fn parse(text: String) -> Result<Self, Error> {
        // Validate that the XML parses successfully.
        let _doc = roxmltree::Document::parse_with_options(&text, crate::parsing_options())
            .map_err(|e| Error::XmlParse(e.to_string()))?;
        Ok(Self {
            text,
            base_uri: None,
        })
    }

    /// Parse and validate XML from bytes.
    pub fn parse_bytes(data: &[u8]) -> Result<Self, Error> {
        let text = std::str::from_utf8(data)
            .map_err(|e| Error::XmlParse(format!("invalid UTF-8: {e}")))?
            .to_owned();
        Self::parse(text)
    }

    /// Set the base URI used to resolve relative references.
    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = Some(base_uri.into());
        self
    }

    /// Get the raw XML text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn base_uri(&self) -> Option<&str> {
        self.base_uri.as_deref()
    }

    /// Parse the document and return a temporary `roxmltree::Document`.
    ///
    /// This re-parses the XML from the stored text.  Call this once at the
    /// top of a processing step and pass the document down the call chain.
    pub fn parse_doc(&self) -> Result<roxmltree::Document<'_>, Error> {
        roxmltree::Document::parse_with_options(&self.text, crate::parsing_options())
            .map_err(|e| Error::XmlParse(e.to_string()))
    }

    /// Wrap into a shareable handle pointing at the document node.
    pub fn into_dom(self) -> Result<DomNode, Error> {
        let id = self.parse_doc()?.root().id();
        Ok(DomNode {
            document: Arc::new(self),
            id,
        })
    }
}

/// Whether `node` is an element with the given namespace URI and local name.
pub fn is_element_named(node: &roxmltree::Node<'_, '_>, ns: &str, local_name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == local_name
        && node.tag_name().namespace().unwrap_or("") == ns
}

/// A handle to one node of a shared, owned document.
///
/// This is how a DOM node travels through the library without borrowing
/// from a parse: the document is reference-counted and the node is named
/// by its id.
#[derive(Debug, Clone)]
pub struct DomNode {
    document: Arc<XmlDocument>,
    id: roxmltree::NodeId,
}

impl DomNode {
    /// Create a handle for `id` in `document`.
    ///
    /// Fails if the id does not name a node of the document.
    pub fn new(document: Arc<XmlDocument>, id: roxmltree::NodeId) -> Result<Self, Error> {
        let exists = document.parse_doc()?.get_node(id).is_some();
        if !exists {
            return Err(Error::MalformedStructure(format!(
                "node {} is not part of the document",
                id.get()
            )));
        }
        Ok(Self { document, id })
    }

    /// Create a handle for a node of a parse of `document`.
    ///
    /// Fails if `node` was parsed from some other text.
    pub fn from_parsed(
        document: &Arc<XmlDocument>,
        node: roxmltree::Node<'_, '_>,
    ) -> Result<Self, Error> {
        let text = node.document().input_text();
        if !std::ptr::eq(text, document.text()) && text != document.text() {
            return Err(Error::MalformedStructure(
                "node does not belong to the document".into(),
            ));
        }
        Ok(Self {
            document: Arc::clone(document),
            id: node.id(),
        })
    }

    pub fn document(&self) -> &Arc<XmlDocument> {
        &self.document
    }

    pub fn id(&self) -> roxmltree::NodeId {
        self.id
    }

    /// Run `f` against the parsed node.
    pub fn with_node<R>(
        &self,
        f: impl FnOnce(roxmltree::Node<'_, '_>) -> Result<R, Error>,
    ) -> Result<R, Error> {
        let doc = self.document.parse_doc()?;
        let node = doc.get_node(self.id).ok_or_else(|| {
            Error::MalformedStructure(format!("node {} vanished from document", self.id.get()))
        })?;
        f(node)
    }
}
