#![forbid(unsafe_code)]

//! Base64 decode transform.

use std::io::Write;

use base64::Engine;
use ulriksdal_core::{algorithm, Error};

use crate::input::{InputData, SignatureInput};
use crate::output::TransformOutput;
use crate::service::TransformService;

/// Decodes base64 content into octets.
///
/// Octet input is decoded as-is.  For node-set and element input the
/// string value of the selected text nodes is decoded.  Whitespace is
/// ignored in both cases.
#[derive(Debug, Default, Clone, Copy)]
pub struct Base64DecodeTransform;

impl Base64DecodeTransform {
    fn encoded_text(input: SignatureInput) -> Result<String, Error> {
        match input.into_data() {
            InputData::NodeSet { document, node_set } => {
                let doc = document.parse_doc()?;
                Ok(doc
                    .descendants()
                    .filter(|n| n.is_text() && node_set.contains(n))
                    .filter_map(|n| n.text())
                    .collect())
            }
            InputData::Element(element) => element.with_node(|node| {
                Ok(node
                    .descendants()
                    .filter(|n| n.is_text())
                    .filter_map(|n| n.text())
                    .collect())
            }),
            data => {
                let bytes = SignatureInput::new(data).into_octets()?;
                String::from_utf8(bytes)
                    .map_err(|e| Error::Base64(format!("base64 input not UTF-8: {e}")))
            }
        }
    }
}

impl TransformService for Base64DecodeTransform {
    fn uri(&self) -> &'static str {
        algorithm::BASE64
    }

    fn transform<'s>(
        &self,
        input: SignatureInput,
        _element: Option<roxmltree::Node<'_, '_>>,
        _base_uri: Option<&str>,
        sink: Option<&'s mut dyn Write>,
    ) -> Result<TransformOutput<'s>, Error> {
        let secure_validation = input.secure_validation();
        let text = Self::encoded_text(input)?;
        let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(cleaned)
            .map_err(|e| Error::Base64(format!("decode error: {e}")))?;

        match sink {
            None => Ok(TransformOutput::buffer(decoded, secure_validation)),
            Some(sink) => {
                sink.write_all(&decoded)?;
                Ok(TransformOutput::streamed(sink, secure_validation))
            }
        }
    }
}
