#![forbid(unsafe_code)]

//! The exclusive canonicalization transform, with and without comments.

use std::io::Write;

use ulriksdal_c14n::C14nMode;
use ulriksdal_core::Error;

use crate::canonicalizer::canonicalize_input;
use crate::inclusive_namespaces::{ExcC14nParameterSpec, InclusiveNamespaces};
use crate::input::SignatureInput;
use crate::output::TransformOutput;
use crate::service::{TransformParameterSpec, TransformService};

/// Whether comment nodes are serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentMode {
    Omit,
    With,
}

impl CommentMode {
    /// The engine strategy for this mode.
    pub fn c14n_mode(self) -> C14nMode {
        match self {
            CommentMode::Omit => C14nMode::Exclusive,
            CommentMode::With => C14nMode::ExclusiveWithComments,
        }
    }
}

/// Exclusive XML Canonicalization 1.0 as a transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusiveC14nTransform {
    mode: CommentMode,
    params: Option<ExcC14nParameterSpec>,
}

impl ExclusiveC14nTransform {
    pub fn new(mode: CommentMode, params: Option<ExcC14nParameterSpec>) -> Self {
        Self { mode, params }
    }

    pub fn mode(&self) -> CommentMode {
        self.mode
    }

    /// Canonicalize `input`.
    ///
    /// The inclusive prefix list comes from the `InclusiveNamespaces` child
    /// of `transform_element` when an element is given, and from the
    /// parameters the transform was built with otherwise.  Without a sink
    /// the canonical bytes are returned in a buffer; with one they are
    /// written into it and the output only refers to the sink.  The input's
    /// secure-validation flag is carried onto the output.
    pub fn perform<'s>(
        &self,
        input: SignatureInput,
        transform_element: Option<roxmltree::Node<'_, '_>>,
        base_uri: Option<&str>,
        sink: Option<&'s mut dyn Write>,
    ) -> Result<TransformOutput<'s>, Error> {
        let prefixes: Vec<String> = match transform_element {
            Some(element) => InclusiveNamespaces::from_transform_element(element, base_uri)?
                .map(|list| list.prefixes().to_vec())
                .unwrap_or_default(),
            None => self
                .params
                .as_ref()
                .map(|spec| spec.prefixes().to_vec())
                .unwrap_or_default(),
        };

        let mode = self.mode.c14n_mode();
        let secure_validation = input.secure_validation();
        let data = input.into_data();

        match sink {
            None => {
                tracing::trace!(uri = mode.uri(), "canonicalizing into buffer");
                let mut buffer = Vec::new();
                canonicalize_input(data, mode, &prefixes, secure_validation, &mut buffer)
                    .map_err(Error::canonicalization)?;
                Ok(TransformOutput::buffer(buffer, secure_validation))
            }
            Some(sink) => {
                tracing::trace!(uri = mode.uri(), "canonicalizing into caller sink");
                canonicalize_input(data, mode, &prefixes, secure_validation, &mut *sink)
                    .map_err(Error::canonicalization)?;
                Ok(TransformOutput::streamed(sink, secure_validation))
            }
        }
    }
}

impl TransformService for ExclusiveC14nTransform {
    fn uri(&self) -> &'static str {
        self.mode.c14n_mode().uri()
    }

    fn is_canonicalization(&self) -> bool {
        true
    }

    fn params(&self) -> Option<TransformParameterSpec> {
        self.params.clone().map(TransformParameterSpec::ExcC14n)
    }

    fn transform<'s>(
        &self,
        input: SignatureInput,
        element: Option<roxmltree::Node<'_, '_>>,
        base_uri: Option<&str>,
        sink: Option<&'s mut dyn Write>,
    ) -> Result<TransformOutput<'s>, Error> {
        self.perform(input, element, base_uri, sink)
    }
}
