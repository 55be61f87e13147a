#![forbid(unsafe_code)]

//! XML-DSig transforms for the Ulriksdal library.
//!
//! A transform takes a [`SignatureInput`] (octets, a node-set, an element,
//! or an unread stream) and produces a [`TransformOutput`], either owned or
//! written into a caller-supplied sink.  Transforms are looked up by URI
//! through a [`TransformProvider`].

pub mod base64_transform;
pub mod canonicalizer;
pub mod enveloped;
pub mod exclusive;
pub mod inclusive_namespaces;
pub mod input;
pub mod output;
pub mod service;

pub use exclusive::{CommentMode, ExclusiveC14nTransform};
pub use inclusive_namespaces::{ExcC14nParameterSpec, InclusiveNamespaces};
pub use input::{InputData, SignatureInput};
pub use output::{OutputData, TransformOutput};
pub use service::{DefaultTransformProvider, TransformParameterSpec, TransformProvider, TransformService};
