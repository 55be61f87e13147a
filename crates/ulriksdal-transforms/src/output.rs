#![forbid(unsafe_code)]

//! Transform output.

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use ulriksdal_xml::{NodeSet, XmlDocument};

use crate::input::{InputData, SignatureInput};

/// Where the result of a transform ended up.
pub enum OutputData<'s> {
    /// The result is owned here.
    Buffer(Vec<u8>),
    /// The result was written into a caller-supplied sink.  The sink is
    /// neither flushed nor closed.
    Streamed(&'s mut dyn Write),
    /// A node-set result, produced by transforms that select nodes rather
    /// than serialize them.
    NodeSet {
        document: Arc<XmlDocument>,
        node_set: NodeSet,
    },
}

impl fmt::Debug for OutputData<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputData::Buffer(bytes) => f.debug_tuple("Buffer").field(&bytes.len()).finish(),
            OutputData::Streamed(_) => f.write_str("Streamed"),
            OutputData::NodeSet { node_set, .. } => {
                f.debug_struct("NodeSet").field("len", &node_set.len()).finish()
            }
        }
    }
}

/// Result of a transform, carrying the input's secure-validation flag.
#[derive(Debug)]
pub struct TransformOutput<'s> {
    data: OutputData<'s>,
    secure_validation: bool,
}

impl<'s> TransformOutput<'s> {
    pub fn new(data: OutputData<'s>, secure_validation: bool) -> Self {
        Self {
            data,
            secure_validation,
        }
    }

    pub fn buffer(bytes: Vec<u8>, secure_validation: bool) -> Self {
        Self::new(OutputData::Buffer(bytes), secure_validation)
    }

    pub fn streamed(sink: &'s mut dyn Write, secure_validation: bool) -> Self {
        Self::new(OutputData::Streamed(sink), secure_validation)
    }

    pub fn secure_validation(&self) -> bool {
        self.secure_validation
    }

    pub fn data(&self) -> &OutputData<'s> {
        &self.data
    }

    pub fn into_data(self) -> OutputData<'s> {
        self.data
    }

    pub fn is_streamed(&self) -> bool {
        matches!(self.data, OutputData::Streamed(_))
    }

    /// The owned bytes, if the result was buffered.
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.data {
            OutputData::Buffer(bytes) => Some(bytes.as_slice()),
            _ => None,
        }
    }

    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self.data {
            OutputData::Buffer(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Turn the result into the input of a following transform.
    ///
    /// A streamed result has already left this process and yields `None`.
    pub fn into_input(self) -> Option<SignatureInput> {
        let data = match self.data {
            OutputData::Buffer(bytes) => InputData::Octets(bytes),
            OutputData::NodeSet { document, node_set } => InputData::NodeSet { document, node_set },
            OutputData::Streamed(_) => return None,
        };
        Some(SignatureInput::new(data).with_secure_validation(self.secure_validation))
    }
}
