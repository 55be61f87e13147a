#![forbid(unsafe_code)]

//! Algorithm parameters.

use ulriksdal_transforms::ExcC14nParameterSpec;
use ulriksdal_xml::XmlStructure;

/// `HMACOutputLength`: the HMAC output is truncated to this many bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HmacParameterSpec {
    output_length: usize,
}

impl HmacParameterSpec {
    pub fn new(output_length: usize) -> Self {
        Self { output_length }
    }

    /// Output length in bits.
    pub fn output_length(&self) -> usize {
        self.output_length
    }
}

/// Parameters handed to the factory along with an algorithm URI.
#[derive(Debug, Clone)]
pub enum AlgorithmParameters {
    Hmac(HmacParameterSpec),
    ExcC14n(ExcC14nParameterSpec),
    /// Parameters still in XML form: the algorithm's own element, whose
    /// children carry the parameters.
    Xml(XmlStructure),
}

impl AlgorithmParameters {
    /// Short name of the parameter kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            AlgorithmParameters::Hmac(_) => "HMAC parameters",
            AlgorithmParameters::ExcC14n(_) => "exclusive C14N parameters",
            AlgorithmParameters::Xml(_) => "XML parameters",
        }
    }
}

impl From<HmacParameterSpec> for AlgorithmParameters {
    fn from(spec: HmacParameterSpec) -> Self {
        AlgorithmParameters::Hmac(spec)
    }
}

impl From<ExcC14nParameterSpec> for AlgorithmParameters {
    fn from(spec: ExcC14nParameterSpec) -> Self {
        AlgorithmParameters::ExcC14n(spec)
    }
}
