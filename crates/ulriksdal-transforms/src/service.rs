#![forbid(unsafe_code)]

//! Transform services and the providers that hand them out.

use std::io::Write;

use ulriksdal_core::{algorithm, Error};

use crate::base64_transform::Base64DecodeTransform;
use crate::enveloped::EnvelopedSignatureTransform;
use crate::exclusive::{CommentMode, ExclusiveC14nTransform};
use crate::inclusive_namespaces::ExcC14nParameterSpec;
use crate::input::SignatureInput;
use crate::output::TransformOutput;

/// Typed parameters a transform service can be initialised with.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransformParameterSpec {
    ExcC14n(ExcC14nParameterSpec),
}

/// One transform algorithm, ready to run.
pub trait TransformService: Send + Sync {
    /// The algorithm URI this service implements.
    fn uri(&self) -> &'static str;

    /// Whether this service is a canonicalization algorithm and may back a
    /// `CanonicalizationMethod`.
    fn is_canonicalization(&self) -> bool {
        false
    }

    /// The parameters the service was initialised with.
    fn params(&self) -> Option<TransformParameterSpec> {
        None
    }

    /// Run the transform.
    ///
    /// `element` is the `Transform` (or `CanonicalizationMethod`) element
    /// the transform was read from, when there is one.  If `sink` is given
    /// the result is written into it; otherwise it is returned owned.
    fn transform<'s>(
        &self,
        input: SignatureInput,
        element: Option<roxmltree::Node<'_, '_>>,
        base_uri: Option<&str>,
        sink: Option<&'s mut dyn Write>,
    ) -> Result<TransformOutput<'s>, Error>;
}

/// A source of transform services.
pub trait TransformProvider: Send + Sync {
    /// Provider name, for logs.
    fn name(&self) -> &str;

    /// Look up and initialise the service for `uri`.
    ///
    /// `Ok(None)` means the provider does not implement `uri`.
    fn get(
        &self,
        uri: &str,
        params: Option<&TransformParameterSpec>,
    ) -> Result<Option<Box<dyn TransformService>>, Error>;
}

/// The built-in transforms.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultTransformProvider;

impl DefaultTransformProvider {
    pub const NAME: &'static str = "ulriksdal";
}

impl TransformProvider for DefaultTransformProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn get(
        &self,
        uri: &str,
        params: Option<&TransformParameterSpec>,
    ) -> Result<Option<Box<dyn TransformService>>, Error> {
        let exc_params = || match params {
            None => None,
            Some(TransformParameterSpec::ExcC14n(spec)) => Some(spec.clone()),
        };
        let no_params = || match params {
            None => Ok(()),
            Some(other) => Err(Error::InvalidAlgorithmParameters(format!(
                "{uri} takes no parameters, got {other:?}"
            ))),
        };
        let service: Box<dyn TransformService> = match uri {
            algorithm::EXC_C14N => Box::new(ExclusiveC14nTransform::new(CommentMode::Omit, exc_params())),
            algorithm::EXC_C14N_WITH_COMMENTS => {
                Box::new(ExclusiveC14nTransform::new(CommentMode::With, exc_params()))
            }
            algorithm::BASE64 => {
                no_params()?;
                Box::new(Base64DecodeTransform)
            }
            algorithm::ENVELOPED_SIGNATURE => {
                no_params()?;
                Box::new(EnvelopedSignatureTransform)
            }
            _ => return Ok(None),
        };
        Ok(Some(service))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_provider_covers_builtin_transforms() {
        let provider = DefaultTransformProvider;
        for uri in [
            algorithm::EXC_C14N,
            algorithm::EXC_C14N_WITH_COMMENTS,
            algorithm::BASE64,
            algorithm::ENVELOPED_SIGNATURE,
        ] {
            let service = provider.get(uri, None).unwrap().unwrap();
            assert_eq!(service.uri(), uri);
        }
        assert!(provider.get(algorithm::XSLT, None).unwrap().is_none());
    }

    #[test]
    fn test_canonicalization_flag() {
        let provider = DefaultTransformProvider;
        let c14n = provider.get(algorithm::EXC_C14N, None).unwrap().unwrap();
        let b64 = provider.get(algorithm::BASE64, None).unwrap().unwrap();
        assert!(c14n.is_canonicalization());
        assert!(!b64.is_canonicalization());
    }

    #[test]
    fn test_params_are_checked() {
        let provider = DefaultTransformProvider;
        let spec = TransformParameterSpec::ExcC14n(ExcC14nParameterSpec::new(["x"]).unwrap());
        let c14n = provider.get(algorithm::EXC_C14N, Some(&spec)).unwrap().unwrap();
        assert_eq!(c14n.params(), Some(spec.clone()));
        assert!(matches!(
            provider.get(algorithm::BASE64, Some(&spec)),
            Err(Error::InvalidAlgorithmParameters(_))
        ));
    }
}
