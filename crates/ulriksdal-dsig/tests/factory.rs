//! End-to-end tests of the signature factory.

use std::sync::Arc;

use ulriksdal_core::{algorithm, Error};
use ulriksdal_dsig::{
    catalog, AlgorithmParameters, FactoryConfig, KeyInfoContent, ObjectContent, ValidateContext,
    XmlSignatureFactory,
};
use ulriksdal_transforms::{
    ExcC14nParameterSpec, SignatureInput, TransformParameterSpec, TransformProvider,
    TransformService,
};
use ulriksdal_xml::{DomNode, XmlDocument, XmlStructure};

const SIGNATURE: &str = r##"<ds:Signature xmlns:ds="http://www.w3.org/2000/09/xmldsig#" Id="sig">
  <ds:SignedInfo>
    <ds:CanonicalizationMethod Algorithm="http://www.w3.org/2001/10/xml-exc-c14n#">
      <ec:InclusiveNamespaces xmlns:ec="http://www.w3.org/2001/10/xml-exc-c14n#" PrefixList="soap"/>
    </ds:CanonicalizationMethod>
    <ds:SignatureMethod Algorithm="http://www.w3.org/2001/04/xmldsig-more#hmac-sha256">
      <ds:HMACOutputLength>128</ds:HMACOutputLength>
    </ds:SignatureMethod>
    <ds:Reference URI="#body" Id="r1">
      <ds:Transforms>
        <ds:Transform Algorithm="http://www.w3.org/2000/09/xmldsig#enveloped-signature"/>
        <ds:Transform Algorithm="http://www.w3.org/2001/10/xml-exc-c14n#WithComments"/>
      </ds:Transforms>
      <ds:DigestMethod Algorithm="http://www.w3.org/2001/04/xmlenc#sha256"/>
      <ds:DigestValue>AAECAw==</ds:DigestValue>
    </ds:Reference>
    <ds:Reference URI="#obj">
      <ds:DigestMethod Algorithm="http://www.w3.org/2000/09/xmldsig#sha1"/>
      <ds:DigestValue>BAUG</ds:DigestValue>
    </ds:Reference>
  </ds:SignedInfo>
  <ds:SignatureValue Id="sv">
    3q2+7w==
  </ds:SignatureValue>
  <ds:KeyInfo>
    <ds:KeyName>shared</ds:KeyName>
  </ds:KeyInfo>
  <ds:Object Id="obj" MimeType="text/xml">
    <ds:SignatureProperties>
      <ds:SignatureProperty Target="#sig"><when>now</when></ds:SignatureProperty>
    </ds:SignatureProperties>
    <payload/>
  </ds:Object>
</ds:Signature>"##;

fn dom(xml: &str) -> DomNode {
    XmlDocument::parse(xml.to_owned()).unwrap().into_dom().unwrap()
}

fn root_element(node: &DomNode) -> DomNode {
    let id = node
        .with_node(|n| Ok(n.document().root_element().id()))
        .unwrap();
    DomNode::new(node.document().clone(), id).unwrap()
}

// ── Resolution ───────────────────────────────────────────────────────

#[test]
fn test_every_catalog_uri_resolves_to_itself() {
    let factory = XmlSignatureFactory::default();
    for uri in catalog::digest_uris() {
        assert_eq!(factory.new_digest_method(uri, None).unwrap().algorithm(), uri);
    }
    for uri in catalog::signature_uris() {
        assert_eq!(factory.new_signature_method(uri, None).unwrap().algorithm(), uri);
    }
}

#[test]
fn test_sha256_and_unknown_uri() {
    let factory = XmlSignatureFactory::default();
    let dm = factory
        .new_digest_method("http://www.w3.org/2001/04/xmlenc#sha256", None)
        .unwrap();
    assert_eq!(dm.algorithm(), "http://www.w3.org/2001/04/xmlenc#sha256");
    assert!(matches!(
        factory.new_digest_method("not-a-real-uri", None),
        Err(Error::UnsupportedAlgorithm(_))
    ));
}

#[test]
fn test_factory_transform_canonicalizes_element() {
    let factory = XmlSignatureFactory::default();
    let doc = dom(r#"<a xmlns:x="urn:x" xmlns:y="urn:y"><x:b/></a>"#);
    let element = root_element(&doc);

    let plain = factory.new_transform(algorithm::EXC_C14N, None).unwrap();
    let out = plain
        .transform(SignatureInput::from_element(element.clone()), None, None, None)
        .unwrap();
    assert_eq!(
        out.bytes().unwrap(),
        br#"<a><x:b xmlns:x="urn:x"></x:b></a>"#
    );

    let spec = ExcC14nParameterSpec::new(["y"]).unwrap();
    let inclusive = factory
        .new_transform(algorithm::EXC_C14N, Some(spec.into()))
        .unwrap();
    let out = inclusive
        .transform(SignatureInput::from_element(element), None, None, None)
        .unwrap();
    assert_eq!(
        out.bytes().unwrap(),
        br#"<a xmlns:y="urn:y"><x:b xmlns:x="urn:x"></x:b></a>"#
    );
}

#[test]
fn test_canonicalization_method_streams_into_sink() {
    let factory = XmlSignatureFactory::default();
    let cm = factory
        .new_canonicalization_method(algorithm::EXC_C14N_WITH_COMMENTS, None)
        .unwrap();
    let mut sink = Vec::new();
    let out = cm
        .canonicalize(
            SignatureInput::from_octets(b"<r><!--c--><e a='1'/></r>".to_vec()),
            None,
            None,
            Some(&mut sink),
        )
        .unwrap();
    assert!(out.is_streamed());
    drop(out);
    assert_eq!(sink, br#"<r><!--c--><e a="1"></e></r>"#);
}

// ── Named providers ──────────────────────────────────────────────────

struct Picky;

impl TransformProvider for Picky {
    fn name(&self) -> &str {
        "picky"
    }

    fn get(
        &self,
        uri: &str,
        _params: Option<&TransformParameterSpec>,
    ) -> Result<Option<Box<dyn TransformService>>, Error> {
        match uri {
            algorithm::BASE64 => Err(Error::Crypto("broken module".into())),
            _ => Ok(None),
        }
    }
}

#[test]
fn test_named_provider_falls_back_and_maps_errors() {
    let factory = XmlSignatureFactory::new(FactoryConfig::default().with_provider(Arc::new(Picky)));
    // The provider declines exc-c14n, so the built-in one serves it.
    assert_eq!(
        factory.new_transform(algorithm::EXC_C14N, None).unwrap().algorithm(),
        algorithm::EXC_C14N
    );
    match factory.new_transform(algorithm::BASE64, None) {
        Err(Error::UnsupportedAlgorithm(msg)) => assert!(msg.contains("picky")),
        other => panic!("unexpected: {other:?}"),
    }
}

struct Strict;

impl TransformProvider for Strict {
    fn name(&self) -> &str {
        "strict"
    }

    fn get(
        &self,
        uri: &str,
        params: Option<&TransformParameterSpec>,
    ) -> Result<Option<Box<dyn TransformService>>, Error> {
        match (uri, params) {
            (algorithm::EXC_C14N, Some(_)) => Err(Error::InvalidAlgorithmParameters(
                "inclusive prefixes are not accepted".into(),
            )),
            _ => Ok(None),
        }
    }
}

#[test]
fn test_named_provider_parameter_rejection_keeps_its_kind() {
    let factory = XmlSignatureFactory::new(FactoryConfig::default().with_provider(Arc::new(Strict)));
    let spec = || AlgorithmParameters::ExcC14n(ExcC14nParameterSpec::new(["soap"]).unwrap());
    assert!(matches!(
        factory.new_transform(algorithm::EXC_C14N, Some(spec())),
        Err(Error::InvalidAlgorithmParameters(_))
    ));
    assert!(matches!(
        factory.new_canonicalization_method(algorithm::EXC_C14N, Some(spec())),
        Err(Error::InvalidAlgorithmParameters(_))
    ));
    // Without parameters the provider declines and the built-in one serves.
    assert!(factory.new_transform(algorithm::EXC_C14N, None).is_ok());
}

// ── Unmarshalling ────────────────────────────────────────────────────

#[test]
fn test_unmarshal_keeps_document_order() {
    let factory = XmlSignatureFactory::default();
    let ctx = ValidateContext::new(dom(SIGNATURE));
    let sig = factory.unmarshal_xml_signature(&ctx).unwrap();

    assert_eq!(sig.id(), Some("sig"));
    let si = sig.signed_info();
    assert_eq!(si.canonicalization_method().algorithm(), algorithm::EXC_C14N);
    match si.canonicalization_method().params() {
        Some(AlgorithmParameters::ExcC14n(spec)) => assert_eq!(spec.prefixes(), ["soap"]),
        other => panic!("unexpected params: {other:?}"),
    }
    assert_eq!(si.signature_method().algorithm(), algorithm::HMAC_SHA256);
    assert!(matches!(
        si.signature_method().params(),
        Some(AlgorithmParameters::Hmac(spec)) if spec.output_length() == 128
    ));

    let refs = si.references();
    assert_eq!(refs.len(), 2);
    assert_eq!(refs[0].uri(), Some("#body"));
    assert_eq!(refs[0].id(), Some("r1"));
    let transforms: Vec<_> = refs[0].transforms().iter().map(|t| t.algorithm()).collect();
    assert_eq!(
        transforms,
        [algorithm::ENVELOPED_SIGNATURE, algorithm::EXC_C14N_WITH_COMMENTS]
    );
    assert_eq!(refs[0].digest_value(), Some(&[0u8, 1, 2, 3][..]));
    assert_eq!(refs[1].digest_method().algorithm(), algorithm::SHA1);

    assert_eq!(sig.signature_value().value(), [0xde_u8, 0xad, 0xbe, 0xef]);
    assert_eq!(sig.signature_value().id(), Some("sv"));
    let key_info = sig.key_info().unwrap();
    assert_eq!(key_info.key_name(), Some("shared"));
    assert!(matches!(key_info.content()[0], KeyInfoContent::KeyName(_)));

    let objects = sig.objects();
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].mime_type(), Some("text/xml"));
    let content = objects[0].content();
    assert_eq!(content.len(), 2);
    match &content[0] {
        ObjectContent::SignatureProperties(props) => {
            assert_eq!(props.properties()[0].target(), "#sig");
            assert_eq!(props.properties()[0].content().len(), 1);
        }
        other => panic!("unexpected content: {other:?}"),
    }
    assert!(matches!(content[1], ObjectContent::Xml(XmlStructure::Dom(_))));
}

#[test]
fn test_unmarshal_element_and_structure_entry_points() {
    let factory = XmlSignatureFactory::default();
    let element = root_element(&dom(SIGNATURE));
    let sig = factory
        .unmarshal_xml_structure(&XmlStructure::Dom(element))
        .unwrap();
    assert_eq!(sig.signed_info().references().len(), 2);
}

#[test]
fn test_unmarshal_rejects_other_roots() {
    let factory = XmlSignatureFactory::default();
    let ctx = ValidateContext::new(dom("<Envelope><Body/></Envelope>"));
    match factory.unmarshal_xml_signature(&ctx) {
        Err(Error::MalformedStructure(msg)) => {
            assert!(msg.contains("invalid Signature tag: Envelope"), "{msg}")
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn test_unmarshal_preconditions() {
    let factory = XmlSignatureFactory::default();
    assert!(matches!(
        factory.unmarshal_xml_signature(&ValidateContext::default()),
        Err(Error::PreconditionViolation(_))
    ));
    assert!(matches!(
        factory.unmarshal_xml_structure(&XmlStructure::Text("<Signature/>".into())),
        Err(Error::TypeMismatch(_))
    ));
}

#[test]
fn test_unmarshal_rejects_unexpected_children() {
    let xml = SIGNATURE.replace("<ds:KeyInfo>", "<ds:Bogus/><ds:KeyInfo>");
    let factory = XmlSignatureFactory::default();
    match factory.unmarshal_xml_signature(&ValidateContext::new(dom(&xml))) {
        Err(Error::MalformedStructure(msg)) => assert!(msg.contains("Bogus"), "{msg}"),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn test_unmarshal_under_secure_validation() {
    let factory = XmlSignatureFactory::default();

    // SHA-1 as a digest is allowed.
    let ctx = ValidateContext::new(dom(SIGNATURE)).with_secure_validation(true);
    assert!(factory.unmarshal_xml_signature(&ctx).is_ok());

    let weak = SIGNATURE.replace(
        "http://www.w3.org/2001/04/xmldsig-more#hmac-sha256\"",
        "http://www.w3.org/2000/09/xmldsig#rsa-sha1\"",
    );
    let weak = weak.replace("<ds:HMACOutputLength>128</ds:HMACOutputLength>", "");
    let ctx = ValidateContext::new(dom(&weak)).with_secure_validation(true);
    assert!(matches!(
        factory.unmarshal_xml_signature(&ctx),
        Err(Error::ForbiddenAlgorithm(_))
    ));
    // Without secure validation the same document unmarshals.
    assert!(factory
        .unmarshal_xml_signature(&ValidateContext::new(dom(&weak)))
        .is_ok());
}

#[test]
fn test_secure_validation_bounds_transforms() {
    let many = "<ds:Transform Algorithm=\"http://www.w3.org/2001/10/xml-exc-c14n#\"/>".repeat(6);
    let xml = SIGNATURE.replace(
        "<ds:Transform Algorithm=\"http://www.w3.org/2000/09/xmldsig#enveloped-signature\"/>",
        &many,
    );
    let factory = XmlSignatureFactory::default();
    let ctx = ValidateContext::new(dom(&xml)).with_secure_validation(true);
    assert!(matches!(
        factory.unmarshal_xml_signature(&ctx),
        Err(Error::MalformedStructure(_))
    ));
    assert!(factory
        .unmarshal_xml_signature(&ValidateContext::new(dom(&xml)))
        .is_ok());
}

#[test]
fn test_unmarshal_binds_base_uri() {
    let factory = XmlSignatureFactory::default();
    let c14n_base = |sig: &ulriksdal_dsig::XmlSignature| {
        let si = sig.signed_info();
        (
            si.canonicalization_method().base_uri().map(str::to_owned),
            si.references()[0].transforms()[1].base_uri().map(str::to_owned),
        )
    };

    let sig = factory
        .unmarshal_xml_signature(&ValidateContext::new(dom(SIGNATURE)))
        .unwrap();
    assert_eq!(c14n_base(&sig), (None, None));

    let document = XmlDocument::parse(SIGNATURE.to_owned())
        .unwrap()
        .with_base_uri("file:///doc.xml");
    let ctx = ValidateContext::new(document.into_dom().unwrap());
    let sig = factory.unmarshal_xml_signature(&ctx).unwrap();
    let doc_uri = Some("file:///doc.xml".to_owned());
    assert_eq!(c14n_base(&sig), (doc_uri.clone(), doc_uri));

    let ctx = ctx.with_base_uri("file:///context.xml");
    let sig = factory.unmarshal_xml_signature(&ctx).unwrap();
    let ctx_uri = Some("file:///context.xml".to_owned());
    assert_eq!(c14n_base(&sig), (ctx_uri.clone(), ctx_uri));
}
