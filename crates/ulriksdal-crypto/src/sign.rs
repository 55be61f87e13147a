#![forbid(unsafe_code)]

//! Signature algorithm implementations (RSA, ECDSA, HMAC).
//!
//! DSA identifiers resolve so that signatures naming them can be read, but
//! no DSA arithmetic is available; signing or verifying with them fails.

use signature::SignatureEncoding;
use ulriksdal_core::{algorithm, Error};

/// Key material for signature operations.
pub enum KeyMaterial {
    Rsa(rsa::RsaPrivateKey),
    RsaPublic(rsa::RsaPublicKey),
    EcP256(p256::ecdsa::SigningKey),
    EcP256Public(p256::ecdsa::VerifyingKey),
    EcP384(p384::ecdsa::SigningKey),
    EcP384Public(p384::ecdsa::VerifyingKey),
    Hmac(Vec<u8>),
}

impl KeyMaterial {
    /// Short name of the key type, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            KeyMaterial::Rsa(_) => "RSA private key",
            KeyMaterial::RsaPublic(_) => "RSA public key",
            KeyMaterial::EcP256(_) => "P-256 private key",
            KeyMaterial::EcP256Public(_) => "P-256 public key",
            KeyMaterial::EcP384(_) => "P-384 private key",
            KeyMaterial::EcP384Public(_) => "P-384 public key",
            KeyMaterial::Hmac(_) => "HMAC secret",
        }
    }
}

/// Trait for signature algorithms.
pub trait SignatureAlgorithm: Send + Sync {
    fn uri(&self) -> &'static str;
    fn sign(&self, key: &KeyMaterial, data: &[u8]) -> Result<Vec<u8>, Error>;
    fn verify(&self, key: &KeyMaterial, data: &[u8], signature: &[u8]) -> Result<bool, Error>;
}

/// Create a signature algorithm from its URI.
pub fn from_uri(uri: &str) -> Result<Box<dyn SignatureAlgorithm>, Error> {
    use HashType::*;
    match uri {
        algorithm::RSA_SHA1 => Ok(Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA1, hash: Sha1 })),
        algorithm::RSA_SHA256 => Ok(Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA256, hash: Sha256 })),
        algorithm::RSA_SHA384 => Ok(Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA384, hash: Sha384 })),
        algorithm::RSA_SHA512 => Ok(Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA512, hash: Sha512 })),

        algorithm::DSA_SHA1 => Ok(Box::new(Dsa { uri: algorithm::DSA_SHA1 })),
        algorithm::DSA_SHA256 => Ok(Box::new(Dsa { uri: algorithm::DSA_SHA256 })),

        algorithm::ECDSA_SHA1 => Ok(Box::new(Ecdsa { uri: algorithm::ECDSA_SHA1, hash: Sha1 })),
        algorithm::ECDSA_SHA256 => Ok(Box::new(Ecdsa { uri: algorithm::ECDSA_SHA256, hash: Sha256 })),
        algorithm::ECDSA_SHA384 => Ok(Box::new(Ecdsa { uri: algorithm::ECDSA_SHA384, hash: Sha384 })),
        algorithm::ECDSA_SHA512 => Ok(Box::new(Ecdsa { uri: algorithm::ECDSA_SHA512, hash: Sha512 })),

        algorithm::HMAC_SHA1 => Ok(Box::new(HmacSign::new(algorithm::HMAC_SHA1, Sha1))),
        algorithm::HMAC_SHA256 => Ok(Box::new(HmacSign::new(algorithm::HMAC_SHA256, Sha256))),
        algorithm::HMAC_SHA384 => Ok(Box::new(HmacSign::new(algorithm::HMAC_SHA384, Sha384))),
        algorithm::HMAC_SHA512 => Ok(Box::new(HmacSign::new(algorithm::HMAC_SHA512, Sha512))),

        _ => Err(Error::UnsupportedAlgorithm(format!("signature algorithm: {uri}"))),
    }
}

/// Create an HMAC algorithm whose output is truncated to `output_bits`.
///
/// The length must be a positive multiple of 8 and no longer than the
/// underlying hash.  The lower bound for acceptable truncation is enforced
/// where the parameters are validated, not here.
pub fn hmac_with_output_length(
    uri: &str,
    output_bits: usize,
) -> Result<Box<dyn SignatureAlgorithm>, Error> {
    let hash = match uri {
        algorithm::HMAC_SHA1 => HashType::Sha1,
        algorithm::HMAC_SHA256 => HashType::Sha256,
        algorithm::HMAC_SHA384 => HashType::Sha384,
        algorithm::HMAC_SHA512 => HashType::Sha512,
        _ => return Err(Error::UnsupportedAlgorithm(format!("HMAC algorithm: {uri}"))),
    };
    if output_bits == 0 || output_bits % 8 != 0 || output_bits > hash.output_bits() {
        return Err(Error::InvalidAlgorithmParameters(format!(
            "HMAC output length {output_bits} is not valid for {uri}"
        )));
    }
    let mut alg = HmacSign::new(hmac_uri(hash), hash);
    alg.output_bytes = Some(output_bits / 8);
    Ok(Box::new(alg))
}

/// Output size in bits of the hash behind an HMAC URI.
pub fn hmac_hash_bits(uri: &str) -> Option<usize> {
    match uri {
        algorithm::HMAC_SHA1 => Some(HashType::Sha1.output_bits()),
        algorithm::HMAC_SHA256 => Some(HashType::Sha256.output_bits()),
        algorithm::HMAC_SHA384 => Some(HashType::Sha384.output_bits()),
        algorithm::HMAC_SHA512 => Some(HashType::Sha512.output_bits()),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
enum HashType {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl HashType {
    fn output_bits(self) -> usize {
        match self {
            HashType::Sha1 => 160,
            HashType::Sha256 => 256,
            HashType::Sha384 => 384,
            HashType::Sha512 => 512,
        }
    }

    fn prehash(self, data: &[u8]) -> Vec<u8> {
        use digest::Digest;
        match self {
            HashType::Sha1 => sha1::Sha1::digest(data).to_vec(),
            HashType::Sha256 => sha2::Sha256::digest(data).to_vec(),
            HashType::Sha384 => sha2::Sha384::digest(data).to_vec(),
            HashType::Sha512 => sha2::Sha512::digest(data).to_vec(),
        }
    }
}

fn hmac_uri(hash: HashType) -> &'static str {
    match hash {
        HashType::Sha1 => algorithm::HMAC_SHA1,
        HashType::Sha256 => algorithm::HMAC_SHA256,
        HashType::Sha384 => algorithm::HMAC_SHA384,
        HashType::Sha512 => algorithm::HMAC_SHA512,
    }
}

// ── RSA PKCS#1 v1.5 ─────────────────────────────────────────────────

struct RsaPkcs1v15 {
    uri: &'static str,
    hash: HashType,
}

impl RsaPkcs1v15 {
    fn sign_with_key(&self, private_key: &rsa::RsaPrivateKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        use signature::Signer;
        macro_rules! do_sign {
            ($hasher:ty) => {{
                let sk = rsa::pkcs1v15::SigningKey::<$hasher>::new(private_key.clone());
                let sig = sk
                    .try_sign(data)
                    .map_err(|e| Error::Crypto(format!("RSA signing failed: {e}")))?;
                Ok(sig.to_vec())
            }};
        }
        match self.hash {
            HashType::Sha1 => do_sign!(sha1::Sha1),
            HashType::Sha256 => do_sign!(sha2::Sha256),
            HashType::Sha384 => do_sign!(sha2::Sha384),
            HashType::Sha512 => do_sign!(sha2::Sha512),
        }
    }

    fn verify_with_key(&self, public_key: &rsa::RsaPublicKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        use signature::Verifier;
        let sig = rsa::pkcs1v15::Signature::try_from(sig_bytes)
            .map_err(|e| Error::Crypto(format!("invalid RSA signature: {e}")))?;
        macro_rules! do_verify {
            ($hasher:ty) => {{
                let vk = rsa::pkcs1v15::VerifyingKey::<$hasher>::new(public_key.clone());
                Ok(vk.verify(data, &sig).is_ok())
            }};
        }
        match self.hash {
            HashType::Sha1 => do_verify!(sha1::Sha1),
            HashType::Sha256 => do_verify!(sha2::Sha256),
            HashType::Sha384 => do_verify!(sha2::Sha384),
            HashType::Sha512 => do_verify!(sha2::Sha512),
        }
    }
}

impl SignatureAlgorithm for RsaPkcs1v15 {
    fn uri(&self) -> &'static str {
        self.uri
    }

    fn sign(&self, key: &KeyMaterial, data: &[u8]) -> Result<Vec<u8>, Error> {
        match key {
            KeyMaterial::Rsa(pk) => self.sign_with_key(pk, data),
            other => Err(Error::Key(format!("RSA private key required, got {}", other.kind()))),
        }
    }

    fn verify(&self, key: &KeyMaterial, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        let pubk = match key {
            KeyMaterial::Rsa(pk) => pk.to_public_key(),
            KeyMaterial::RsaPublic(pk) => pk.clone(),
            other => return Err(Error::Key(format!("RSA key required, got {}", other.kind()))),
        };
        self.verify_with_key(&pubk, data, sig_bytes)
    }
}

// ── DSA ──────────────────────────────────────────────────────────────

struct Dsa {
    uri: &'static str,
}

impl SignatureAlgorithm for Dsa {
    fn uri(&self) -> &'static str {
        self.uri
    }

    fn sign(&self, _key: &KeyMaterial, _data: &[u8]) -> Result<Vec<u8>, Error> {
        Err(Error::Crypto(format!("no DSA implementation available for {}", self.uri)))
    }

    fn verify(&self, _key: &KeyMaterial, _data: &[u8], _sig: &[u8]) -> Result<bool, Error> {
        Err(Error::Crypto(format!("no DSA implementation available for {}", self.uri)))
    }
}

// ── ECDSA ────────────────────────────────────────────────────────────
//
// The curve comes from the key; the hash comes from the algorithm URI.
// Signatures use the XML-DSig r||s encoding.

struct Ecdsa {
    uri: &'static str,
    hash: HashType,
}

macro_rules! impl_ecdsa_codec {
    ($to_typed:ident, $from_typed:ident, $curve:ident, $half:expr) => {
        /// Convert an XML-DSig r||s value into a typed signature.
        pub fn $to_typed(rs: &[u8]) -> Result<$curve::ecdsa::Signature, Error> {
            if rs.len() != 2 * $half {
                return Err(Error::Crypto(format!(
                    "{} signature must be {} bytes, got {}",
                    stringify!($curve),
                    2 * $half,
                    rs.len()
                )));
            }
            let r = $curve::FieldBytes::clone_from_slice(&rs[..$half]);
            let s = $curve::FieldBytes::clone_from_slice(&rs[$half..]);
            $curve::ecdsa::Signature::from_scalars(r, s)
                .map_err(|e| Error::Crypto(format!("invalid {} signature: {e}", stringify!($curve))))
        }

        /// Convert a typed signature into the XML-DSig r||s value.
        pub fn $from_typed(sig: &$curve::ecdsa::Signature) -> Vec<u8> {
            let (r, s) = sig.split_bytes();
            let mut out = Vec::with_capacity(2 * $half);
            out.extend_from_slice(&r);
            out.extend_from_slice(&s);
            out
        }
    };
}

impl_ecdsa_codec!(xmldsig_to_p256, p256_to_xmldsig, p256, 32);
impl_ecdsa_codec!(xmldsig_to_p384, p384_to_xmldsig, p384, 48);

impl SignatureAlgorithm for Ecdsa {
    fn uri(&self) -> &'static str {
        self.uri
    }

    fn sign(&self, key: &KeyMaterial, data: &[u8]) -> Result<Vec<u8>, Error> {
        use signature::hazmat::PrehashSigner;
        let prehash = self.hash.prehash(data);
        let failed = |e: signature::Error| Error::Crypto(format!("ECDSA signing failed: {e}"));
        match key {
            KeyMaterial::EcP256(sk) => {
                let sig: p256::ecdsa::Signature = sk.sign_prehash(&prehash).map_err(failed)?;
                Ok(p256_to_xmldsig(&sig))
            }
            KeyMaterial::EcP384(sk) => {
                let sig: p384::ecdsa::Signature = sk.sign_prehash(&prehash).map_err(failed)?;
                Ok(p384_to_xmldsig(&sig))
            }
            other => Err(Error::Key(format!("EC private key required, got {}", other.kind()))),
        }
    }

    fn verify(&self, key: &KeyMaterial, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        use signature::hazmat::PrehashVerifier;
        let prehash = self.hash.prehash(data);
        let p256_ok = |vk: &p256::ecdsa::VerifyingKey| -> Result<bool, Error> {
            let sig = xmldsig_to_p256(sig_bytes)?;
            Ok(vk.verify_prehash(&prehash, &sig).is_ok())
        };
        let p384_ok = |vk: &p384::ecdsa::VerifyingKey| -> Result<bool, Error> {
            let sig = xmldsig_to_p384(sig_bytes)?;
            Ok(vk.verify_prehash(&prehash, &sig).is_ok())
        };
        match key {
            KeyMaterial::EcP256(sk) => p256_ok(sk.verifying_key()),
            KeyMaterial::EcP256Public(vk) => p256_ok(vk),
            KeyMaterial::EcP384(sk) => p384_ok(sk.verifying_key()),
            KeyMaterial::EcP384Public(vk) => p384_ok(vk),
            other => Err(Error::Key(format!("EC key required, got {}", other.kind()))),
        }
    }
}

// ── HMAC ─────────────────────────────────────────────────────────────

struct HmacSign {
    uri: &'static str,
    hash: HashType,
    /// Truncated output length, if `HMACOutputLength` was given.
    output_bytes: Option<usize>,
}

impl HmacSign {
    fn new(uri: &'static str, hash: HashType) -> Self {
        Self {
            uri,
            hash,
            output_bytes: None,
        }
    }

    fn mac(&self, key: &KeyMaterial, data: &[u8]) -> Result<Vec<u8>, Error> {
        let KeyMaterial::Hmac(key_bytes) = key else {
            return Err(Error::Key(format!("HMAC key required, got {}", key.kind())));
        };
        let mut mac = compute_hmac(self.hash, key_bytes, data)?;
        if let Some(len) = self.output_bytes {
            mac.truncate(len);
        }
        Ok(mac)
    }
}

impl SignatureAlgorithm for HmacSign {
    fn uri(&self) -> &'static str {
        self.uri
    }

    fn sign(&self, key: &KeyMaterial, data: &[u8]) -> Result<Vec<u8>, Error> {
        self.mac(key, data)
    }

    fn verify(&self, key: &KeyMaterial, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        let expected = self.mac(key, data)?;
        Ok(constant_time_eq(&expected, sig_bytes))
    }
}

fn compute_hmac(hash: HashType, key: &[u8], data: &[u8]) -> Result<Vec<u8>, Error> {
    use hmac::{Hmac, Mac};
    macro_rules! hmac_compute {
        ($hasher:ty) => {{
            let mut mac = <Hmac<$hasher>>::new_from_slice(key)
                .map_err(|e| Error::Key(format!("invalid HMAC key: {e}")))?;
            mac.update(data);
            Ok(mac.finalize().into_bytes().to_vec())
        }};
    }
    match hash {
        HashType::Sha1 => hmac_compute!(sha1::Sha1),
        HashType::Sha256 => hmac_compute!(sha2::Sha256),
        HashType::Sha384 => hmac_compute!(sha2::Sha384),
        HashType::Sha512 => hmac_compute!(sha2::Sha512),
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
