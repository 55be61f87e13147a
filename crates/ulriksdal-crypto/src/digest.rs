#![forbid(unsafe_code)]

//! Message digests keyed by algorithm URI.

use digest::Digest;
use ulriksdal_core::{algorithm, Error};

/// An incremental hash.
pub trait DigestAlgorithm: Send {
    fn update(&mut self, data: &[u8]);

    /// Consume the hash and return the digest value.
    fn finalize(self: Box<Self>) -> Vec<u8>;

    /// The URI this hash was created for.
    fn uri(&self) -> &'static str;

    /// Digest length in bytes.
    fn output_len(&self) -> usize;
}

/// Any RustCrypto hash, tagged with its URI.
struct Hasher<D> {
    uri: &'static str,
    inner: D,
}

impl<D: Digest + Send + 'static> DigestAlgorithm for Hasher<D> {
    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.inner, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.inner.finalize().to_vec()
    }

    fn uri(&self) -> &'static str {
        self.uri
    }

    fn output_len(&self) -> usize {
        <D as Digest>::output_size()
    }
}

fn hasher<D: Digest + Send + 'static>(uri: &'static str) -> Box<dyn DigestAlgorithm> {
    Box::new(Hasher { uri, inner: D::new() })
}

/// Start a hash for `uri`.
pub fn from_uri(uri: &str) -> Result<Box<dyn DigestAlgorithm>, Error> {
    let hash = match uri {
        algorithm::SHA1 => hasher::<sha1::Sha1>(algorithm::SHA1),
        algorithm::SHA224 => hasher::<sha2::Sha224>(algorithm::SHA224),
        algorithm::SHA256 => hasher::<sha2::Sha256>(algorithm::SHA256),
        algorithm::SHA384 => hasher::<sha2::Sha384>(algorithm::SHA384),
        algorithm::SHA512 => hasher::<sha2::Sha512>(algorithm::SHA512),
        algorithm::RIPEMD160 => hasher::<ripemd::Ripemd160>(algorithm::RIPEMD160),
        _ => return Err(Error::UnsupportedAlgorithm(uri.to_owned())),
    };
    Ok(hash)
}

/// Hash `data` in one call.
pub fn digest(uri: &str, data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut hash = from_uri(uri)?;
    hash.update(data);
    Ok(hash.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    #[test]
    fn test_sha256() {
        let result = digest(algorithm::SHA256, b"hello").unwrap();
        assert_eq!(
            hex(&result),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_sha1() {
        let result = digest(algorithm::SHA1, b"abc").unwrap();
        assert_eq!(hex(&result), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn test_output_lengths() {
        for (uri, len) in [
            (algorithm::SHA1, 20),
            (algorithm::SHA224, 28),
            (algorithm::SHA256, 32),
            (algorithm::SHA384, 48),
            (algorithm::SHA512, 64),
            (algorithm::RIPEMD160, 20),
        ] {
            let hasher = from_uri(uri).unwrap();
            assert_eq!(hasher.uri(), uri);
            assert_eq!(hasher.output_len(), len);
            assert_eq!(digest(uri, b"x").unwrap().len(), len);
        }
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let mut hasher = from_uri(algorithm::SHA384).unwrap();
        hasher.update(b"hel");
        hasher.update(b"lo");
        assert_eq!(hasher.finalize(), digest(algorithm::SHA384, b"hello").unwrap());
    }

    #[test]
    fn test_unknown_digest() {
        assert!(matches!(
            from_uri("http://www.w3.org/2001/04/xmldsig-more#md5"),
            Err(Error::UnsupportedAlgorithm(_))
        ));
    }
}
