use std::io::{self, Read, Write};

use blake2::digest::consts::{U20, U32, U48};
use blake2::{Blake2b, Blake2b512};
use ocfl_types::DigestAlgorithm;
use sha2::Digest;

/// Incremental hasher for one [`DigestAlgorithm`].
///
/// Each variant wraps the reference implementation from the RustCrypto or
/// BLAKE3 crates. Output is always rendered as lower-case hex.
pub enum Hasher {
    Md5(md5::Md5),
    Sha1(sha1::Sha1),
    Sha256(sha2::Sha256),
    Sha512(sha2::Sha512),
    Blake2b160(Blake2b<U20>),
    Blake2b256(Blake2b<U32>),
    Blake2b384(Blake2b<U48>),
    Blake2b512(Blake2b512),
    Blake3(Box<blake3::Hasher>),
}

impl Hasher {
    /// Create a fresh hasher for `algorithm`.
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::Md5 => Self::Md5(md5::Md5::new()),
            DigestAlgorithm::Sha1 => Self::Sha1(sha1::Sha1::new()),
            DigestAlgorithm::Sha256 => Self::Sha256(sha2::Sha256::new()),
            DigestAlgorithm::Sha512 => Self::Sha512(sha2::Sha512::new()),
            DigestAlgorithm::Blake2b160 => Self::Blake2b160(Blake2b::new()),
            DigestAlgorithm::Blake2b256 => Self::Blake2b256(Blake2b::new()),
            DigestAlgorithm::Blake2b384 => Self::Blake2b384(Blake2b::new()),
            DigestAlgorithm::Blake2b512 => Self::Blake2b512(Blake2b512::new()),
            DigestAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    /// The algorithm this hasher computes.
    pub fn algorithm(&self) -> DigestAlgorithm {
        match self {
            Self::Md5(_) => DigestAlgorithm::Md5,
            Self::Sha1(_) => DigestAlgorithm::Sha1,
            Self::Sha256(_) => DigestAlgorithm::Sha256,
            Self::Sha512(_) => DigestAlgorithm::Sha512,
            Self::Blake2b160(_) => DigestAlgorithm::Blake2b160,
            Self::Blake2b256(_) => DigestAlgorithm::Blake2b256,
            Self::Blake2b384(_) => DigestAlgorithm::Blake2b384,
            Self::Blake2b512(_) => DigestAlgorithm::Blake2b512,
            Self::Blake3(_) => DigestAlgorithm::Blake3,
        }
    }

    /// Feed more bytes.
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::Md5(h) => h.update(data),
            Self::Sha1(h) => h.update(data),
            Self::Sha256(h) => h.update(data),
            Self::Sha512(h) => h.update(data),
            Self::Blake2b160(h) => h.update(data),
            Self::Blake2b256(h) => h.update(data),
            Self::Blake2b384(h) => h.update(data),
            Self::Blake2b512(h) => h.update(data),
            Self::Blake3(h) => {
                h.update(data);
            }
        }
    }

    /// Consume the hasher and return the lower-case hex digest.
    pub fn finalize_hex(self) -> String {
        match self {
            Self::Md5(h) => hex::encode(h.finalize()),
            Self::Sha1(h) => hex::encode(h.finalize()),
            Self::Sha256(h) => hex::encode(h.finalize()),
            Self::Sha512(h) => hex::encode(h.finalize()),
            Self::Blake2b160(h) => hex::encode(h.finalize()),
            Self::Blake2b256(h) => hex::encode(h.finalize()),
            Self::Blake2b384(h) => hex::encode(h.finalize()),
            Self::Blake2b512(h) => hex::encode(h.finalize()),
            Self::Blake3(h) => h.finalize().to_hex().to_string(),
        }
    }
}

impl Write for Hasher {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Hash a byte slice and return the lower-case hex digest.
pub fn digest_bytes(algorithm: DigestAlgorithm, data: &[u8]) -> String {
    let mut hasher = Hasher::new(algorithm);
    hasher.update(data);
    hasher.finalize_hex()
}

/// Hash everything `reader` yields and return the lower-case hex digest.
pub fn digest_reader<R: Read>(algorithm: DigestAlgorithm, mut reader: R) -> io::Result<String> {
    let mut hasher = Hasher::new(algorithm);
    io::copy(&mut reader, &mut hasher)?;
    Ok(hasher.finalize_hex())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn known_vectors() {
        assert_eq!(
            digest_bytes(DigestAlgorithm::Md5, b"hello"),
            "5d41402abc4b2a76b9719d911017c592"
        );
        assert_eq!(
            digest_bytes(DigestAlgorithm::Sha1, b"hello"),
            "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d"
        );
        assert_eq!(
            digest_bytes(DigestAlgorithm::Sha256, b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(
            digest_bytes(DigestAlgorithm::Sha512, b"hello"),
            "9b71d224bd62f3785d96d46ad3ea3d73319bfbc2890caadae2dff72519673ca7\
             2323c3d99ba5c11d7c7acc6e14b8c5da0c4663475c2e5c3adef46f73bcdec043"
        );
    }

    #[test]
    fn output_lengths_match_algorithm() {
        for alg in DigestAlgorithm::ALL {
            let digest = digest_bytes(alg, b"length check");
            assert_eq!(digest.len(), alg.hex_len(), "{alg}");
            assert!(alg.is_valid_digest(&digest));
            assert_eq!(digest, digest.to_lowercase());
        }
    }

    #[test]
    fn reader_matches_bytes() {
        let data = vec![7u8; 100_000];
        for alg in DigestAlgorithm::ALL {
            let streamed = digest_reader(alg, data.as_slice()).unwrap();
            assert_eq!(streamed, digest_bytes(alg, &data));
        }
    }

    #[test]
    fn hasher_reports_algorithm() {
        for alg in DigestAlgorithm::ALL {
            assert_eq!(Hasher::new(alg).algorithm(), alg);
        }
    }

    proptest! {
        #[test]
        fn digest_is_deterministic(data in proptest::collection::vec(any::<u8>(), 0..2048)) {
            for alg in [DigestAlgorithm::Sha512, DigestAlgorithm::Sha256, DigestAlgorithm::Blake3] {
                prop_assert_eq!(digest_bytes(alg, &data), digest_bytes(alg, &data));
            }
        }
    }
}
