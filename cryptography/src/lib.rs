//! Hash messages, sign them as a group of parties, and verify the combined signature.
//!
//! # Status
//!
//! `moas-cryptography` is **ALPHA** software and is not yet recommended for production use. Developers should
//! expect breaking changes and occasional instability.

pub mod bls12381;
pub mod sha256;
pub use sha256::{hash, Digest, Sha256};

/// Interface that commonly used hashing functions implement.
pub trait Hasher: Clone + Send + Sync + 'static {
    /// Digest generated by the hasher.
    type Digest: AsRef<[u8]> + Copy + Eq + std::fmt::Debug + std::fmt::Display + Send + Sync;

    /// Create a new hasher.
    fn new() -> Self;

    /// Append message to previously recorded data.
    fn update(&mut self, message: &[u8]);

    /// Hash all recorded data and reset the hasher
    /// to the initial state.
    fn finalize(&mut self) -> Self::Digest;

    /// Reset the hasher without generating a hash.
    ///
    /// This function does not need to be called after `finalize`.
    fn reset(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_hasher_reset<H: Hasher>() {
        let mut hasher = H::new();
        hasher.update(b"discarded");
        hasher.reset();
        hasher.update(b"kept");
        let reset = hasher.finalize();

        let mut fresh = H::new();
        fresh.update(b"kept");
        assert_eq!(reset, fresh.finalize());
    }

    fn test_hasher_chunking<H: Hasher>() {
        let mut hasher = H::new();
        hasher.update(b"hello ");
        hasher.update(b"world");
        let chunked = hasher.finalize();

        hasher.update(b"hello world");
        assert_eq!(chunked, hasher.finalize());
    }

    #[test]
    fn test_sha256_reset() {
        test_hasher_reset::<Sha256>();
    }

    #[test]
    fn test_sha256_chunking() {
        test_hasher_chunking::<Sha256>();
    }
}
