//! Operations over the BLS12-381 curve.
//!
//! Public keys live in G1 and signatures (and hashed messages) live in G2.
//!
//! # Acknowledgements
//!
//! _The following crates were used as a reference when implementing this crate. If code is very similar
//! to the reference, it is accompanied by a comment and link._
//!
//! * <https://github.com/celo-org/celo-threshold-bls-rs>: Operations over the BLS12-381 scalar field.
//! * <https://github.com/filecoin-project/blstrs> + <https://github.com/MystenLabs/fastcrypto>: Implementing operations over
//!   the BLS12-381 scalar field with <https://github.com/supranational/blst>.
//!
//! # Example
//!
//! ```rust
//! use moas_cryptography::bls12381::primitives::ops::{keypair, sign_message, verify_message};
//! use rand::rngs::OsRng;
//!
//! let (private, public) = keypair(&mut OsRng);
//! let signature = sign_message(&private, b"hello world");
//! verify_message(&public, b"hello world", &signature).expect("signature should be valid");
//! ```

pub mod group;
pub mod ops;

use thiserror::Error;

/// Errors that can occur when working with BLS12-381 primitives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid {0} point: {1}")]
    InvalidPoint(&'static str, &'static str),
    #[error("invalid proof of possession")]
    InvalidProofOfPossession,
    #[error("signer count mismatch: {0} signers, {1} partial signatures")]
    LengthMismatch(usize, usize),
    #[error("signer {0} out of range (n={1})")]
    SignerOutOfRange(u32, u32),
    #[error("duplicate signer {0}")]
    DuplicateSigner(u32),
    #[error("no signers")]
    NoSigners,
}
