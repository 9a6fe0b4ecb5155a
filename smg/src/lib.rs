//! Jointly attest to Multi-Origin AS (MOAS) announcements with aggregate signatures.
//!
//! When a prefix is legitimately announced by several Autonomous Systems at once, every origin
//! signs a canonical [Claim] naming all of them. The partial signatures are combined into a single
//! BLS12-381 aggregate signature that any relying party can verify against the origins' registered
//! public keys, and the claim is then cross-checked against RPKI origin authorization data.
//!
//! # Overview
//!
//! * [claim]: the canonical, hashable MOAS claim (ASN.1 DER, SHA-256).
//! * [directory]: AS number to party mapping, admitting keys by proof of possession.
//! * [orchestrator]: runs attestation rounds and produces a [Verdict].
//!
//! # Example
//!
//! ```rust
//! use moas_rpki::{Roa, Vrps};
//! use moas_smg::{AddressFamily, Claim, Config, Directory, Orchestrator};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! // Register the origins (here with a trusted dealer)
//! let (directory, keys) = Directory::dealer(&mut StdRng::seed_from_u64(0), &[65001, 65011]).unwrap();
//!
//! // Load origin authorization data
//! let vrps = Vrps::new(vec![Roa::new("10.0.0.0/24".parse().unwrap(), 24, 65001).unwrap()]);
//!
//! // Attest and verify
//! let orchestrator = Orchestrator::new(Config::default(), directory, vrps);
//! let claim = Claim::with_origins(&[65001, 65011], AddressFamily::Ipv4, "10.0.0.0/24");
//! let verdict = orchestrator.run(&claim, &keys).unwrap();
//! assert!(verdict.trusted());
//! ```

pub mod claim;
pub use claim::{AddressFamily, Claim, FormatError};
pub mod directory;
pub use directory::{Directory, Registration};
pub mod orchestrator;
pub use orchestrator::{Attestation, Config, Orchestrator, Verdict};

use moas_codec::Error as CodecError;
use moas_cryptography::bls12381::primitives::Error as CryptoError;
use thiserror::Error;

/// Errors that can occur while attesting to or verifying a claim.
#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot encode claim: {0}")]
    Encode(FormatError),
    #[error("cannot decode claim: {0}")]
    Decode(#[from] CodecError),
    #[error("invalid claim: {0}")]
    Invalid(FormatError),
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
    #[error("origin validation failed: {0}")]
    Origin(#[from] moas_rpki::Error),
    #[error("AS{0} is not registered")]
    UnknownOrigin(u32),
    #[error("no partial signature from AS{0}")]
    MissingPartial(u32),
    #[error("faulty partial signatures from {0:?}")]
    FaultySigners(Vec<u32>),
    #[error("AS{0} registered more than once")]
    DuplicateRegistration(u32),
    #[error("invalid proof of possession for AS{0}")]
    InvalidRegistration(u32),
    #[error("AS{asn} registered as party {found}, expected {expected}")]
    IndexMismatch { asn: u32, expected: u32, found: u32 },
}
