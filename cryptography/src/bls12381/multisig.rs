//! Multi-party signatures over a fixed group of parties.
//!
//! A [GroupSetup] lists the public key of each of `n` parties. Any subset of
//! those parties can sign the same message point with [partial_sign]; an
//! (untrusted) aggregator sums the partials with [combine]; anyone holding the
//! [GroupSetup] can then check the result with [group_verify].
//!
//! # Trust Boundary
//!
//! [combine] does not check that a partial signature was produced by the party
//! it is attributed to. Soundness rests entirely on the pairing identity checked
//! by [group_verify]: a forged, swapped or missing partial makes verification
//! fail, but does not say which signer was at fault. Callers that need to blame
//! a specific signer can run [partial_verify] on each partial before combining.
//!
//! # Key Generation
//!
//! [dealer] generates every party's key in one place (a trusted dealer). This is
//! convenient for tests and single-operator deployments but means one entity
//! sees every secret. Parties that do not trust a dealer should each call
//! [PartyKey::generate] locally and publish only their public key together with a
//! proof of possession ([PartyKey::prove_possession]); a [GroupSetup] can then
//! be assembled from the published keys with [GroupSetup::new].
//!
//! # Example
//!
//! ```rust
//! use moas_cryptography::bls12381::multisig::{combine, dealer, group_verify, map_to_message_point, partial_sign};
//! use rand::rngs::OsRng;
//!
//! let (setup, keys) = dealer(&mut OsRng, 4);
//! let hm = map_to_message_point(&[7u8; 32]);
//!
//! // Parties 1 and 3 sign
//! let partials: Vec<_> = [&keys[1], &keys[3]].iter().map(|k| partial_sign(&hm, k)).collect();
//! let aggregate = combine(&setup, &hm, &[1, 3], &partials).unwrap();
//! assert!(group_verify(&setup, &hm, &aggregate));
//! ```

use super::primitives::{
    group::{Element, Private, Public, Scalar, DST_MESSAGE, G1, G2},
    ops::{
        compute_public, hash_message, sign_hashed, sign_proof_of_possession, verify_hashed,
        verify_proof_of_possession,
    },
    Error,
};
use bytes::{Buf, BufMut};
use moas_codec::{EncodeSize, Error as CodecError, FixedSize, RangeCfg, Read, ReadExt, Write};
use rand::{CryptoRng, RngCore};
use std::collections::BTreeSet;
use zeroize::Zeroize;

/// A party's key pair and its position in the [GroupSetup].
///
/// The secret scalar is zeroized when the key is dropped.
pub struct PartyKey {
    index: u32,
    private: Private,
    public: Public,
}

impl PartyKey {
    /// Generates a fresh key pair locally for the party at `index`.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R, index: u32) -> Self {
        let private = Private::rand(rng);
        Self::from_private(index, private)
    }

    /// Restores a key pair from its secret scalar.
    pub fn from_private(index: u32, private: Scalar) -> Self {
        let public = compute_public(&private);
        Self {
            index,
            private,
            public,
        }
    }

    /// Returns the party's position in the [GroupSetup].
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Returns the party's public key.
    pub fn public(&self) -> &Public {
        &self.public
    }

    /// Proves that the holder of this key knows the secret behind its public key.
    pub fn prove_possession(&self) -> G2 {
        sign_proof_of_possession(&self.private)
    }
}

impl Drop for PartyKey {
    fn drop(&mut self) {
        self.private.zeroize();
    }
}

impl std::fmt::Debug for PartyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartyKey")
            .field("index", &self.index)
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

/// Verifies a proof of possession published alongside `public`.
pub fn verify_possession(public: &Public, proof: &G2) -> Result<(), Error> {
    verify_proof_of_possession(public, proof)
}

/// The public keys of every party in the group, ordered by party index.
///
/// Immutable once constructed and safe to share across threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSetup {
    publics: Vec<Public>,
}

impl GroupSetup {
    /// Creates a setup from the parties' public keys (party `i` owns `publics[i]`).
    ///
    /// # Warning
    ///
    /// When public keys were not produced by a trusted [dealer], the caller must have
    /// checked a proof of possession for each of them (see [verify_possession]).
    pub fn new(publics: Vec<Public>) -> Self {
        Self { publics }
    }

    /// Returns the number of parties.
    pub fn len(&self) -> u32 {
        self.publics.len() as u32
    }

    /// Returns whether the group has no parties.
    pub fn is_empty(&self) -> bool {
        self.publics.is_empty()
    }

    /// Returns the public key of the party at `index`.
    pub fn public(&self, index: u32) -> Option<&Public> {
        self.publics.get(index as usize)
    }

    /// Returns all public keys.
    pub fn publics(&self) -> &[Public] {
        &self.publics
    }
}

impl Write for GroupSetup {
    fn write(&self, buf: &mut impl BufMut) {
        self.publics.write(buf);
    }
}

impl EncodeSize for GroupSetup {
    fn encode_size(&self) -> usize {
        self.publics.encode_size()
    }
}

impl Read for GroupSetup {
    /// Maximum number of parties.
    type Cfg = u32;

    fn read_cfg(buf: &mut impl Buf, max: &u32) -> Result<Self, CodecError> {
        let publics = Vec::<Public>::read_cfg(buf, &(RangeCfg::from(1..=*max as usize), ()))?;
        Ok(Self { publics })
    }
}

/// Generates `n` key pairs in one place and returns the shared setup along with every party's key.
///
/// This is a trusted-dealer construction: whoever runs it learns every secret.
pub fn dealer<R: RngCore + CryptoRng>(rng: &mut R, n: u32) -> (GroupSetup, Vec<PartyKey>) {
    let keys: Vec<_> = (0..n).map(|i| PartyKey::generate(rng, i)).collect();
    let setup = GroupSetup::new(keys.iter().map(|k| k.public).collect());
    (setup, keys)
}

/// Maps a message digest onto G2 (RFC 9380 hash-to-curve).
///
/// The same digest always maps to the same point.
pub fn map_to_message_point(digest: &[u8]) -> G2 {
    hash_message(DST_MESSAGE, digest)
}

/// One party's signature over a message point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialSignature {
    pub index: u32,
    pub value: G2,
}

impl Write for PartialSignature {
    fn write(&self, buf: &mut impl BufMut) {
        self.index.write(buf);
        self.value.write(buf);
    }
}

impl Read for PartialSignature {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        let index = u32::read(buf)?;
        let value = G2::read(buf)?;
        Ok(Self { index, value })
    }
}

impl FixedSize for PartialSignature {
    const SIZE: usize = u32::SIZE + G2::SIZE;
}

/// Signs the message point `hm` with `key`.
///
/// Reads nothing but `key`, so any number of parties may sign concurrently.
pub fn partial_sign(hm: &G2, key: &PartyKey) -> PartialSignature {
    PartialSignature {
        index: key.index,
        value: sign_hashed(&key.private, hm),
    }
}

/// Checks a single partial signature against its claimed signer's public key.
///
/// Returns `false` if the signer is not part of `setup` or the signature is invalid.
pub fn partial_verify(setup: &GroupSetup, hm: &G2, partial: &PartialSignature) -> bool {
    let Some(public) = setup.public(partial.index) else {
        return false;
    };
    verify_hashed(public, hm, &partial.value).is_ok()
}

/// The sum of the partial signatures of a set of signers over one message point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateSignature {
    signers: Vec<u32>,
    value: G2,
}

impl AggregateSignature {
    /// Returns the indices of the parties whose partials were combined, in the order given.
    pub fn signers(&self) -> &[u32] {
        &self.signers
    }

    /// Returns the combined point.
    pub fn value(&self) -> &G2 {
        &self.value
    }
}

impl Write for AggregateSignature {
    fn write(&self, buf: &mut impl BufMut) {
        self.signers.write(buf);
        self.value.write(buf);
    }
}

impl EncodeSize for AggregateSignature {
    fn encode_size(&self) -> usize {
        self.signers.encode_size() + self.value.encode_size()
    }
}

impl Read for AggregateSignature {
    /// Maximum number of signers.
    type Cfg = u32;

    fn read_cfg(buf: &mut impl Buf, max: &u32) -> Result<Self, CodecError> {
        let signers = Vec::<u32>::read_cfg(buf, &(RangeCfg::from(1..=*max as usize), ()))?;
        let value = G2::read(buf)?;
        Ok(Self { signers, value })
    }
}

/// Combines the partial signatures of `signers` over `hm` into one [AggregateSignature].
///
/// `signers[i]` names the party that produced `partials[i]`. The signer list is checked
/// (equal lengths, non-empty, in range, no repeats) before any curve arithmetic runs. The
/// partials themselves are not verified: see the module-level documentation.
pub fn combine(
    setup: &GroupSetup,
    _hm: &G2,
    signers: &[u32],
    partials: &[PartialSignature],
) -> Result<AggregateSignature, Error> {
    if signers.len() != partials.len() {
        return Err(Error::LengthMismatch(signers.len(), partials.len()));
    }
    check_signers(setup, signers)?;

    let mut value = G2::zero();
    for partial in partials {
        value.add(&partial.value);
    }
    Ok(AggregateSignature {
        signers: signers.to_vec(),
        value,
    })
}

fn check_signers(setup: &GroupSetup, signers: &[u32]) -> Result<(), Error> {
    if signers.is_empty() {
        return Err(Error::NoSigners);
    }
    let mut seen = BTreeSet::new();
    for &signer in signers {
        if signer >= setup.len() {
            return Err(Error::SignerOutOfRange(signer, setup.len()));
        }
        if !seen.insert(signer) {
            return Err(Error::DuplicateSigner(signer));
        }
    }
    Ok(())
}

/// Returns the sum of the public keys of `signers`.
pub fn aggregate_public(setup: &GroupSetup, signers: &[u32]) -> Result<G1, Error> {
    check_signers(setup, signers)?;
    let mut public = G1::zero();
    for &signer in signers {
        // Checked above
        if let Some(p) = setup.public(signer) {
            public.add(p);
        }
    }
    Ok(public)
}

/// Verifies an aggregate signature over `hm`.
///
/// Recomputes the aggregate public key of the listed signers and checks
/// `e(signature, G1::one()) == e(hm, aggregate_public)`. Any malformed signer list
/// (empty, out of range, repeated) or identity signature yields `false`.
pub fn group_verify(setup: &GroupSetup, hm: &G2, signature: &AggregateSignature) -> bool {
    if signature.value.is_zero() {
        return false;
    }
    let Ok(public) = aggregate_public(setup, &signature.signers) else {
        return false;
    };
    if public.is_zero() {
        return false;
    }
    verify_hashed(&public, hm, &signature.value).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use moas_codec::{Decode, Encode};
    use rand::{rngs::StdRng, SeedableRng};

    fn sign_subset(keys: &[PartyKey], hm: &G2, subset: &[u32]) -> Vec<PartialSignature> {
        subset
            .iter()
            .map(|&i| partial_sign(hm, &keys[i as usize]))
            .collect()
    }

    #[test]
    fn test_every_subset_verifies() {
        let (setup, keys) = dealer(&mut StdRng::seed_from_u64(0), 4);
        let hm = map_to_message_point(b"subset");
        for mask in 1u32..16 {
            let subset: Vec<u32> = (0..4).filter(|i| mask & (1 << i) != 0).collect();
            let partials = sign_subset(&keys, &hm, &subset);
            let aggregate = combine(&setup, &hm, &subset, &partials).unwrap();
            assert!(group_verify(&setup, &hm, &aggregate), "subset {subset:?}");
        }
    }

    #[test]
    fn test_signer_order_irrelevant() {
        let (setup, keys) = dealer(&mut StdRng::seed_from_u64(1), 5);
        let hm = map_to_message_point(b"order");
        let subset = [4, 0, 2];
        let partials = sign_subset(&keys, &hm, &subset);
        let aggregate = combine(&setup, &hm, &subset, &partials).unwrap();
        assert_eq!(aggregate.signers(), &subset);
        assert!(group_verify(&setup, &hm, &aggregate));
    }

    #[test]
    fn test_outsider_partial_rejected() {
        let mut rng = StdRng::seed_from_u64(2);
        let (setup, keys) = dealer(&mut rng, 4);
        let outsider = PartyKey::generate(&mut rng, 1);
        let hm = map_to_message_point(b"outsider");

        let mut partials = sign_subset(&keys, &hm, &[0, 1]);
        partials[1] = partial_sign(&hm, &outsider);
        let aggregate = combine(&setup, &hm, &[0, 1], &partials).unwrap();
        assert!(!group_verify(&setup, &hm, &aggregate));
    }

    #[test]
    fn test_wrong_message_partial_rejected() {
        let (setup, keys) = dealer(&mut StdRng::seed_from_u64(3), 4);
        let hm = map_to_message_point(b"right");
        let other = map_to_message_point(b"wrong");

        let mut partials = sign_subset(&keys, &hm, &[0, 2, 3]);
        partials[2] = partial_sign(&other, &keys[3]);
        let aggregate = combine(&setup, &hm, &[0, 2, 3], &partials).unwrap();
        assert!(!group_verify(&setup, &hm, &aggregate));
    }

    #[test]
    fn test_wrong_signer_index_rejected() {
        let (setup, keys) = dealer(&mut StdRng::seed_from_u64(4), 4);
        let hm = map_to_message_point(b"index");
        let partials = sign_subset(&keys, &hm, &[0, 1]);

        // Partials from {0, 1} attributed to {0, 2}
        let aggregate = combine(&setup, &hm, &[0, 2], &partials).unwrap();
        assert!(!group_verify(&setup, &hm, &aggregate));
    }

    #[test]
    fn test_omitted_partial_rejected() {
        let (setup, keys) = dealer(&mut StdRng::seed_from_u64(5), 3);
        let hm = map_to_message_point(b"omit");
        let partials = sign_subset(&keys, &hm, &[0, 1]);
        let mut aggregate = combine(&setup, &hm, &[0, 1], &partials).unwrap();

        // Claim a third signer that never contributed
        aggregate.signers.push(2);
        assert!(!group_verify(&setup, &hm, &aggregate));
    }

    #[test]
    fn test_different_message_rejected() {
        let (setup, keys) = dealer(&mut StdRng::seed_from_u64(6), 3);
        let hm = map_to_message_point(b"one");
        let partials = sign_subset(&keys, &hm, &[0, 1, 2]);
        let aggregate = combine(&setup, &hm, &[0, 1, 2], &partials).unwrap();
        assert!(!group_verify(
            &setup,
            &map_to_message_point(b"two"),
            &aggregate
        ));
    }

    #[test]
    fn test_combine_length_mismatch() {
        let (setup, keys) = dealer(&mut StdRng::seed_from_u64(7), 3);
        let hm = map_to_message_point(b"mismatch");
        let partials = sign_subset(&keys, &hm, &[0]);
        assert_eq!(
            combine(&setup, &hm, &[0, 1], &partials).unwrap_err(),
            Error::LengthMismatch(2, 1)
        );
    }

    #[test]
    fn test_combine_rejects_bad_signers() {
        let (setup, keys) = dealer(&mut StdRng::seed_from_u64(8), 3);
        let hm = map_to_message_point(b"signers");
        let partials = sign_subset(&keys, &hm, &[0, 1]);
        assert_eq!(
            combine(&setup, &hm, &[0, 3], &partials).unwrap_err(),
            Error::SignerOutOfRange(3, 3)
        );
        assert_eq!(
            combine(&setup, &hm, &[1, 1], &partials).unwrap_err(),
            Error::DuplicateSigner(1)
        );
        assert_eq!(
            combine(&setup, &hm, &[], &[]).unwrap_err(),
            Error::NoSigners
        );
    }

    #[test]
    fn test_group_verify_rejects_malformed() {
        let (setup, keys) = dealer(&mut StdRng::seed_from_u64(9), 3);
        let hm = map_to_message_point(b"malformed");
        let partials = sign_subset(&keys, &hm, &[0, 1]);
        let aggregate = combine(&setup, &hm, &[0, 1], &partials).unwrap();

        let mut out_of_range = aggregate.clone();
        out_of_range.signers = vec![0, 7];
        assert!(!group_verify(&setup, &hm, &out_of_range));

        let mut empty = aggregate.clone();
        empty.signers.clear();
        empty.value = G2::zero();
        assert!(!group_verify(&setup, &hm, &empty));

        let mut repeated = aggregate;
        repeated.signers = vec![0, 0];
        assert!(!group_verify(&setup, &hm, &repeated));
    }

    #[test]
    fn test_partial_verify() {
        let mut rng = StdRng::seed_from_u64(10);
        let (setup, keys) = dealer(&mut rng, 3);
        let hm = map_to_message_point(b"partial");
        let good = partial_sign(&hm, &keys[2]);
        assert!(partial_verify(&setup, &hm, &good));

        let mut misattributed = good;
        misattributed.index = 1;
        assert!(!partial_verify(&setup, &hm, &misattributed));

        let mut unknown = good;
        unknown.index = 3;
        assert!(!partial_verify(&setup, &hm, &unknown));
    }

    #[test]
    fn test_local_keys_with_possession() {
        let mut rng = StdRng::seed_from_u64(11);
        let keys: Vec<_> = (0..3).map(|i| PartyKey::generate(&mut rng, i)).collect();
        for key in &keys {
            verify_possession(key.public(), &key.prove_possession()).unwrap();
        }
        assert_eq!(
            verify_possession(keys[0].public(), &keys[1].prove_possession()).unwrap_err(),
            Error::InvalidProofOfPossession
        );

        let setup = GroupSetup::new(keys.iter().map(|k| *k.public()).collect());
        let hm = map_to_message_point(b"local");
        let partials = sign_subset(&keys, &hm, &[0, 2]);
        let aggregate = combine(&setup, &hm, &[0, 2], &partials).unwrap();
        assert!(group_verify(&setup, &hm, &aggregate));
    }

    #[test]
    fn test_party_key_from_private() {
        let key = PartyKey::generate(&mut StdRng::seed_from_u64(12), 0);
        let restored = PartyKey::from_private(0, key.private);
        assert_eq!(restored.public(), key.public());
    }

    #[test]
    fn test_codec() {
        let (setup, keys) = dealer(&mut StdRng::seed_from_u64(13), 3);
        let hm = map_to_message_point(b"codec");
        let partials = sign_subset(&keys, &hm, &[2, 0]);

        let encoded = partials[0].encode();
        assert_eq!(encoded.len(), PartialSignature::SIZE);
        assert_eq!(PartialSignature::decode_cfg(encoded, &()).unwrap(), partials[0]);

        let aggregate = combine(&setup, &hm, &[2, 0], &partials).unwrap();
        let encoded = aggregate.encode();
        assert_eq!(encoded.len(), 4 + 2 * 4 + 96);
        let decoded = AggregateSignature::decode_cfg(encoded.clone(), &setup.len()).unwrap();
        assert_eq!(decoded, aggregate);
        assert!(group_verify(&setup, &hm, &decoded));
        assert!(matches!(
            AggregateSignature::decode_cfg(encoded, &1),
            Err(CodecError::InvalidLength(2))
        ));

        let encoded = setup.encode();
        assert_eq!(GroupSetup::decode_cfg(encoded, &3).unwrap(), setup);
    }
}
