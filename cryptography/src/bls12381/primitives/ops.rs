//! Digital signatures over the BLS12-381 curve.
//!
//! All signatures use the `POP` (Proof of Possession) scheme. For Proof-of-Possession (POP) signatures,
//! the domain separation tag is `BLS_POP_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_`. For signatures over other
//! messages, the domain separation tag is `BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_`. You can read more
//! about DSTs [here](https://datatracker.ietf.org/doc/html/draft-irtf-cfrg-bls-signature-05#section-4.2).

use super::{
    group::{
        Element, Point, Private, Public, Scalar, Signature, DST_MESSAGE, DST_PROOF_OF_POSSESSION,
        G1, G2,
    },
    Error,
};
use blst::{Pairing as blst_pairing, BLS12_381_NEG_G1};
use rand::{CryptoRng, RngCore};

/// Computes the public key from the private key.
pub fn compute_public(private: &Scalar) -> Public {
    let mut public = G1::one();
    public.mul(private);
    public
}

/// Returns a new keypair derived from the provided randomness.
pub fn keypair<R: RngCore + CryptoRng>(rng: &mut R) -> (Private, Public) {
    let private = Private::rand(rng);
    let public = compute_public(&private);
    (private, public)
}

/// Hashes the provided message with the domain separation tag (DST) to G2.
pub fn hash_message(dst: &[u8], message: &[u8]) -> G2 {
    let mut hm = G2::zero();
    hm.map(dst, message);
    hm
}

/// Signs a message that has already been hashed to G2.
pub fn sign_hashed(private: &Private, hm: &G2) -> Signature {
    let mut signature = *hm;
    signature.mul(private);
    signature
}

/// Verifies that `e(hm,pk)` is equal to `e(sig,G1::one())` using a single product check with
/// a negated G1 generator (`e(hm,pk) * e(sig,-G1::one()) == 1`).
///
/// # Warning
///
/// This function assumes a group check was already performed on `public` and `signature`.
pub fn verify_hashed(public: &Public, hm: &G2, signature: &Signature) -> Result<(), Error> {
    // Create a pairing context
    //
    // We only handle pre-hashed messages, so we leave the domain separator tag (`DST`) empty.
    let mut pairing = blst_pairing::new(false, &[]);

    // Convert `sig` into affine and aggregate `e(sig,-G1::one())`
    let q = signature.as_blst_p2_affine();
    unsafe {
        pairing.raw_aggregate(&q, &BLS12_381_NEG_G1);
    }

    // Convert `pk` and `hm` into affine
    let p = public.as_blst_p1_affine();
    let q = hm.as_blst_p2_affine();

    // Aggregate `e(hm,pk)`
    pairing.raw_aggregate(&q, &p);

    // Finalize the pairing accumulation and verify the result
    //
    // If `finalverify()` returns `true`, it means `e(hm,pk) * e(sig,-G1::one()) == 1`. This
    // is equivalent to `e(hm,pk) == e(sig,G1::one())`.
    pairing.commit();
    if !pairing.finalverify(None) {
        return Err(Error::InvalidSignature);
    }
    Ok(())
}

/// Signs the provided message with the private key.
pub fn sign_message(private: &Private, message: &[u8]) -> Signature {
    sign_hashed(private, &hash_message(DST_MESSAGE, message))
}

/// Verifies the signature with the provided public key.
pub fn verify_message(public: &Public, message: &[u8], signature: &Signature) -> Result<(), Error> {
    verify_hashed(public, &hash_message(DST_MESSAGE, message), signature)
}

/// Generates a proof of possession for the private key.
///
/// A proof of possession is a signature by the key over its own public key. Collecting one for
/// every public key before aggregating them prevents rogue key attacks (where a party publishes
/// a public key crafted to cancel out the public keys of others).
pub fn sign_proof_of_possession(private: &Private) -> Signature {
    let public = compute_public(private);
    sign_hashed(
        private,
        &hash_message(DST_PROOF_OF_POSSESSION, &public.to_bytes()),
    )
}

/// Verifies a proof of possession for the provided public key.
pub fn verify_proof_of_possession(public: &Public, signature: &Signature) -> Result<(), Error> {
    let hm = hash_message(DST_PROOF_OF_POSSESSION, &public.to_bytes());
    verify_hashed(public, &hm, signature).map_err(|_| Error::InvalidProofOfPossession)
}
