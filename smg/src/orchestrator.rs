//! Run attestation rounds for MOAS claims.
//!
//! A round moves through fixed stages and stops at the first failure:
//!
//! ```txt
//! VALIDATE -> DIGEST -> MAP_TO_CURVE -> SIGN (parallel) -> COMBINE -> VERIFY -> CROSS_CHECK
//! ```
//!
//! [Orchestrator::attest] covers the stages up to COMBINE and produces an [Attestation];
//! [Orchestrator::verify] covers VERIFY and CROSS_CHECK, and is all a relying party needs.

use crate::{claim::Claim, directory::Directory, Error};
use moas_cryptography::{
    bls12381::{
        multisig::{
            combine, group_verify, map_to_message_point, partial_sign, partial_verify,
            AggregateSignature, PartialSignature, PartyKey,
        },
        primitives::group::G2,
    },
    Digest,
};
use moas_rpki::{OriginValidator, Prefix, Roa, Route, State};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Configuration for an [Orchestrator].
#[derive(Clone, Debug, Default)]
pub struct Config {
    /// Check every partial signature against its signer's public key before combining,
    /// failing with [Error::FaultySigners] instead of producing an aggregate that will not verify.
    pub verify_partials: bool,
}

/// A claim together with the aggregate signature of its origins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attestation {
    pub claim: Claim,
    pub signature: AggregateSignature,
}

/// The outcome of verifying an [Attestation].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verdict {
    pub digest: Digest,
    /// Whether the aggregate signature was produced by exactly the claim's origins.
    pub signature_valid: bool,
    /// Route origin validation of the claimed prefix and its first origin.
    pub state: State,
    pub roa: Option<Roa>,
}

impl Verdict {
    /// Returns whether the claim can be trusted: validly signed and authorized by RPKI.
    pub fn trusted(&self) -> bool {
        self.signature_valid && self.state == State::Valid
    }
}

/// Drives attestation rounds against a fixed [Directory] and [OriginValidator].
pub struct Orchestrator<V: OriginValidator> {
    cfg: Config,
    directory: Directory,
    validator: V,
}

impl<V: OriginValidator> Orchestrator<V> {
    pub fn new(cfg: Config, directory: Directory, validator: V) -> Self {
        Self {
            cfg,
            directory,
            validator,
        }
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Collects a partial signature from every origin of `claim` (using `keys`, indexed by AS
    /// number) and combines them.
    pub fn attest(
        &self,
        claim: &Claim,
        keys: &BTreeMap<u32, PartyKey>,
    ) -> Result<Attestation, Error> {
        let (digest, hm) = prepare(claim)?;
        debug!(%digest, "mapped claim to curve");

        // Resolve every origin before any signing
        let origins = origins(claim);
        let signers = origins
            .iter()
            .map(|&asn| self.directory.index(asn).ok_or(Error::UnknownOrigin(asn)))
            .collect::<Result<Vec<_>, _>>()?;
        let keys = origins
            .iter()
            .map(|asn| keys.get(asn).ok_or(Error::MissingPartial(*asn)))
            .collect::<Result<Vec<_>, _>>()?;

        // Sign
        let partials: Vec<PartialSignature> =
            keys.par_iter().map(|key| partial_sign(&hm, key)).collect();
        debug!(count = partials.len(), "collected partial signatures");

        // Isolate faults
        if self.cfg.verify_partials {
            let faulty = self.faulty(&hm, &origins, &signers, &partials);
            if !faulty.is_empty() {
                warn!(?faulty, "rejected partial signatures");
                return Err(Error::FaultySigners(faulty));
            }
        }

        // Combine
        let signature = combine(self.directory.setup(), &hm, &signers, &partials)?;
        info!(claim = %claim, %digest, signers = signers.len(), "combined signature");
        Ok(Attestation {
            claim: claim.clone(),
            signature,
        })
    }

    /// Returns the AS numbers whose partial signature does not verify under their registered key.
    fn faulty(
        &self,
        hm: &G2,
        origins: &[u32],
        signers: &[u32],
        partials: &[PartialSignature],
    ) -> Vec<u32> {
        let setup = self.directory.setup();
        origins
            .par_iter()
            .zip(signers)
            .zip(partials)
            .filter(|((_, index), partial)| {
                partial.index != **index || !partial_verify(setup, hm, partial)
            })
            .map(|((asn, _), _)| *asn)
            .collect()
    }

    /// Verifies `attestation` and cross-checks its claim against the origin validator.
    ///
    /// A signature that does not verify is reported in the [Verdict], not as an error. Errors
    /// are reserved for malformed claims, origins missing from the directory and an
    /// unavailable origin validator.
    pub fn verify(&self, attestation: &Attestation) -> Result<Verdict, Error> {
        let claim = &attestation.claim;
        let (digest, hm) = prepare(claim)?;

        // The signature must come from exactly the claimed origins, in order
        let expected = origins(claim)
            .into_iter()
            .map(|asn| self.directory.index(asn).ok_or(Error::UnknownOrigin(asn)))
            .collect::<Result<Vec<_>, _>>()?;
        let signature_valid = attestation.signature.signers() == expected.as_slice()
            && group_verify(self.directory.setup(), &hm, &attestation.signature);
        if !signature_valid {
            warn!(claim = %claim, %digest, "signature invalid");
        }

        // Cross-check
        let (prefix, first) = route(claim)?;
        let (roa, state) = self.validator.validate(&Route { prefix, asn: first })?;
        info!(claim = %claim, signature_valid, %state, "verified attestation");
        Ok(Verdict {
            digest,
            signature_valid,
            state,
            roa,
        })
    }

    /// Runs a complete round.
    pub fn run(&self, claim: &Claim, keys: &BTreeMap<u32, PartyKey>) -> Result<Verdict, Error> {
        let attestation = self.attest(claim, keys)?;
        self.verify(&attestation)
    }
}

/// Validates `claim` and maps its digest to the curve.
fn prepare(claim: &Claim) -> Result<(Digest, G2), Error> {
    if let Err(reason) = claim.validate() {
        warn!(claim = %claim, ?reason, "rejected claim");
        return Err(Error::Invalid(reason));
    }
    let digest = claim.digest().map_err(Error::Encode)?;
    let hm = map_to_message_point(&digest);
    Ok((digest, hm))
}

/// Returns the origins of a validated claim.
fn origins(claim: &Claim) -> Vec<u32> {
    // Range checked by `Claim::validate`
    claim.origin_asns().iter().map(|&asn| asn as u32).collect()
}

fn route(claim: &Claim) -> Result<(Prefix, u32), Error> {
    let prefix = claim
        .origin_prefix()
        .ok_or(Error::Invalid(crate::claim::FormatError::PrefixInvalid))?;
    let first = origins(claim)
        .first()
        .copied()
        .ok_or(Error::Invalid(crate::claim::FormatError::EmptyOriginList))?;
    Ok((prefix, first))
}
