//! Map AS numbers to parties of the signing group.
//!
//! Each AS generates its key locally and publishes a [Registration]: its AS number, the
//! party index it was assigned, its public key and a proof of possession for that key. A
//! [Directory] admits a registration only if its proof verifies, so no AS can register a
//! public key crafted to cancel out the keys of others.

use crate::Error;
use bytes::{Buf, BufMut};
use moas_codec::{Error as CodecError, FixedSize, Read, ReadExt, Write};
use moas_cryptography::bls12381::{
    multisig::{self, verify_possession, GroupSetup, PartyKey},
    primitives::group::{Public, G2},
};
use rand::{CryptoRng, RngCore};
use std::collections::{BTreeMap, HashMap};

/// A public key published by an AS for admission into a [Directory].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registration {
    pub asn: u32,
    pub index: u32,
    pub public: Public,
    pub proof: G2,
}

impl Registration {
    /// Creates a registration for `key`, proving possession of its secret.
    pub fn new(asn: u32, key: &PartyKey) -> Self {
        Self {
            asn,
            index: key.index(),
            public: *key.public(),
            proof: key.prove_possession(),
        }
    }
}

impl Write for Registration {
    fn write(&self, buf: &mut impl BufMut) {
        self.asn.write(buf);
        self.index.write(buf);
        self.public.write(buf);
        self.proof.write(buf);
    }
}

impl Read for Registration {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        let asn = u32::read(buf)?;
        let index = u32::read(buf)?;
        let public = Public::read(buf)?;
        let proof = G2::read(buf)?;
        Ok(Self {
            asn,
            index,
            public,
            proof,
        })
    }
}

impl FixedSize for Registration {
    const SIZE: usize = u32::SIZE + u32::SIZE + Public::SIZE + G2::SIZE;
}

/// The signing group and the AS number behind each of its parties.
#[derive(Clone, Debug)]
pub struct Directory {
    setup: GroupSetup,
    asns: Vec<u32>,
    indices: HashMap<u32, u32>,
}

impl Directory {
    /// Admits `registrations` into a new directory.
    ///
    /// Party indices must cover `0..registrations.len()` exactly once (in any order), every
    /// AS number must be distinct, and every proof of possession must verify.
    pub fn new(mut registrations: Vec<Registration>) -> Result<Self, Error> {
        registrations.sort_by_key(|r| r.index);

        let mut asns = Vec::with_capacity(registrations.len());
        let mut publics = Vec::with_capacity(registrations.len());
        let mut indices = HashMap::with_capacity(registrations.len());
        for (expected, registration) in registrations.iter().enumerate() {
            let expected = expected as u32;
            if registration.index != expected {
                return Err(Error::IndexMismatch {
                    asn: registration.asn,
                    expected,
                    found: registration.index,
                });
            }
            if indices.insert(registration.asn, expected).is_some() {
                return Err(Error::DuplicateRegistration(registration.asn));
            }
            verify_possession(&registration.public, &registration.proof)
                .map_err(|_| Error::InvalidRegistration(registration.asn))?;
            asns.push(registration.asn);
            publics.push(registration.public);
        }
        Ok(Self {
            setup: GroupSetup::new(publics),
            asns,
            indices,
        })
    }

    /// Generates keys for every AS in `asns` with a trusted dealer.
    ///
    /// Returns the directory and each AS's key. The caller learns every secret.
    pub fn dealer<R: RngCore + CryptoRng>(
        rng: &mut R,
        asns: &[u32],
    ) -> Result<(Self, BTreeMap<u32, PartyKey>), Error> {
        let (_, keys) = multisig::dealer(rng, asns.len() as u32);
        let registrations = asns
            .iter()
            .zip(&keys)
            .map(|(&asn, key)| Registration::new(asn, key))
            .collect();
        let directory = Self::new(registrations)?;
        let keys = asns.iter().copied().zip(keys).collect();
        Ok((directory, keys))
    }

    pub fn setup(&self) -> &GroupSetup {
        &self.setup
    }

    /// Returns the party index of `asn`.
    pub fn index(&self, asn: u32) -> Option<u32> {
        self.indices.get(&asn).copied()
    }

    /// Returns the AS number of the party at `index`.
    pub fn asn(&self, index: u32) -> Option<u32> {
        self.asns.get(index as usize).copied()
    }

    pub fn len(&self) -> usize {
        self.asns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.asns.is_empty()
    }
}
