//! Canonical representation of a Multi-Origin AS (MOAS) claim.
//!
//! A [Claim] asserts that a prefix is legitimately announced by every AS in its origin
//! list. It is immutable once constructed and is only ever hashed and signed as a whole.
//!
//! # Encoding
//!
//! The canonical encoding is ASN.1 DER:
//!
//! ```txt
//! Claim ::= SEQUENCE {
//!     version        INTEGER,
//!     originASNs [0] IMPLICIT SEQUENCE OF INTEGER,
//!     addressFamily  PrintableString,  -- "0001" (IPv4) or "0002" (IPv6)
//!     prefix         PrintableString   -- CIDR
//! }
//! ```
//!
//! DER leaves exactly one valid encoding per value, so [Claim::digest] is stable across
//! implementations. The decoder rejects every encoding DER forbids.

use bytes::{Buf, BufMut, Bytes};
use moas_codec::{
    der::{self, tag, Integer, Text},
    DecodeExt, Encode, EncodeSize, Error as CodecError, Read, ReadExt, Write,
};
use moas_cryptography::{hash, Digest};
use moas_rpki::Prefix;
use std::{collections::BTreeSet, fmt};
use thiserror::Error;

/// The only supported claim version.
pub const VERSION: u8 = 0;

/// The largest representable AS number.
pub const MAX_ASN: u64 = u32::MAX as u64;

/// Address family of the claimed prefix, as carried in its 4-character code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl AddressFamily {
    pub fn code(&self) -> &'static str {
        match self {
            AddressFamily::Ipv4 => "0001",
            AddressFamily::Ipv6 => "0002",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "0001" => Some(AddressFamily::Ipv4),
            "0002" => Some(AddressFamily::Ipv6),
            _ => None,
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The first invariant a claim violates, in checking order.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatError {
    #[error("version is not {VERSION}")]
    VersionInvalid,
    #[error("origin list is empty")]
    EmptyOriginList,
    #[error("origin AS number exceeds {MAX_ASN}")]
    AsnOutOfRange,
    #[error("address family is not 0001 (IPv4) or 0002 (IPv6)")]
    AddressFamilyInvalid,
    #[error("prefix is not a valid CIDR")]
    PrefixInvalid,
    #[error("address family does not match prefix")]
    AddressFamilyMismatch,
    #[error("origin list repeats an AS number")]
    DuplicateOrigin,
}

/// A MOAS claim.
///
/// Fields hold raw values so that malformed claims (received from peers, or built by
/// mistake) can be represented and rejected by [Claim::validate].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Claim {
    version: u8,
    origins: Vec<u64>,
    family: String,
    prefix: String,
}

impl Claim {
    /// Creates a claim without validating it.
    pub fn new(
        version: u8,
        origins: Vec<u64>,
        family: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            version,
            origins,
            family: family.into(),
            prefix: prefix.into(),
        }
    }

    /// Creates a current-version claim from typed values (still unvalidated).
    pub fn with_origins(origins: &[u32], family: AddressFamily, prefix: &str) -> Self {
        Self::new(
            VERSION,
            origins.iter().map(|&asn| asn as u64).collect(),
            family.code(),
            prefix,
        )
    }

    /// Returns the first invariant this claim violates, if any.
    pub fn validate(&self) -> Result<(), FormatError> {
        if self.version != VERSION {
            return Err(FormatError::VersionInvalid);
        }
        if self.origins.is_empty() {
            return Err(FormatError::EmptyOriginList);
        }
        if self.origins.iter().any(|&asn| asn > MAX_ASN) {
            return Err(FormatError::AsnOutOfRange);
        }
        let Some(family) = AddressFamily::from_code(&self.family) else {
            return Err(FormatError::AddressFamilyInvalid);
        };
        let Ok(prefix) = self.prefix.parse::<Prefix>() else {
            return Err(FormatError::PrefixInvalid);
        };
        if prefix.is_v4() != (family == AddressFamily::Ipv4) {
            return Err(FormatError::AddressFamilyMismatch);
        }
        let mut seen = BTreeSet::new();
        if !self.origins.iter().all(|asn| seen.insert(*asn)) {
            return Err(FormatError::DuplicateOrigin);
        }
        Ok(())
    }

    /// Returns the canonical (DER) encoding, refusing to encode an invalid claim.
    pub fn encode_canonical(&self) -> Result<Bytes, FormatError> {
        self.validate()?;
        Ok(Canonical(self).encode().freeze())
    }

    /// Decodes a canonical encoding. The result is not validated.
    pub fn decode_canonical(bytes: &[u8]) -> Result<Self, CodecError> {
        Self::decode(bytes)
    }

    /// Decodes a hex-encoded canonical encoding. The result is not validated.
    pub fn decode_hex(encoded: &str) -> Result<Self, CodecError> {
        let bytes =
            hex::decode(encoded).map_err(|_| CodecError::InvalidData("claim", "invalid hex"))?;
        Self::decode_canonical(&bytes)
    }

    /// Returns the SHA-256 digest of the canonical encoding.
    pub fn digest(&self) -> Result<Digest, FormatError> {
        Ok(hash(&self.encode_canonical()?))
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn origin_asns(&self) -> &[u64] {
        &self.origins
    }

    /// Returns the raw address family code.
    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn address_family(&self) -> Option<AddressFamily> {
        AddressFamily::from_code(&self.family)
    }

    /// Returns the prefix as given.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the parsed prefix with host bits cleared, if it parses.
    pub fn origin_prefix(&self) -> Option<Prefix> {
        self.prefix.parse().ok()
    }
}

impl fmt::Display for Claim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{} {} [", self.version, self.prefix)?;
        for (i, asn) in self.origins.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "AS{asn}")?;
        }
        write!(f, "] family={}", self.family)
    }
}

/// Writer for the DER form.
struct Canonical<'a>(&'a Claim);

impl Canonical<'_> {
    fn origins_size(&self) -> usize {
        self.0
            .origins
            .iter()
            .map(|&asn| Integer(asn).encode_size())
            .sum()
    }

    fn content_size(&self) -> usize {
        let origins = self.origins_size();
        Integer(self.0.version as u64).encode_size()
            + der::header_size(origins)
            + origins
            + Text(self.0.family.clone()).encode_size()
            + Text(self.0.prefix.clone()).encode_size()
    }
}

impl Write for Canonical<'_> {
    fn write(&self, buf: &mut impl BufMut) {
        der::write_header(buf, tag::SEQUENCE, self.content_size());
        Integer(self.0.version as u64).write(buf);
        der::write_header(buf, tag::context(0), self.origins_size());
        for &asn in &self.0.origins {
            Integer(asn).write(buf);
        }
        Text(self.0.family.clone()).write(buf);
        Text(self.0.prefix.clone()).write(buf);
    }
}

impl EncodeSize for Canonical<'_> {
    fn encode_size(&self) -> usize {
        let len = self.content_size();
        der::header_size(len) + len
    }
}

impl Read for Claim {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        let mut content = der::read_tlv(buf, tag::SEQUENCE)?;

        let version = Integer::read(&mut content)?.0;
        let version = u8::try_from(version).map_err(|_| CodecError::IntegerOverflow("version"))?;

        let mut list = der::read_tlv(&mut content, tag::context(0))?;
        let mut origins = Vec::new();
        while list.has_remaining() {
            origins.push(Integer::read(&mut list)?.0);
        }

        let family = Text::read(&mut content)?.0;
        let prefix = Text::read(&mut content)?.0;
        der::finish(&content)?;
        Ok(Self {
            version,
            origins,
            family,
            prefix,
        })
    }
}
