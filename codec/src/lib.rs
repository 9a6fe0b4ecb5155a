//! Canonically serialize structured data.
//!
//! # Overview
//!
//! A small binary serialization library designed to:
//! - Serialize structured data into a deterministic binary format
//! - Deserialize untrusted binary input, rejecting anything that would not re-encode to itself
//!
//! Two encodings are provided:
//! - Fixed-width big-endian primitives and length-prefixed lists ([types]), used for curve points,
//!   signer lists and other signature artifacts.
//! - A subset of ASN.1 DER ([der]), used for records whose bytes are hashed and signed.
//!
//! # Example
//!
//! ```
//! use bytes::{Buf, BufMut};
//! use moas_codec::{der, DecodeExt, Encode, EncodeSize, Error, Read, ReadExt, Write};
//!
//! #[derive(Debug, PartialEq)]
//! struct Origin {
//!     asn: u64,
//!     name: String,
//! }
//!
//! impl Origin {
//!     fn content_size(&self) -> usize {
//!         der::Integer(self.asn).encode_size() + der::Text(self.name.clone()).encode_size()
//!     }
//! }
//!
//! impl Write for Origin {
//!     fn write(&self, buf: &mut impl BufMut) {
//!         der::write_header(buf, der::tag::SEQUENCE, self.content_size());
//!         der::Integer(self.asn).write(buf);
//!         der::Text(self.name.clone()).write(buf);
//!     }
//! }
//!
//! impl EncodeSize for Origin {
//!     fn encode_size(&self) -> usize {
//!         let len = self.content_size();
//!         der::header_size(len) + len
//!     }
//! }
//!
//! impl Read for Origin {
//!     type Cfg = ();
//!
//!     fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, Error> {
//!         let mut content = der::read_tlv(buf, der::tag::SEQUENCE)?;
//!         let asn = der::Integer::read(&mut content)?.0;
//!         let name = der::Text::read(&mut content)?.0;
//!         der::finish(&content)?;
//!         Ok(Self { asn, name })
//!     }
//! }
//!
//! let origin = Origin { asn: 65001, name: "example".into() };
//! let encoded = origin.encode();
//! assert_eq!(Origin::decode(encoded).unwrap(), origin);
//! ```

pub mod codec;
pub mod der;
pub mod error;
pub mod types;

pub use codec::{
    at_least, Codec, Decode, DecodeExt, Encode, EncodeSize, FixedSize, Read, ReadExt, Write,
};
pub use error::Error;
pub use types::RangeCfg;
