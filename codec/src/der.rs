//! Distinguished Encoding Rules (DER) for the small subset of ASN.1 needed to
//! canonically encode structured records.
//!
//! Supported: `INTEGER` (non-negative, up to 64 bits), `PrintableString`,
//! `UTF8String`, `SEQUENCE` and context-specific constructed tags.
//!
//! Every reader in this module rejects encodings that DER forbids (long-form
//! lengths that fit in the short form, integers with redundant leading bytes,
//! and so on). Any byte string accepted by a reader therefore re-encodes to
//! itself, which is what makes the encoding safe to hash and sign.

use crate::{at_least, EncodeSize, Error, Read, Write};
use bytes::{Buf, BufMut, Bytes};

/// Universal and context-specific tags.
pub mod tag {
    pub const INTEGER: u8 = 0x02;
    pub const UTF8_STRING: u8 = 0x0c;
    pub const PRINTABLE_STRING: u8 = 0x13;
    pub const SEQUENCE: u8 = 0x30;

    /// Context-specific, constructed tag `[n]`.
    pub const fn context(n: u8) -> u8 {
        0xa0 | (n & 0x1f)
    }
}

/// Length of an encoded length field.
pub fn length_size(len: usize) -> usize {
    if len < 0x80 {
        1
    } else {
        1 + significant_bytes(len as u64)
    }
}

/// Length of a tag-length header for content of `len` bytes.
pub fn header_size(len: usize) -> usize {
    1 + length_size(len)
}

/// Writes a tag-length header.
pub fn write_header(buf: &mut impl BufMut, tag: u8, len: usize) {
    buf.put_u8(tag);
    if len < 0x80 {
        buf.put_u8(len as u8);
        return;
    }
    let n = significant_bytes(len as u64);
    buf.put_u8(0x80 | n as u8);
    buf.put_slice(&(len as u64).to_be_bytes()[8 - n..]);
}

/// Reads a tag-length header, checking the tag and that the content is present.
///
/// Returns the content length.
pub fn read_header(buf: &mut impl Buf, expected: u8) -> Result<usize, Error> {
    at_least(buf, 2)?;
    let found = buf.get_u8();
    if found != expected {
        return Err(Error::UnexpectedTag { expected, found });
    }
    let first = buf.get_u8();
    let len = if first < 0x80 {
        first as usize
    } else {
        // Indefinite lengths (0x80) are BER-only
        let n = (first & 0x7f) as usize;
        if n == 0 || n > std::mem::size_of::<u32>() {
            return Err(Error::NonCanonical("length"));
        }
        at_least(buf, n)?;
        let mut len = 0usize;
        for _ in 0..n {
            len = (len << 8) | buf.get_u8() as usize;
        }
        if len < 0x80 || significant_bytes(len as u64) != n {
            return Err(Error::NonCanonical("length"));
        }
        len
    };
    at_least(buf, len)?;
    Ok(len)
}

/// Reads a complete tag-length-value and returns its content.
pub fn read_tlv(buf: &mut impl Buf, expected: u8) -> Result<Bytes, Error> {
    let len = read_header(buf, expected)?;
    Ok(buf.copy_to_bytes(len))
}

/// Returns an error if a constructed value has unread content.
pub fn finish(content: &impl Buf) -> Result<(), Error> {
    match content.remaining() {
        0 => Ok(()),
        n => Err(Error::ExtraData(n)),
    }
}

fn significant_bytes(v: u64) -> usize {
    (8 - (v.leading_zeros() / 8) as usize).max(1)
}

/// A non-negative `INTEGER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Integer(pub u64);

impl Integer {
    fn content_size(&self) -> usize {
        // A leading zero byte is needed when the high bit would read as a sign
        let n = significant_bytes(self.0);
        if (self.0 >> ((n - 1) * 8)) & 0x80 != 0 {
            n + 1
        } else {
            n
        }
    }
}

impl Write for Integer {
    fn write(&self, buf: &mut impl BufMut) {
        let len = self.content_size();
        write_header(buf, tag::INTEGER, len);
        if len > 8 {
            buf.put_u8(0);
            buf.put_slice(&self.0.to_be_bytes());
        } else {
            buf.put_slice(&self.0.to_be_bytes()[8 - len..]);
        }
    }
}

impl EncodeSize for Integer {
    fn encode_size(&self) -> usize {
        let len = self.content_size();
        header_size(len) + len
    }
}

impl Read for Integer {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, Error> {
        let content = read_tlv(buf, tag::INTEGER)?;
        if content.is_empty() {
            return Err(Error::InvalidLength(0));
        }
        if content[0] & 0x80 != 0 {
            return Err(Error::InvalidData("integer", "negative"));
        }
        if content.len() > 1 && content[0] == 0 && content[1] & 0x80 == 0 {
            return Err(Error::NonCanonical("integer"));
        }
        let digits = if content[0] == 0 && content.len() > 1 {
            &content[1..]
        } else {
            &content[..]
        };
        if digits.len() > 8 {
            return Err(Error::IntegerOverflow("integer"));
        }
        let value = digits.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64);
        Ok(Self(value))
    }
}

/// A character string, encoded as `PrintableString` when every character is
/// in the printable set and as `UTF8String` otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text(pub String);

impl Text {
    fn tag(&self) -> u8 {
        if self.0.bytes().all(is_printable) {
            tag::PRINTABLE_STRING
        } else {
            tag::UTF8_STRING
        }
    }
}

/// Returns whether `b` belongs to the ASN.1 `PrintableString` character set.
pub fn is_printable(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b' ' | b'\'' | b'(' | b')' | b'+' | b',' | b'-' | b'.' | b'/' | b':' | b'=' | b'?'
        )
}

impl Write for Text {
    fn write(&self, buf: &mut impl BufMut) {
        write_header(buf, self.tag(), self.0.len());
        buf.put_slice(self.0.as_bytes());
    }
}

impl EncodeSize for Text {
    fn encode_size(&self) -> usize {
        header_size(self.0.len()) + self.0.len()
    }
}

impl Read for Text {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, Error> {
        at_least(buf, 1)?;
        let found = buf.chunk()[0];
        let content = match found {
            tag::PRINTABLE_STRING => {
                let content = read_tlv(buf, tag::PRINTABLE_STRING)?;
                if !content.iter().copied().all(is_printable) {
                    return Err(Error::InvalidString);
                }
                content
            }
            tag::UTF8_STRING => {
                let content = read_tlv(buf, tag::UTF8_STRING)?;
                if content.iter().copied().all(is_printable) {
                    return Err(Error::NonCanonical("string"));
                }
                content
            }
            _ => {
                return Err(Error::UnexpectedTag {
                    expected: tag::PRINTABLE_STRING,
                    found,
                })
            }
        };
        let text = String::from_utf8(content.to_vec()).map_err(|_| Error::InvalidString)?;
        Ok(Self(text))
    }
}
