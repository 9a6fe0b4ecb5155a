//! Core codec traits

use crate::error::Error;
use bytes::{Buf, BufMut, BytesMut};

/// Trait for types that can be written (encoded) to a buffer.
pub trait Write {
    /// Encodes this value by writing to a buffer.
    ///
    /// Implementations should panic if the buffer doesn't have enough capacity.
    fn write(&self, buf: &mut impl BufMut);
}

/// Trait for types that know their exact encoded length.
pub trait EncodeSize {
    /// Returns the encoded length of this value.
    ///
    /// This method MUST return the exact number of bytes that will be written by `write()`.
    fn encode_size(&self) -> usize;
}

/// Trait for types with a known, fixed encoded length.
pub trait FixedSize {
    /// The length of the encoded value.
    const SIZE: usize;
}

impl<T: FixedSize> EncodeSize for T {
    fn encode_size(&self) -> usize {
        Self::SIZE
    }
}

/// Trait for types that can be encoded to a buffer.
pub trait Encode: Write + EncodeSize {
    /// Encodes a value to a `BytesMut` buffer.
    ///
    /// Panics if the `write` implementation does not write the expected number of bytes.
    fn encode(&self) -> BytesMut {
        let len = self.encode_size();
        let mut buffer = BytesMut::with_capacity(len);
        self.write(&mut buffer);
        assert_eq!(buffer.len(), len, "write() did not write expected bytes");
        buffer
    }
}

impl<T: Write + EncodeSize> Encode for T {}

/// Trait for types that can be read (decoded) from a buffer.
///
/// `Cfg` bounds what the reader is willing to accept (e.g. the maximum number
/// of items in a list) when decoding untrusted input. Use `()` for types that
/// need no configuration.
pub trait Read: Sized {
    type Cfg: Clone;

    /// Reads a value from the buffer, consuming the necessary bytes.
    fn read_cfg(buf: &mut impl Buf, cfg: &Self::Cfg) -> Result<Self, Error>;
}

/// Extension trait providing an ergonomic read method for types requiring no configuration.
pub trait ReadExt: Read<Cfg = ()> {
    /// Reads a value using the default `()` config.
    fn read(buf: &mut impl Buf) -> Result<Self, Error> {
        Self::read_cfg(buf, &())
    }
}

impl<T: Read<Cfg = ()>> ReadExt for T {}

/// Trait for types that can be decoded from a buffer, ensuring the entire buffer is consumed.
pub trait Decode: Read {
    /// Decodes a value from a buffer, failing if any bytes remain.
    fn decode_cfg(mut buf: impl Buf, cfg: &Self::Cfg) -> Result<Self, Error> {
        let result = Self::read_cfg(&mut buf, cfg)?;
        let remaining = buf.remaining();
        if remaining > 0 {
            return Err(Error::ExtraData(remaining));
        }
        Ok(result)
    }
}

impl<T: Read> Decode for T {}

/// Extension trait providing an ergonomic decode method for types requiring no configuration.
pub trait DecodeExt: Decode<Cfg = ()> {
    /// Decodes a value using the default `()` config.
    fn decode(buf: impl Buf) -> Result<Self, Error> {
        Self::decode_cfg(buf, &())
    }
}

impl<T: Decode<Cfg = ()>> DecodeExt for T {}

/// Trait for types that can be encoded and decoded.
pub trait Codec: Encode + Decode {}

impl<T: Encode + Decode> Codec for T {}

/// Returns an error if `buf` holds fewer than `len` bytes.
#[inline]
pub fn at_least(buf: &impl Buf, len: usize) -> Result<(), Error> {
    if buf.remaining() < len {
        return Err(Error::EndOfBuffer);
    }
    Ok(())
}
