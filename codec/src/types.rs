//! Fixed-width codec implementations for primitives and bounded lists.
//!
//! All integers are written big-endian. Lists are prefixed with their length
//! as a `u32` and must be decoded with a [RangeCfg] bounding that length, so
//! untrusted input cannot force an oversized allocation.

use crate::{at_least, EncodeSize, Error, FixedSize, Read, Write};
use bytes::{Buf, BufMut};
use std::ops::{RangeFrom, RangeInclusive};

macro_rules! impl_numeric {
    ($type:ty, $read_method:ident, $write_method:ident) => {
        impl Write for $type {
            #[inline]
            fn write(&self, buf: &mut impl BufMut) {
                buf.$write_method(*self);
            }
        }

        impl Read for $type {
            type Cfg = ();

            #[inline]
            fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, Error> {
                at_least(buf, std::mem::size_of::<$type>())?;
                Ok(buf.$read_method())
            }
        }

        impl FixedSize for $type {
            const SIZE: usize = std::mem::size_of::<$type>();
        }
    };
}

impl_numeric!(u8, get_u8, put_u8);
impl_numeric!(u16, get_u16, put_u16);
impl_numeric!(u32, get_u32, put_u32);
impl_numeric!(u64, get_u64, put_u64);

impl<const N: usize> Write for [u8; N] {
    #[inline]
    fn write(&self, buf: &mut impl BufMut) {
        buf.put(&self[..]);
    }
}

impl<const N: usize> Read for [u8; N] {
    type Cfg = ();

    #[inline]
    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, Error> {
        at_least(buf, N)?;
        let mut dst = [0; N];
        buf.copy_to_slice(&mut dst);
        Ok(dst)
    }
}

impl<const N: usize> FixedSize for [u8; N] {
    const SIZE: usize = N;
}

/// Inclusive bounds on the number of items a list may hold when decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeCfg {
    start: usize,
    end: usize,
}

impl RangeCfg {
    /// Returns whether `len` is within bounds.
    pub fn contains(&self, len: usize) -> bool {
        self.start <= len && len <= self.end
    }
}

impl From<RangeInclusive<usize>> for RangeCfg {
    fn from(range: RangeInclusive<usize>) -> Self {
        Self {
            start: *range.start(),
            end: *range.end(),
        }
    }
}

impl From<RangeFrom<usize>> for RangeCfg {
    fn from(range: RangeFrom<usize>) -> Self {
        Self {
            start: range.start,
            end: u32::MAX as usize,
        }
    }
}

impl<T: Write> Write for Vec<T> {
    fn write(&self, buf: &mut impl BufMut) {
        let len = u32::try_from(self.len()).expect("list length exceeds u32");
        len.write(buf);
        for item in self {
            item.write(buf);
        }
    }
}

impl<T: EncodeSize> EncodeSize for Vec<T> {
    fn encode_size(&self) -> usize {
        u32::SIZE + self.iter().map(EncodeSize::encode_size).sum::<usize>()
    }
}

impl<T: Read> Read for Vec<T> {
    type Cfg = (RangeCfg, T::Cfg);

    fn read_cfg(buf: &mut impl Buf, (range, cfg): &Self::Cfg) -> Result<Self, Error> {
        let len = u32::read_cfg(buf, &())? as usize;
        if !range.contains(len) {
            return Err(Error::InvalidLength(len));
        }
        let mut items = Vec::with_capacity(len);
        for _ in 0..len {
            items.push(T::read_cfg(buf, cfg)?);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Decode, DecodeExt, Encode};
    use bytes::Bytes;

    #[test]
    fn test_numeric_big_endian() {
        assert_eq!(&0x0102u16.encode()[..], &[0x01, 0x02]);
        assert_eq!(&7u64.encode()[..], &[0, 0, 0, 0, 0, 0, 0, 7]);
        assert_eq!(u16::decode(Bytes::from_static(&[0x01, 0x02])).unwrap(), 0x0102);
    }

    #[test]
    fn test_array() {
        let value = [9u8; 4];
        let encoded = value.encode();
        assert_eq!(<[u8; 4]>::decode(encoded).unwrap(), value);
        assert!(matches!(
            <[u8; 4]>::decode(Bytes::from_static(&[1, 2, 3])),
            Err(Error::EndOfBuffer)
        ));
    }

    #[test]
    fn test_vec() {
        let items = vec![1u32, 2, 3];
        let encoded = items.encode();
        assert_eq!(encoded.len(), 4 + 3 * 4);
        let cfg = (RangeCfg::from(1..=3), ());
        assert_eq!(Vec::<u32>::decode_cfg(encoded, &cfg).unwrap(), items);
    }

    #[test]
    fn test_vec_length_bound() {
        let encoded = vec![1u32, 2, 3].encode();
        let cfg = (RangeCfg::from(0..=2), ());
        assert!(matches!(
            Vec::<u32>::decode_cfg(encoded, &cfg),
            Err(Error::InvalidLength(3))
        ));
    }

    #[test]
    fn test_vec_truncated() {
        let mut encoded = vec![1u32, 2].encode();
        encoded.truncate(encoded.len() - 1);
        let cfg = (RangeCfg::from(0..), ());
        assert!(matches!(
            Vec::<u32>::decode_cfg(encoded, &cfg),
            Err(Error::EndOfBuffer)
        ));
    }
}
