//! IP prefixes in CIDR notation.

use crate::Error;
use std::{
    fmt,
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
    str::FromStr,
};

/// An IPv4 or IPv6 prefix with its host bits cleared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Prefix {
    addr: IpAddr,
    len: u8,
}

impl Prefix {
    /// Creates a prefix, clearing any host bits set in `addr`.
    pub fn new(addr: IpAddr, len: u8) -> Result<Self, Error> {
        if len > width(&addr) {
            return Err(Error::InvalidPrefix(format!("{addr}/{len}")));
        }
        Ok(Self {
            addr: mask(addr, len),
            len,
        })
    }

    /// Returns the network address.
    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    /// Returns the prefix length in bits.
    pub fn len(&self) -> u8 {
        self.len
    }

    /// Returns whether this is an IPv4 prefix.
    pub fn is_v4(&self) -> bool {
        self.addr.is_ipv4()
    }

    /// Returns the number of bits in an address of this prefix's family (32 or 128).
    pub fn family_width(&self) -> u8 {
        width(&self.addr)
    }

    /// Returns whether `other` lies within this prefix (same family, at least as specific).
    pub fn covers(&self, other: &Prefix) -> bool {
        if self.addr.is_ipv4() != other.addr.is_ipv4() || self.len > other.len {
            return false;
        }
        mask(other.addr, self.len) == self.addr
    }
}

fn width(addr: &IpAddr) -> u8 {
    match addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

fn mask(addr: IpAddr, len: u8) -> IpAddr {
    match addr {
        IpAddr::V4(v4) => {
            let bits = u32::from(v4);
            let mask = u32::MAX.checked_shl(32 - len as u32).unwrap_or(0);
            IpAddr::V4(Ipv4Addr::from(bits & mask))
        }
        IpAddr::V6(v6) => {
            let bits = u128::from(v6);
            let mask = u128::MAX.checked_shl(128 - len as u32).unwrap_or(0);
            IpAddr::V6(Ipv6Addr::from(bits & mask))
        }
    }
}

impl FromStr for Prefix {
    type Err = Error;

    /// Parses `address/length`. Host bits in the address are accepted and cleared.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidPrefix(s.to_string());
        let (addr, len) = s.split_once('/').ok_or_else(invalid)?;

        // Decimal digits only, no sign and no leading zeros
        if len.is_empty()
            || len.len() > 3
            || !len.bytes().all(|b| b.is_ascii_digit())
            || (len.len() > 1 && len.starts_with('0'))
        {
            return Err(invalid());
        }
        let len: u8 = len.parse().map_err(|_| invalid())?;
        let addr: IpAddr = addr.parse().map_err(|_| invalid())?;
        Self::new(addr, len).map_err(|_| invalid())
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("10.0.0.0/24", "10.0.0.0/24"; "ipv4")]
    #[test_case("10.0.0.77/24", "10.0.0.0/24"; "host bits cleared")]
    #[test_case("0.0.0.0/0", "0.0.0.0/0"; "default route")]
    #[test_case("192.168.1.1/32", "192.168.1.1/32"; "host route")]
    #[test_case("2001:db8::/32", "2001:db8::/32"; "ipv6")]
    #[test_case("2001:db8::1/64", "2001:db8::/64"; "ipv6 host bits")]
    #[test_case("::/0", "::/0"; "ipv6 default")]
    fn test_parse(input: &str, expected: &str) {
        let prefix: Prefix = input.parse().unwrap();
        assert_eq!(prefix.to_string(), expected);
    }

    #[test_case("10.0.0.0/33"; "ipv4 too long")]
    #[test_case("2001:db8::/129"; "ipv6 too long")]
    #[test_case("10.0.0.0"; "no length")]
    #[test_case("10.0.0.0/"; "empty length")]
    #[test_case("10.0.0.0/+8"; "signed length")]
    #[test_case("10.0.0.0/024"; "leading zero")]
    #[test_case("10.0.0/24"; "short address")]
    #[test_case("10.0.0.256/24"; "octet overflow")]
    #[test_case("not-a-prefix"; "garbage")]
    #[test_case("/24"; "no address")]
    fn test_parse_rejects(input: &str) {
        assert!(matches!(
            input.parse::<Prefix>(),
            Err(Error::InvalidPrefix(s)) if s == input
        ));
    }

    #[test]
    fn test_covers() {
        let p24: Prefix = "10.0.4.0/24".parse().unwrap();
        let p26: Prefix = "10.0.4.0/26".parse().unwrap();
        let other: Prefix = "10.0.5.0/26".parse().unwrap();
        let v6: Prefix = "::/0".parse().unwrap();

        assert!(p24.covers(&p24));
        assert!(p24.covers(&p26));
        assert!(!p26.covers(&p24));
        assert!(!p24.covers(&other));
        assert!(!v6.covers(&p24));
        assert!("0.0.0.0/0".parse::<Prefix>().unwrap().covers(&other));
    }

    #[test]
    fn test_family() {
        let v4: Prefix = "10.0.0.0/8".parse().unwrap();
        assert!(v4.is_v4());
        assert_eq!(v4.family_width(), 32);
        assert_eq!(v4.len(), 8);

        let v6: Prefix = "2001:db8::/48".parse().unwrap();
        assert!(!v6.is_v4());
        assert_eq!(v6.family_width(), 128);
    }
}
