//! Route Origin Authorizations and route origin validation (RFC 6811).

use crate::{Error, Prefix};
use serde::Deserialize;
use std::fmt;
use tracing::debug;

/// A Validated ROA Payload: `asn` may originate `prefix` and any more-specific
/// prefix up to `max_length` bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Roa {
    prefix: Prefix,
    max_length: u8,
    asn: u32,
}

impl Roa {
    /// Creates a ROA, checking that `max_length` lies between the prefix length and the family width.
    pub fn new(prefix: Prefix, max_length: u8, asn: u32) -> Result<Self, Error> {
        if max_length < prefix.len() || max_length > prefix.family_width() {
            return Err(Error::InvalidMaxLength { prefix, max_length });
        }
        Ok(Self {
            prefix,
            max_length,
            asn,
        })
    }

    pub fn prefix(&self) -> &Prefix {
        &self.prefix
    }

    pub fn max_length(&self) -> u8 {
        self.max_length
    }

    pub fn asn(&self) -> u32 {
        self.asn
    }

    /// Returns whether this ROA authorizes `route`.
    ///
    /// A ROA for AS0 authorizes nothing (RFC 6483).
    pub fn matches(&self, route: &Route) -> bool {
        self.asn != 0
            && self.asn == route.asn
            && self.prefix.covers(&route.prefix)
            && route.prefix.len() <= self.max_length
    }
}

impl fmt::Display for Roa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} => AS{}", self.prefix, self.max_length, self.asn)
    }
}

/// A route announcement to classify.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Route {
    pub prefix: Prefix,
    pub asn: u32,
}

/// Route origin validation outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum State {
    /// A covering ROA authorizes the origin at this prefix length.
    Valid,
    /// Covering ROAs exist but none authorizes the origin at this prefix length.
    Invalid,
    /// No ROA covers the prefix.
    Unknown,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Valid => write!(f, "VALID"),
            State::Invalid => write!(f, "INVALID"),
            State::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Classifies routes against RPKI origin authorization data.
pub trait OriginValidator: Send + Sync {
    /// Returns the ROA that decided the outcome (if any) and the outcome.
    ///
    /// Fails only when the validator itself cannot answer (e.g. its data source is
    /// unreachable), which is distinct from [State::Unknown].
    fn validate(&self, route: &Route) -> Result<(Option<Roa>, State), Error>;
}

/// An in-memory set of Validated ROA Payloads.
#[derive(Clone, Debug, Default)]
pub struct Vrps {
    roas: Vec<Roa>,
}

impl Vrps {
    pub fn new(roas: Vec<Roa>) -> Self {
        Self { roas }
    }

    pub fn roas(&self) -> &[Roa] {
        &self.roas
    }

    pub fn len(&self) -> usize {
        self.roas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roas.is_empty()
    }

    /// Loads a relying-party JSON export:
    ///
    /// ```json
    /// {"roas": [{"prefix": "10.0.0.0/24", "maxLength": 24, "asn": "AS65001"}]}
    /// ```
    ///
    /// `asn` may also be a bare number. Unknown fields are ignored.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let export: Export = serde_json::from_str(json)?;
        let roas = export
            .roas
            .into_iter()
            .map(|entry| {
                let prefix: Prefix = entry.prefix.parse()?;
                Roa::new(prefix, entry.max_length, entry.asn.parse()?)
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = roas.len(), "loaded vrps");
        Ok(Self { roas })
    }
}

impl FromIterator<Roa> for Vrps {
    fn from_iter<I: IntoIterator<Item = Roa>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl OriginValidator for Vrps {
    fn validate(&self, route: &Route) -> Result<(Option<Roa>, State), Error> {
        let mut covering = None;
        for roa in &self.roas {
            if !roa.prefix.covers(&route.prefix) {
                continue;
            }
            if roa.matches(route) {
                return Ok((Some(*roa), State::Valid));
            }
            covering.get_or_insert(*roa);
        }
        Ok(match covering {
            Some(roa) => (Some(roa), State::Invalid),
            None => (None, State::Unknown),
        })
    }
}

#[derive(Deserialize)]
struct Export {
    roas: Vec<Entry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Entry {
    prefix: String,
    max_length: u8,
    asn: Asn,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Asn {
    Number(u32),
    Text(String),
}

impl Asn {
    fn parse(self) -> Result<u32, Error> {
        match self {
            Asn::Number(asn) => Ok(asn),
            Asn::Text(text) => {
                let digits = text
                    .strip_prefix("AS")
                    .or_else(|| text.strip_prefix("as"))
                    .unwrap_or(&text);
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(Error::InvalidAsn(text));
                }
                digits.parse().map_err(|_| Error::InvalidAsn(text.clone()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn roa(prefix: &str, max_length: u8, asn: u32) -> Roa {
        Roa::new(prefix.parse().unwrap(), max_length, asn).unwrap()
    }

    fn route(prefix: &str, asn: u32) -> Route {
        Route {
            prefix: prefix.parse().unwrap(),
            asn,
        }
    }

    fn vrps() -> Vrps {
        Vrps::new(vec![
            roa("10.0.0.0/24", 24, 65001),
            roa("10.0.2.0/24", 25, 65003),
            roa("10.0.2.0/23", 23, 65010),
            roa("192.168.0.0/16", 24, 0),
            roa("2001:db8::/32", 48, 65020),
        ])
    }

    #[test_case("10.0.0.0/24", 65001, State::Valid; "exact match")]
    #[test_case("10.0.0.0/24", 65011, State::Invalid; "wrong origin")]
    #[test_case("10.0.0.0/25", 65001, State::Invalid; "longer than max length")]
    #[test_case("10.0.2.0/25", 65003, State::Valid; "within max length")]
    #[test_case("10.0.2.0/26", 65003, State::Invalid; "beyond max length")]
    #[test_case("10.0.3.0/24", 65010, State::Invalid; "covered by shorter roa beyond max length")]
    #[test_case("10.0.2.0/23", 65010, State::Valid; "shorter roa")]
    #[test_case("10.0.1.0/24", 65001, State::Unknown; "not covered")]
    #[test_case("10.0.0.0/16", 65001, State::Unknown; "less specific than roa")]
    #[test_case("192.168.1.0/24", 0, State::Invalid; "as0 never valid")]
    #[test_case("192.168.1.0/24", 65001, State::Invalid; "as0 covers")]
    #[test_case("2001:db8:1::/48", 65020, State::Valid; "ipv6")]
    #[test_case("2001:db8:1::/49", 65020, State::Invalid; "ipv6 beyond max length")]
    #[test_case("2001:db9::/32", 65020, State::Unknown; "ipv6 not covered")]
    fn test_validate(prefix: &str, asn: u32, expected: State) {
        let (_, state) = vrps().validate(&route(prefix, asn)).unwrap();
        assert_eq!(state, expected);
    }

    #[test]
    fn test_matched_roa() {
        let vrps = vrps();

        // On valid, the authorizing ROA
        let (matched, _) = vrps.validate(&route("10.0.2.0/23", 65010)).unwrap();
        assert_eq!(matched, Some(roa("10.0.2.0/23", 23, 65010)));

        // On invalid, the first covering ROA
        let (matched, _) = vrps.validate(&route("10.0.2.0/24", 65099)).unwrap();
        assert_eq!(matched, Some(roa("10.0.2.0/24", 25, 65003)));

        // On unknown, none
        let (matched, _) = vrps.validate(&route("172.16.0.0/12", 65001)).unwrap();
        assert_eq!(matched, None);
    }

    #[test]
    fn test_empty() {
        let (matched, state) = Vrps::default()
            .validate(&route("10.0.0.0/24", 65001))
            .unwrap();
        assert_eq!((matched, state), (None, State::Unknown));
    }

    #[test_case("10.0.0.0/24", 23; "shorter than prefix")]
    #[test_case("10.0.0.0/24", 33; "wider than ipv4")]
    #[test_case("2001:db8::/32", 129; "wider than ipv6")]
    fn test_invalid_max_length(prefix: &str, max_length: u8) {
        assert!(matches!(
            Roa::new(prefix.parse().unwrap(), max_length, 65001),
            Err(Error::InvalidMaxLength { .. })
        ));
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "metadata": {"generated": 1700000000},
            "roas": [
                {"prefix": "10.0.0.0/24", "maxLength": 24, "asn": "AS65001", "ta": "test"},
                {"prefix": "10.0.4.0/24", "maxLength": 26, "asn": 65005},
                {"prefix": "2001:db8::/32", "maxLength": 48, "asn": "as65020"}
            ]
        }"#;
        let vrps = Vrps::from_json(json).unwrap();
        assert_eq!(vrps.len(), 3);
        assert_eq!(vrps.roas()[0], roa("10.0.0.0/24", 24, 65001));
        assert_eq!(vrps.roas()[1], roa("10.0.4.0/24", 26, 65005));
        assert_eq!(vrps.roas()[2], roa("2001:db8::/32", 48, 65020));

        let (_, state) = vrps.validate(&route("10.0.4.0/26", 65005)).unwrap();
        assert_eq!(state, State::Valid);
    }

    #[test]
    fn test_from_json_rejects() {
        assert!(matches!(Vrps::from_json("{"), Err(Error::Json(_))));
        assert!(matches!(
            Vrps::from_json(r#"{"roas": [{"prefix": "10.0.0.0/33", "maxLength": 24, "asn": 1}]}"#),
            Err(Error::InvalidPrefix(_))
        ));
        assert!(matches!(
            Vrps::from_json(r#"{"roas": [{"prefix": "10.0.0.0/24", "maxLength": 16, "asn": 1}]}"#),
            Err(Error::InvalidMaxLength { .. })
        ));
        assert!(matches!(
            Vrps::from_json(r#"{"roas": [{"prefix": "10.0.0.0/24", "maxLength": 24, "asn": "ASX"}]}"#),
            Err(Error::InvalidAsn(s)) if s == "ASX"
        ));
        assert!(matches!(
            Vrps::from_json(r#"{"roas": [{"prefix": "10.0.0.0/24", "maxLength": 24, "asn": "AS4294967296"}]}"#),
            Err(Error::InvalidAsn(_))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            roa("10.0.2.0/24", 25, 65003).to_string(),
            "10.0.2.0/24-25 => AS65003"
        );
        assert_eq!(State::Valid.to_string(), "VALID");
    }
}
