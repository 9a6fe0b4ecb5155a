//! Classify route announcements against RPKI origin authorization data.
//!
//! A [Route] (prefix and origin AS) is checked against a set of [Roa]s following
//! RFC 6811: it is [State::Valid] if some covering ROA authorizes its origin at its
//! prefix length, [State::Invalid] if covering ROAs exist but none does, and
//! [State::Unknown] if no ROA covers it.
//!
//! # Example
//!
//! ```rust
//! use moas_rpki::{OriginValidator, Roa, Route, State, Vrps};
//!
//! let vrps = Vrps::new(vec![Roa::new("10.0.0.0/24".parse().unwrap(), 24, 65001).unwrap()]);
//! let route = Route { prefix: "10.0.0.0/24".parse().unwrap(), asn: 65001 };
//! let (matched, state) = vrps.validate(&route).unwrap();
//! assert_eq!(state, State::Valid);
//! assert_eq!(matched.unwrap().asn(), 65001);
//! ```

mod prefix;
pub use prefix::Prefix;
mod roa;
pub use roa::{OriginValidator, Roa, Route, State, Vrps};

use thiserror::Error;

/// Errors that can occur when loading origin authorization data or validating routes.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid prefix: {0}")]
    InvalidPrefix(String),
    #[error("invalid max length {max_length} for {prefix}")]
    InvalidMaxLength { prefix: Prefix, max_length: u8 },
    #[error("invalid asn: {0}")]
    InvalidAsn(String),
    #[error("malformed vrp export: {0}")]
    Json(#[from] serde_json::Error),
    #[error("origin validator unavailable: {0}")]
    Unavailable(String),
}
