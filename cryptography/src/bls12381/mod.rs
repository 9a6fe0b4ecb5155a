//! Multi-party signatures over the BLS12-381 curve.
//!
//! Public keys live in G1 (48 bytes compressed) and signatures live in G2 (96 bytes
//! compressed). Because BLS signatures over the same message are additive, a group of
//! parties can each sign a message point and an untrusted aggregator can sum their
//! partials into one signature that verifies against the sum of their public keys.
//!
//! # Features
//!
//! This crate has the following features:
//!
//! - `portable`: Enables `portable` feature on `blst` (<https://github.com/supranational/blst?tab=readme-ov-file#platform-and-language-compatibility>).
//!
//! # Benchmarks
//!
//! ```bash
//! cargo bench --bench bls12381
//! ```

pub mod multisig;
pub mod primitives;
