//! Run one MOAS attestation round.
//!
//! Every origin generates its key locally and registers it (with a proof of possession) in a
//! shared directory. The origins that sign then attest to the claim, and the resulting
//! attestation is verified and cross-checked against a VRP export.
//!
//! # Usage
//!
//! ```sh
//! cargo run --release --bin moas-smg -- --prefix 10.0.0.0/24 --origins 65001,65011 --vrps vrps.json
//! ```
//!
//! where `vrps.json` holds:
//!
//! ```json
//! {"roas": [{"prefix": "10.0.0.0/24", "maxLength": 24, "asn": "AS65001"}]}
//! ```
//!
//! The process exits with status 0 only if the claim is trusted.

use clap::{value_parser, Arg, ArgAction, Command};
use moas_cryptography::bls12381::multisig::PartyKey;
use moas_rpki::Vrps;
use moas_smg::{Claim, Config, Directory, Error, Orchestrator, Registration};
use rand::{rngs::StdRng, SeedableRng};
use std::{collections::BTreeMap, process};
use tracing::{error, info, Level};

fn main() {
    // Parse arguments
    let matches = Command::new("moas-smg")
        .about("attest to a multi-origin announcement and verify it against RPKI")
        .arg(
            Arg::new("prefix")
                .long("prefix")
                .required_unless_present("claim")
                .help("Announced prefix (CIDR)"),
        )
        .arg(
            Arg::new("origins")
                .long("origins")
                .required_unless_present("claim")
                .value_delimiter(',')
                .value_parser(value_parser!(u64))
                .help("Origin AS numbers, first is checked against RPKI"),
        )
        .arg(
            Arg::new("family")
                .long("family")
                .default_value("0001")
                .help("Address family code (0001 for IPv4, 0002 for IPv6)"),
        )
        .arg(
            Arg::new("claim")
                .long("claim")
                .conflicts_with_all(["prefix", "origins"])
                .help("Hex-encoded canonical claim (instead of --prefix and --origins)"),
        )
        .arg(
            Arg::new("vrps")
                .long("vrps")
                .required(true)
                .help("Path to a VRP export (JSON)"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_parser(value_parser!(u64))
                .help("Seed for deterministic key generation (insecure)"),
        )
        .arg(
            Arg::new("signers")
                .long("signers")
                .value_delimiter(',')
                .value_parser(value_parser!(u32))
                .help("Origins that sign (default: all). Every origin must sign, so a strict subset fails the round"),
        )
        .arg(
            Arg::new("verify-partials")
                .long("verify-partials")
                .action(ArgAction::SetTrue)
                .help("Check each partial signature before combining"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    // Create logger
    let level = if matches.get_flag("verbose") {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    // Build claim
    let claim = match matches.get_one::<String>("claim") {
        Some(encoded) => match Claim::decode_hex(encoded) {
            Ok(claim) => claim,
            Err(err) => fail(Error::Decode(err)),
        },
        None => {
            let prefix = matches
                .get_one::<String>("prefix")
                .expect("Please provide prefix");
            let origins: Vec<u64> = matches
                .get_many::<u64>("origins")
                .expect("Please provide origins")
                .copied()
                .collect();
            let family = matches
                .get_one::<String>("family")
                .expect("Please provide family");
            Claim::new(0, origins, family.as_str(), prefix.as_str())
        }
    };
    info!(%claim, "built claim");

    // Load VRPs
    let path = matches
        .get_one::<String>("vrps")
        .expect("Please provide VRP export");
    let json = std::fs::read_to_string(path).unwrap_or_else(|err| {
        error!(path = %path, ?err, "failed to read VRP export");
        process::exit(2);
    });
    let vrps = Vrps::from_json(&json).unwrap_or_else(|err| fail(err.into()));
    info!(path = %path, count = vrps.len(), "loaded VRPs");

    // Generate keys locally and register them
    let mut rng = match matches.get_one::<u64>("seed") {
        Some(seed) => StdRng::seed_from_u64(*seed),
        None => StdRng::from_entropy(),
    };
    let mut asns: Vec<u32> = Vec::new();
    for &asn in claim.origin_asns() {
        // Registration only covers representable origins, validation rejects the rest
        if let Ok(asn) = u32::try_from(asn) {
            if !asns.contains(&asn) {
                asns.push(asn);
            }
        }
    }
    let mut keys = BTreeMap::new();
    let mut registrations = Vec::with_capacity(asns.len());
    for (index, asn) in asns.iter().enumerate() {
        let key = PartyKey::generate(&mut rng, index as u32);
        registrations.push(Registration::new(*asn, &key));
        keys.insert(*asn, key);
    }
    let directory = Directory::new(registrations).unwrap_or_else(|err| fail(err));
    info!(parties = directory.len(), "registered origins");

    // Restrict signers
    if let Some(signers) = matches.get_many::<u32>("signers") {
        let signers: Vec<u32> = signers.copied().collect();
        keys.retain(|asn, _| signers.contains(asn));
        info!(?signers, "restricted signers");
    }

    // Run round
    let cfg = Config {
        verify_partials: matches.get_flag("verify-partials"),
    };
    let orchestrator = Orchestrator::new(cfg, directory, vrps);
    let verdict = orchestrator
        .run(&claim, &keys)
        .unwrap_or_else(|err| fail(err));
    info!(
        digest = %verdict.digest,
        signature_valid = verdict.signature_valid,
        state = %verdict.state,
        roa = ?verdict.roa.map(|roa| roa.to_string()),
        trusted = verdict.trusted(),
        "round complete"
    );
    if !verdict.trusted() {
        process::exit(1);
    }
}

fn fail(err: Error) -> ! {
    error!(%err, "round failed");
    process::exit(1);
}
