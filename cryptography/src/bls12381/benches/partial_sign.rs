use criterion::{criterion_group, Criterion};
use moas_cryptography::bls12381::multisig::{dealer, map_to_message_point, partial_sign};
use rand::{rngs::StdRng, SeedableRng};
use std::hint::black_box;

fn benchmark_partial_sign(c: &mut Criterion) {
    let (_, keys) = dealer(&mut StdRng::seed_from_u64(0), 1);
    let hm = map_to_message_point(&[1u8; 32]);
    c.bench_function(module_path!(), |b| {
        b.iter(|| black_box(partial_sign(&hm, &keys[0])));
    });
}

criterion_group!(benches, benchmark_partial_sign);
