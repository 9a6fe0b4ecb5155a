use criterion::{criterion_group, Criterion};
use moas_cryptography::bls12381::multisig::{combine, dealer, map_to_message_point, partial_sign};
use rand::{rngs::StdRng, SeedableRng};
use std::hint::black_box;

fn benchmark_combine(c: &mut Criterion) {
    let hm = map_to_message_point(&[2u8; 32]);
    for n in [2, 10, 50, 100].into_iter() {
        let (setup, keys) = dealer(&mut StdRng::seed_from_u64(n as u64), n);
        let signers: Vec<u32> = (0..n).collect();
        let partials: Vec<_> = keys.iter().map(|k| partial_sign(&hm, k)).collect();
        c.bench_function(&format!("{}/n={}", module_path!(), n), |b| {
            b.iter(|| black_box(combine(&setup, &hm, &signers, &partials).unwrap()));
        });
    }
}

criterion_group!(benches, benchmark_combine);
