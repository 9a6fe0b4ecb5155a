use criterion::{criterion_group, Criterion};
use moas_cryptography::bls12381::multisig::{
    combine, dealer, group_verify, map_to_message_point, partial_sign,
};
use rand::{rngs::StdRng, SeedableRng};
use std::hint::black_box;

fn benchmark_group_verify(c: &mut Criterion) {
    let hm = map_to_message_point(&[3u8; 32]);
    for n in [2, 10, 50, 100].into_iter() {
        let (setup, keys) = dealer(&mut StdRng::seed_from_u64(n as u64), n);
        let signers: Vec<u32> = (0..n).collect();
        let partials: Vec<_> = keys.iter().map(|k| partial_sign(&hm, k)).collect();
        let aggregate = combine(&setup, &hm, &signers, &partials).unwrap();
        c.bench_function(&format!("{}/n={}", module_path!(), n), |b| {
            b.iter(|| assert!(black_box(group_verify(&setup, &hm, &aggregate))));
        });
    }
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = benchmark_group_verify
}
