use criterion::criterion_main;

mod combine;
mod group_verify;
mod partial_sign;

criterion_main!(partial_sign::benches, combine::benches, group_verify::benches);
