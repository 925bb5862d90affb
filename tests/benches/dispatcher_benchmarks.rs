//! # Dispatcher Benchmarks
//!
//! Hot path of every inbound message: rate limiter admission and envelope
//! validation (decode plus signature check).
//!
//! Run with: `cargo bench -p dn-tests`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dn_01_capability_dispatcher::{
    validate_message, Ed25519Signer, MessageSigner, RateLimiter, RateLimiterConfig,
};
use shared_crypto::Ed25519KeyPair;
use shared_types::{Message, MessageBody, PeerId};

fn signed_message(signer: &Ed25519Signer, receiver: PeerId, payload_len: usize) -> Vec<u8> {
    let mut body = MessageBody::new("ccip@1.0.0", 1);
    body.version = 1;
    body.sender = signer.peer_id().to_vec();
    body.receiver = receiver.to_vec();
    body.payload = vec![0xAB; payload_len];

    let raw_body = body.encode().unwrap();
    Message {
        signature: signer.sign(&raw_body).unwrap(),
        body: raw_body,
    }
    .encode()
    .unwrap()
}

fn bench_validation(c: &mut Criterion) {
    let signer = Ed25519Signer::new(Ed25519KeyPair::from_seed([1; 32]));
    let sender = signer.peer_id();
    let own_id = PeerId([2; 32]);

    let mut group = c.benchmark_group("validate_message");
    for payload_len in [64usize, 1024, 16 * 1024] {
        let raw = signed_message(&signer, own_id, payload_len);
        group.throughput(Throughput::Bytes(raw.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(payload_len), &raw, |b, raw| {
            b.iter(|| validate_message(black_box(raw), &sender, &own_id).unwrap())
        });
    }
    group.finish();
}

fn bench_rate_limiter(c: &mut Criterion) {
    let limiter = RateLimiter::new(&RateLimiterConfig {
        global_rps: 1e9,
        global_burst: u32::MAX,
        per_sender_rps: 1e9,
        per_sender_burst: u32::MAX,
    })
    .unwrap();
    let senders: Vec<PeerId> = (0..=255u8).map(|i| PeerId([i; 32])).collect();

    c.bench_function("rate_limiter_allow_256_senders", |b| {
        let mut i = 0usize;
        b.iter(|| {
            i = (i + 1) % senders.len();
            black_box(limiter.allow(&senders[i]))
        })
    });
}

criterion_group!(benches, bench_validation, bench_rate_limiter);
criterion_main!(benches);
