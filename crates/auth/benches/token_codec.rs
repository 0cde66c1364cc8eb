use criterion::{black_box, criterion_group, criterion_main, Criterion};

use storefront_auth::{Identity, Role, SigningAlgorithm, TOKEN_TTL, TokenCodec};
use storefront_core::UserId;

fn bench_token_codec(c: &mut Criterion) {
    let codec = TokenCodec::new(b"bench-secret", SigningAlgorithm::Hs256);
    let identity = Identity::new(UserId::new(42), Role::User).unwrap();

    c.bench_function("token_issue", |b| {
        b.iter(|| codec.issue(black_box(identity), TOKEN_TTL))
    });

    let issued = codec.issue(identity, TOKEN_TTL).unwrap();
    c.bench_function("token_validate", |b| {
        b.iter(|| codec.validate(black_box(&issued.token)))
    });

    // The per-request cost of the identity resolver on an authenticated call.
    c.bench_function("token_validate_and_reissue", |b| {
        b.iter(|| {
            codec
                .validate(black_box(&issued.token))
                .and_then(|validated| codec.reissue(&validated.claim))
        })
    });
}

criterion_group!(benches, bench_token_codec);
criterion_main!(benches);
