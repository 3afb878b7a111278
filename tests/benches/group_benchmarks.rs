//! # Groupie Benchmarks
//!
//! | Component | Operation |
//! |-----------|-----------|
//! | gp-01 Group Repository | create, join, coordinate update under a large group |
//! | gp-02 Capability Tokens | sign, verify |
//! | gp-03 API Gateway | inbound frame parsing |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gp_01_group_repository::{GroupRepository, GroupRepositoryApi, InMemoryGroupStore};
use gp_02_capability_tokens::{TokenManager, TokenService};
use gp_03_api_gateway::ws::parse_action;
use shared_types::{CoordsBit, MemberDraft};
use std::sync::Arc;
use std::time::Duration;

fn draft(device: &str) -> MemberDraft {
    MemberDraft::new("bench", device, CoordsBit::now(52.52, 13.40))
}

fn repository() -> GroupRepository<InMemoryGroupStore> {
    GroupRepository::new(Arc::new(InMemoryGroupStore::new()))
}

// ============================================================================
// GP-01: Group Repository
// ============================================================================

fn bench_repository(c: &mut Criterion) {
    let mut group = c.benchmark_group("gp-01-group-repository");
    group.measurement_time(Duration::from_secs(5));

    let repo = repository();
    group.bench_function("create_group", |b| {
        b.iter(|| black_box(repo.create_group(draft("founder")).is_ok()))
    });

    for size in [10usize, 100, 1_000] {
        let repo = repository();
        let created = repo.create_group(draft("founder")).expect("create group");
        for i in 0..size {
            let _ = repo.add_member_to_group(&created.id, draft(&format!("device-{}", i)));
        }

        let founder = &created.members[0];
        let pile = founder.security_pile();

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::new("update_coords_bit", size),
            &(founder.id.clone(), pile),
            |b, (member_id, pile)| {
                b.iter(|| {
                    black_box(
                        repo.update_member_coords_bit(member_id, CoordsBit::now(1.0, 2.0), pile)
                            .is_ok(),
                    )
                })
            },
        );

        group.bench_with_input(
            BenchmarkId::new("rejoin", size),
            &created.id,
            |b, group_id| {
                b.iter(|| black_box(repo.add_member_to_group(group_id, draft("device-0")).is_ok()))
            },
        );
    }

    group.finish();
}

// ============================================================================
// GP-02: Capability Tokens
// ============================================================================

fn bench_tokens(c: &mut Criterion) {
    let mut group = c.benchmark_group("gp-02-capability-tokens");

    let tokens = TokenManager::random();
    let token = tokens
        .create_token("secret-value", "device-id")
        .expect("sign token");

    group.bench_function("create_token", |b| {
        b.iter(|| black_box(tokens.create_token("secret-value", "device-id").is_ok()))
    });
    group.bench_function("verify", |b| {
        b.iter(|| black_box(tokens.verify(&token).is_ok()))
    });

    group.finish();
}

// ============================================================================
// GP-03: Frame parsing
// ============================================================================

fn bench_frames(c: &mut Criterion) {
    let mut group = c.benchmark_group("gp-03-frames");

    let frames = [
        ("get", r#"{"action":"get"}"#),
        (
            "send_coordinates",
            r#"{"action":"send_coordinates","payload":{"memberId":"m1","lat":52.52,"lng":13.40}}"#,
        ),
        ("malformed", "not json at all"),
    ];

    for (name, text) in frames {
        group.bench_with_input(BenchmarkId::new("parse_action", name), text, |b, text| {
            b.iter(|| black_box(parse_action(text).is_ok()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_repository, bench_tokens, bench_frames);
criterion_main!(benches);
