use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use service::identity::{IdentityOptions, IdentityState};
use service::policy::SchemePolicy;
use service::storage::{Items, MemoryBackend};
use service::tabs::StaticTabs;

fn seeded_backend() -> Arc<MemoryBackend> {
    let mut items = Items::new();
    for i in 0..2_000 {
        items.insert(format!("unrelated-{i}"), serde_json::json!({ "n": i }));
    }
    Arc::new(MemoryBackend::with_items(items))
}

fn bench_lookup(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    for (name, secondary_index) in [("lookup_identifier_scan", false), ("lookup_identifier_indexed", true)] {
        let svc = IdentityState::new(
            seeded_backend(),
            Arc::new(StaticTabs::new()),
            SchemePolicy::default(),
            IdentityOptions { secondary_index, ..Default::default() },
        );
        // pre-create containers outside of the measured loop
        let mut last = String::new();
        for i in 0..200 {
            last = rt.block_on(svc.add_new_uuid(&format!("firefox-container-{i}"))).unwrap();
        }

        c.bench_function(name, |b| {
            b.iter(|| {
                let found = rt.block_on(svc.lookup_identifier_by_uuid(&last)).unwrap();
                assert!(found.is_some());
            });
        });
    }
}

criterion_group!(benches, bench_lookup);
criterion_main!(benches);
