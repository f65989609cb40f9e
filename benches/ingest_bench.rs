//! Benchmarks for snapshot ingestion
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use std::sync::Arc;
use std::time::Instant;

use crowdpulse::config::ViewConfig;
use crowdpulse::dashboard::DashboardView;
use crowdpulse::feed::decode_message;
use crowdpulse::metrics::{EngagementMetrics, ZoneMetrics};
use tokio_tungstenite::tungstenite::Message;

fn create_payloads(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            EngagementMetrics::new(i as i64 * 1000, (i % 100) as f64, (i % 10) as f64, 50.0)
                .zone(ZoneMetrics::new("main-stage", 80.0, 1.2))
                .zone(ZoneMetrics::new("bar", 45.0, 0.4))
                .to_json()
                .unwrap()
        })
        .collect()
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for size in [100, 1000] {
        let payloads = create_payloads(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("decode_{}", size), |b| {
            b.iter(|| {
                for payload in &payloads {
                    black_box(decode_message(Message::Text(payload.clone())).unwrap());
                }
            })
        });
    }

    group.finish();
}

fn bench_apply_and_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("view");

    let snapshots: Vec<Arc<EngagementMetrics>> = create_payloads(1000)
        .iter()
        .map(|p| Arc::new(EngagementMetrics::from_json(p).unwrap()))
        .collect();
    group.throughput(Throughput::Elements(snapshots.len() as u64));

    group.bench_function("apply_render_1000", |b| {
        b.iter(|| {
            let mut view = DashboardView::new(ViewConfig::default());
            let now = Instant::now();
            for snapshot in &snapshots {
                view.apply(Arc::clone(snapshot), now);
                black_box(view.render(now).to_string());
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_decode, bench_apply_and_render);
criterion_main!(benches);
