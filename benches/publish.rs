//! Performance benchmarks for a3s-nakadi
//!
//! Run with: cargo bench

use a3s_nakadi::mapping::to_wire;
use a3s_nakadi::{EventBatch, EventRecord, EventType, MemoryResource, NakadiClient};
use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;

fn bench_mapping(c: &mut Criterion) {
    let undefined = EventRecord::new("orders", serde_json::json!({"rate": 7.35}));
    let business = EventRecord::new(
        EventType::business("orders"),
        serde_json::json!({"rate": 7.35, "currency": "USD/CNY"}),
    );

    c.bench_function("to_wire (undefined)", |b| {
        b.iter(|| to_wire(&undefined));
    });

    c.bench_function("to_wire (business)", |b| {
        b.iter(|| to_wire(&business));
    });
}

fn client() -> NakadiClient {
    NakadiClient::builder()
        .base_url("http://localhost:8080")
        .resource(Arc::new(MemoryResource::default()))
        .build()
        .unwrap()
}

fn bench_memory_publish(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let publisher = client().events();

    c.bench_function("publish raw", |b| {
        b.to_async(&rt)
            .iter(|| async { publisher.publish("orders", r#"{"rate":7.35}"#).await.unwrap() });
    });

    c.bench_function("publish structured", |b| {
        b.to_async(&rt).iter(|| async {
            publisher
                .publish(EventType::business("orders"), serde_json::json!({"rate": 7.35}))
                .await
                .unwrap()
        });
    });
}

fn bench_batch_throughput(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let mut group = c.benchmark_group("batch_throughput");
    for count in [10, 100, 1000] {
        let raw: Vec<String> = (0..count).map(|i| format!(r#"{{"i":{}}}"#, i)).collect();
        let structured: Vec<serde_json::Value> =
            (0..count).map(|i| serde_json::json!({"i": i})).collect();

        group.bench_function(format!("{} raw events", count), |b| {
            b.to_async(&rt).iter(|| async {
                let publisher = client().events();
                publisher
                    .publish_all("orders", EventBatch::Raw(raw.clone()))
                    .await
                    .unwrap()
            });
        });

        group.bench_function(format!("{} business events", count), |b| {
            b.to_async(&rt).iter(|| async {
                let publisher = client().events();
                publisher
                    .publish_all(EventType::business("orders"), structured.clone())
                    .await
                    .unwrap()
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_mapping,
    bench_memory_publish,
    bench_batch_throughput,
);
criterion_main!(benches);
