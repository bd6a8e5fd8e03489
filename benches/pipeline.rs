use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tabular_transform::execution::{EngineOptions, PipelineEngine, TransformRequest};
use tabular_transform::processing::{
    transform, AggregateFunction, Aggregation, Filter, FilterOperator, FilterValue, OrderSpec, PipelineConfig,
};
use tabular_transform::types::{Row, Value};

const REGIONS: [&str; 8] = ["north", "south", "east", "west", "central", "coast", "hills", "plains"];

fn build_rows(n: usize) -> Vec<Row> {
    (0..n)
        .map(|i| {
            // Every 50th amount is unparseable text so coercion is exercised.
            let amount = if i % 50 == 0 {
                Value::from("n/a")
            } else {
                Value::Float64((i % 1_000) as f64 * 0.75)
            };
            Row::from([
                ("region", Value::from(REGIONS[i % REGIONS.len()])),
                ("store", Value::Int64((i % 97) as i64)),
                ("amount", amount),
                ("units", Value::from(((i % 13) as i64).to_string())),
            ])
        })
        .collect()
}

fn chart_config() -> PipelineConfig {
    PipelineConfig {
        filters: vec![
            Filter::new("units", FilterOperator::GreaterThan, FilterValue::scalar(2_i64)),
            Filter::new("region", FilterOperator::NotIn, FilterValue::list(["coast", "hills"])),
        ],
        group_by: vec!["region".to_string(), "store".to_string()],
        aggregations: vec![
            Aggregation::new("amount", AggregateFunction::Sum),
            Aggregation::new("amount", AggregateFunction::Median),
            Aggregation::new("units", AggregateFunction::StdDev),
        ],
        order_by: vec![OrderSpec::desc("amount_sum"), OrderSpec::asc("region")],
    }
}

fn bench_transform(c: &mut Criterion) {
    let config = chart_config();
    let mut group = c.benchmark_group("transform");
    for &n in &[10_000usize, 100_000] {
        let rows = build_rows(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &rows, |b, rows| {
            b.iter(|| black_box(transform(black_box(rows), &config)))
        });
    }
    group.finish();
}

fn bench_sort_only(c: &mut Criterion) {
    let rows = build_rows(100_000);
    let config = PipelineConfig {
        order_by: vec![OrderSpec::asc("region"), OrderSpec::desc("amount")],
        ..Default::default()
    };
    c.bench_function("sort_100k", |b| {
        b.iter(|| black_box(transform(black_box(&rows), &config)))
    });
}

fn bench_engine_batch(c: &mut Criterion) {
    let engine = PipelineEngine::new(EngineOptions::default()).unwrap();
    let requests: Vec<TransformRequest> = (0..16)
        .map(|_| TransformRequest::new(build_rows(10_000), chart_config()))
        .collect();
    c.bench_function("engine_batch_16x10k", |b| {
        b.iter(|| black_box(engine.run_batch(black_box(&requests))))
    });
}

criterion_group!(benches, bench_transform, bench_sort_only, bench_engine_batch);
criterion_main!(benches);
