use arkorm::{Conjunction, Op, Query, Value};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

/// SELECT with `n` fields and `n` predicates, every third one starting a group:
/// SELECT col0, col1, ... FROM t WHERE col0 = ? AND (col1 = ? OR ...) ...
fn build_select(n: usize) -> Query {
    let mut q = Query::new();
    q.find()
        .fields((0..n).map(|i| format!("col{i}")))
        .from("t");
    for i in 0..n {
        if i % 3 == 1 {
            q.group(Conjunction::Or);
        }
        q.where_with(format!("col{i}"), i as i64, Op::Eq, Conjunction::And);
    }
    q.sort("col0", true).limit(50);
    q
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_compiler/compile");

    for n in [1, 5, 10, 50, 100] {
        let q = build_select(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &q, |b, q| {
            b.iter(|| black_box(q.compile()));
        });
    }

    group.finish();
}

fn bench_build_and_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_compiler/build_and_compile");

    for n in [1, 5, 10, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let q = build_select(n);
                black_box(q.compile())
            });
        });
    }

    group.finish();
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_compiler/insert");

    for n in [5, 20, 100] {
        let payload: Vec<(String, Value)> = (0..n)
            .map(|i| (format!("col{i}"), Value::from(format!("value {i}"))))
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &payload, |b, payload| {
            let mut q = Query::new();
            b.iter(|| {
                q.insert_into("t", payload.iter().cloned());
                black_box(q.compile())
            });
        });
    }

    group.finish();
}

fn bench_literal_sql(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_compiler/to_literal_sql");

    for n in [5, 20, 100] {
        let stmt = match build_select(n).compile() {
            Ok(stmt) => stmt,
            Err(e) => panic!("benchmark query failed to compile: {e}"),
        };
        group.bench_with_input(BenchmarkId::from_parameter(n), &stmt, |b, stmt| {
            b.iter(|| black_box(stmt.to_literal_sql()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_compile,
    bench_build_and_compile,
    bench_insert,
    bench_literal_sql
);
criterion_main!(benches);
