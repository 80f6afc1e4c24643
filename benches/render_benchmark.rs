//! Cost of building and rendering queries, with no engine involved.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sql_record::query_builder::render_insert;
use sql_record::{FetchMode, FieldMap, QueryState, RowValues};

fn predicate_count() -> usize {
    std::env::var("BENCH_PREDICATES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8)
}

fn build_state(predicates: usize, rng: &mut ChaCha8Rng) -> QueryState {
    let mut state = QueryState::new("events");
    for i in 0..predicates {
        let column = format!("col_{i}");
        state = match i % 4 {
            0 => state.where_(&column, ">=", rng.gen_range(0_i64..1000)),
            1 => state.where_(&column, "LIKE", format!("prefix-{}%", rng.gen_range(0..100))),
            2 => state.where_(&column, "IN", vec![1_i64, 2, 3, rng.gen_range(4_i64..100)]),
            _ => state.where_(&column, "IS NOT NULL", ()),
        }
        .expect("valid predicate");
    }
    state
        .order_by("col_0", "DESC")
        .and_then(|s| s.order_by("col_1", "ASC"))
        .expect("valid order")
}

fn render_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_select");
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    for predicates in [1, predicate_count()] {
        let state = build_state(predicates, &mut rng);
        group.bench_with_input(BenchmarkId::new("render", predicates), &state, |b, state| {
            b.iter(|| black_box(state.render().expect("render")));
        });
        group.bench_with_input(
            BenchmarkId::new("render_fetch_last", predicates),
            &state,
            |b, state| {
                b.iter(|| black_box(state.render_fetch("id", FetchMode::Last).expect("render")));
            },
        );
        group.bench_with_input(BenchmarkId::new("build", predicates), &predicates, |b, &n| {
            let mut rng = ChaCha8Rng::seed_from_u64(7);
            b.iter(|| black_box(build_state(n, &mut rng)));
        });
    }
    group.finish();
}

fn render_insert_statement(c: &mut Criterion) {
    let fields: FieldMap = (0..16)
        .map(|i| (format!("field_{i}"), RowValues::Int(i)))
        .collect();
    c.bench_function("render_insert_16_columns", |b| {
        b.iter(|| black_box(render_insert("events", &fields).expect("render")));
    });
}

criterion_group!(benches, render_select, render_insert_statement);
criterion_main!(benches);
