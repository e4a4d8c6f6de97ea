use criterion::{Criterion, criterion_group, criterion_main};
use fieldpath::{FieldPathParser, SchemaCache, introspect, testing};
use std::hint::black_box;

fn benchmark_introspect(c: &mut Criterion) {
    let registry = testing::registry();

    c.bench_function("introspect", |b| {
        b.iter(|| black_box(introspect(&registry, black_box(testing::MESSAGE))))
    });

    let cache = SchemaCache::new();
    c.bench_function("introspect_cached", |b| {
        b.iter(|| black_box(cache.get_or_introspect(&registry, black_box(testing::MESSAGE))))
    });
}

fn benchmark_select(c: &mut Criterion) {
    let registry = testing::registry();
    let mut parser = FieldPathParser::new(&registry, testing::MESSAGE).unwrap();
    let paths = [
        "str",
        "sub.name",
        "sub.i32",
        "map_str_msg.*.name",
        "rp_sub.*.map_i32_str.653",
        "point",
    ];

    c.bench_function("select_paths", |b| {
        b.iter(|| black_box(parser.parse_select(black_box(&paths[..]))))
    });

    c.bench_function("select_wildcard", |b| {
        b.iter(|| black_box(parser.parse_select(black_box(&["*"][..]))))
    });
}

fn benchmark_update(c: &mut Criterion) {
    let registry = testing::registry();
    let mut parser = FieldPathParser::new(&registry, testing::MESSAGE).unwrap();
    let message = testing::message();
    let paths = ["str", "point.x", "sub.map_i32_str.653", "rp_sub", "ts"];

    c.bench_function("update_paths", |b| {
        b.iter(|| black_box(parser.parse_update(&message, black_box(&paths[..]))))
    });

    c.bench_function("update_wildcard", |b| {
        b.iter(|| black_box(parser.parse_update(&message, black_box(&["*"][..]))))
    });
}

fn benchmark_order_by(c: &mut Criterion) {
    let registry = testing::registry();
    let mut parser = FieldPathParser::new(&registry, testing::MESSAGE).unwrap();

    c.bench_function("order_by", |b| {
        b.iter(|| black_box(parser.parse_order_by(black_box("i64 ASC, float DESC, sub.name"))))
    });
}

criterion_group!(
    benches,
    benchmark_introspect,
    benchmark_select,
    benchmark_update,
    benchmark_order_by
);
criterion_main!(benches);
