//! Benchmarks for option parsing and validation.
//!
//! Parsing is measured per mini-language; the end-to-end benchmark covers
//! request decoding, parsing, validation and compilation together.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use qopt_core::schema::{
    EntityDescription, ExpandDefinition, PropertyDefinition, StaticSchemaProvider,
};
use qopt_core::{CatalogRegistry, EntityType};
use qopt_query::parser::{parse_expand, parse_filters, parse_order_by};
use qopt_query::{compile, QueryOptionsFactory, QueryParams, RecordingBackend};
use std::sync::Arc;

/// Builds `p0 eq 0 and p1 eq 1 and ...` with `count` comparisons.
fn chained_filter(count: usize) -> String {
    (0..count)
        .map(|i| format!("p{} eq {}", i, i))
        .collect::<Vec<_>>()
        .join(" and ")
}

fn factory() -> QueryOptionsFactory {
    let provider = StaticSchemaProvider::new()
        .register(
            "Post",
            EntityDescription::new()
                .property(PropertyDefinition::new("status").allowed_values(["active", "inactive"]))
                .property(PropertyDefinition::new("amount"))
                .property(PropertyDefinition::new("createdAt"))
                .expand(ExpandDefinition::new("comments", EntityType::new("Comment"))),
        )
        .register(
            "Comment",
            EntityDescription::new().property(PropertyDefinition::new("approved")),
        );
    QueryOptionsFactory::new(Arc::new(CatalogRegistry::new(Arc::new(provider))))
}

fn bench_parse_filters(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_filters");
    for count in [1, 8, 64] {
        let input = chained_filter(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &input, |b, input| {
            b.iter(|| parse_filters(black_box(input)).unwrap())
        });
    }
    group.bench_function("mixed_literals", |b| {
        let input = "status in ['active', 'inactive'] and (amount bw [10, 20.5] or flag eq null) \
                     and name eq 'O\\'Brien'";
        b.iter(|| parse_filters(black_box(input)).unwrap())
    });
    group.finish();
}

fn bench_parse_expand(c: &mut Criterion) {
    let input = "comments(filters=approved eq true;orderBy=createdAt desc;top=5;\
                 expand=author(select=id,name)),tags,author";
    c.bench_function("parse_expand", |b| {
        b.iter(|| parse_expand(black_box(input)).unwrap())
    });
    c.bench_function("parse_order_by", |b| {
        b.iter(|| parse_order_by(black_box("name desc, createdAt, id asc")).unwrap())
    });
}

fn bench_canonical_key(c: &mut Criterion) {
    let tree = parse_filters(&chained_filter(64)).unwrap();
    c.bench_function("canonical_key_64", |b| b.iter(|| black_box(&tree).canonical_key()));
}

fn bench_end_to_end(c: &mut Criterion) {
    let factory = factory();
    let entity = EntityType::new("Post");
    let params = QueryParams::from_query_str(
        "filters=status eq 'active' and amount gt 100&orderBy=createdAt desc&top=20\
         &expand=comments(filters=approved eq true;top=5)",
    )
    .unwrap();
    // Warm the catalog and default caches.
    factory.from_params(&entity, &params).unwrap();

    c.bench_function("from_params_and_compile", |b| {
        b.iter(|| {
            let options = factory.from_params(&entity, black_box(&params)).unwrap();
            let mut backend = RecordingBackend::new();
            compile(&options, &mut backend);
            backend
        })
    });
}

criterion_group!(
    benches,
    bench_parse_filters,
    bench_parse_expand,
    bench_canonical_key,
    bench_end_to_end,
);

criterion_main!(benches);
