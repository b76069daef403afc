//! Report Rendering Benchmarks
//!
//! Measures the in-process parts of a run on a synthetic schema:
//! - DOT source generation for the ER diagram
//! - Data-dictionary sheet layout

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use autodoc::dictionary::DictionarySheet;
use autodoc::{diagram, ColumnInfo, ForeignKeyInfo, SchemaInfo, TableInfo};

/// `tables` tables of 12 columns, each referencing the previous table
fn synthetic_schema(tables: usize) -> SchemaInfo {
    let tables = (0..tables)
        .map(|t| {
            let mut columns = vec![ColumnInfo {
                name: "id".to_string(),
                data_type: "integer".to_string(),
                primary_key: true,
                autoincrement: true,
                ..Default::default()
            }];
            columns.extend((1..12).map(|c| ColumnInfo {
                name: format!("field_{c}"),
                data_type: "character varying".to_string(),
                length: Some(255),
                nullable: c % 2 == 0,
                ..Default::default()
            }));

            let foreign_keys = if t == 0 {
                Vec::new()
            } else {
                vec![ForeignKeyInfo {
                    name: format!("table_{t:03}_field_1_fkey"),
                    columns: vec!["field_1".to_string()],
                    referenced_table: format!("table_{:03}", t - 1),
                    referenced_columns: vec!["id".to_string()],
                }]
            };

            TableInfo {
                name: format!("table_{t:03}"),
                columns,
                primary_key: vec!["id".to_string()],
                foreign_keys,
                ..Default::default()
            }
        })
        .collect();

    SchemaInfo::new(tables)
}

fn bench_to_dot(c: &mut Criterion) {
    let mut group = c.benchmark_group("to_dot");
    for size in [10, 100, 500] {
        let schema = synthetic_schema(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &schema, |b, schema| {
            b.iter(|| diagram::to_dot(black_box(schema)));
        });
    }
    group.finish();
}

fn bench_dictionary_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("dictionary_layout");
    for size in [10, 100, 500] {
        let schema = synthetic_schema(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &schema, |b, schema| {
            b.iter(|| DictionarySheet::build(black_box(schema)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_to_dot, bench_dictionary_layout);
criterion_main!(benches);
