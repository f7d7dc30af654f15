use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use pricehub_codec::{build_archive, export_archive, PriceArchive, RecordParser, EXPORT_ENTRY_NAME};
use pricehub_core::{ImportStats, Price, PriceRecord};

fn import_csv(rows: usize) -> String {
    let mut out = String::from("id,name,category,price,create_date\n");
    for i in 0..rows {
        out.push_str(&format!(
            "{i},product {i},category {},{}.{:02},2024-01-{:02}\n",
            i % 17,
            i % 1000,
            i % 100,
            i % 28 + 1
        ));
    }
    out
}

fn records(rows: usize) -> Vec<PriceRecord> {
    (0..rows)
        .map(|i| {
            PriceRecord::new(
                i.to_string(),
                format!("product {i}"),
                format!("category {}", i % 17),
                Price::parse(&format!("{}.{:02}", i % 1000, i % 100)).unwrap(),
                "2024-01-01",
            )
        })
        .collect()
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_csv");
    for rows in [100usize, 10_000] {
        let input = import_csv(rows);
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &input, |b, input| {
            b.iter(|| {
                let batch = RecordParser::new(black_box(input.as_bytes())).parse_all().unwrap();
                black_box(ImportStats::from_records(&batch.records))
            });
        });
    }
    group.finish();
}

fn bench_archive_import(c: &mut Criterion) {
    let mut group = c.benchmark_group("archive_import");
    for rows in [100usize, 10_000] {
        let zipped = build_archive("data.csv", import_csv(rows).as_bytes()).unwrap();
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &zipped, |b, zipped| {
            b.iter(|| {
                let mut archive = PriceArchive::open(black_box(zipped)).unwrap();
                let entry = archive.data_entry(u64::MAX).unwrap().unwrap();
                black_box(RecordParser::new(entry).parse_all().unwrap())
            });
        });
    }
    group.finish();
}

fn bench_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("export_archive");
    for rows in [100usize, 10_000] {
        let recs = records(rows);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &recs, |b, recs| {
            b.iter(|| black_box(export_archive(recs).unwrap()));
        });
    }
    group.finish();

    c.bench_function("build_archive_empty", |b| {
        b.iter(|| black_box(build_archive(EXPORT_ENTRY_NAME, b"").unwrap()))
    });
}

criterion_group!(benches, bench_parse, bench_archive_import, bench_export);
criterion_main!(benches);
