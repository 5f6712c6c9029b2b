//! Benchmarks for the XML lexer and parser.
//!
//! Run with: cargo bench -p arbor-xml

use arbor_xml::{parse, tokenize};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

/// `count` sibling records, each with attributes, text and a reference.
fn catalog(count: usize) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<catalog>\n");
    for i in 0..count {
        out.push_str(&format!(
            "  <item id=\"{i}\" kind='book'><title>Title {i} &amp; more</title><!-- note --><price>{}.99</price></item>\n",
            i % 50
        ));
    }
    out.push_str("</catalog>\n");
    out
}

/// Same shape with every fourth closing tag dropped.
fn broken_catalog(count: usize) -> String {
    let mut out = String::from("<catalog>\n");
    for i in 0..count {
        out.push_str(&format!("  <item id=\"{i}\"><title>Title {i}"));
        if i % 4 != 0 {
            out.push_str("</title>");
        }
        out.push_str("</item>\n");
    }
    out.push_str("</catalog>\n");
    out
}

fn bench_tokenize(c: &mut Criterion) {
    let mut group = c.benchmark_group("xml/tokenize");
    for count in [10, 100, 1000] {
        let input = catalog(count);
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &input, |b, input| {
            b.iter(|| black_box(tokenize(input)))
        });
    }
    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("xml/parse");
    for count in [10, 100, 1000] {
        let input = catalog(count);
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::new("well_formed", count), &input, |b, input| {
            b.iter(|| black_box(parse(input)))
        });
        let broken = broken_catalog(count);
        group.throughput(Throughput::Bytes(broken.len() as u64));
        group.bench_with_input(BenchmarkId::new("recovering", count), &broken, |b, input| {
            b.iter(|| black_box(parse(input)))
        });
    }
    group.finish();
}

fn bench_deep_nesting(c: &mut Criterion) {
    let depth = 900;
    let input = format!("{}{}", "<n>".repeat(depth), "</n>".repeat(depth));
    c.bench_function("xml/parse_deep_900", |b| b.iter(|| black_box(parse(&input))));
}

criterion_group!(benches, bench_tokenize, bench_parse, bench_deep_nesting);

criterion_main!(benches);
