//! MarkupKit benchmarks
//!
//! Run with: cargo bench -p markupkit-bench

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use markupkit_bench::{generate_page, generate_slots, generate_template, generate_tree};
use markupkit_dom::AsCodeOptions;
use markupkit_template::{substitute, TemplateCompiler};

fn parsing_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("parsing");

    for (label, sections) in [("small", 1), ("medium", 100), ("large", 1000)] {
        let page = generate_page(sections);
        group.throughput(Throughput::Bytes(page.len() as u64));
        group.bench_with_input(BenchmarkId::new("records", label), &page, |b, html| {
            b.iter(|| markupkit_html::parse(html))
        });
        group.bench_with_input(BenchmarkId::new("document", label), &page, |b, html| {
            let compiler = TemplateCompiler::new();
            b.iter(|| compiler.from_html_text(html, true))
        });
    }

    group.finish();
}

fn serialize_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize");

    for (label, width, depth) in [("wide", 50, 2), ("deep", 2, 9)] {
        let Ok(tree) = generate_tree(width, depth) else {
            continue;
        };
        group.bench_function(BenchmarkId::new("compact", label), |b| {
            b.iter(|| tree.to_html(false, 0))
        });
        group.bench_function(BenchmarkId::new("pretty", label), |b| {
            b.iter(|| tree.to_html(true, 0))
        });
        group.bench_function(BenchmarkId::new("xml", label), |b| b.iter(|| tree.to_xml(true)));
        group.bench_function(BenchmarkId::new("as_code", label), |b| {
            let options = AsCodeOptions::default();
            b.iter(|| tree.as_code(&options))
        });
    }

    group.finish();
}

fn template_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("template");

    for rows in [10, 500] {
        let template = generate_template(rows);
        let slots = generate_slots(rows);
        group.throughput(Throughput::Bytes(template.len() as u64));
        group.bench_with_input(BenchmarkId::new("substitute", rows), &template, |b, text| {
            b.iter(|| substitute(text, &slots))
        });
        group.bench_with_input(BenchmarkId::new("compile", rows), &template, |b, text| {
            let compiler = TemplateCompiler::new();
            b.iter(|| compiler.compile_str(text, &slots, false))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    parsing_benchmarks,
    serialize_benchmarks,
    template_benchmarks,
);

criterion_main!(benches);
