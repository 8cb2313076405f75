//! Extraction and baseline benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ebook_corpus::corpus::{count_char, run_baseline, Concordance, Page, SearchConfig};
use ebook_corpus::extraction::{tokenize, TextExtractor};
use std::path::PathBuf;

// Chapter-shaped document with `paragraphs` body paragraphs
fn generate_chapter(paragraphs: usize) -> String {
    let mut doc = String::from(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<html><head><title>I</title></head><body>",
    );
    doc.push_str("<section><hgroup><h2>I</h2><p>In Which We Begin</p></hgroup>");
    for i in 0..paragraphs {
        doc.push_str(&format!(
            "<p>Paragraph {i} was <i>rather</i> long &amp; winding,   with  spacing.</p>\n"
        ));
        if i % 25 == 24 {
            doc.push_str(&format!("<h3>Part {i}</h3>"));
        }
    }
    doc.push_str("</section></body></html>");
    doc
}

fn benchmark_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract");
    let extractor = TextExtractor::default();

    for size in [10, 100, 1_000] {
        let chapter = generate_chapter(size);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{size}_paragraphs")),
            &chapter,
            |b, doc| b.iter(|| black_box(extractor.extract(black_box(doc)))),
        );
    }

    group.finish();
}

fn benchmark_tokenize(c: &mut Criterion) {
    let chapter = generate_chapter(1_000);
    c.bench_function("tokenize_1000_paragraphs", |b| {
        b.iter(|| black_box(tokenize(black_box(&chapter))))
    });
}

fn benchmark_extract_many(c: &mut Criterion) {
    let documents: Vec<String> = (0..64).map(|_| generate_chapter(100)).collect();
    let extractor = TextExtractor::default();
    c.bench_function("extract_many_64_chapters", |b| {
        b.iter(|| black_box(extractor.extract_many(black_box(documents.as_slice()))))
    });
}

fn benchmark_baseline(c: &mut Criterion) {
    let extractor = TextExtractor::default();
    let pages: Vec<Page> = (0..32)
        .map(|i| Page {
            name: format!("work-{i}"),
            path: PathBuf::from(format!("work-{i}/merged.txt")),
            text: extractor.extract(&generate_chapter(500)).unwrap_or_default(),
        })
        .collect();

    c.bench_function("count_char_single_page", |b| {
        b.iter(|| count_char(black_box(&pages[0].text), 'a'))
    });

    let mut group = c.benchmark_group("baseline");
    for parallel in [false, true] {
        group.bench_with_input(
            BenchmarkId::from_parameter(if parallel { "parallel" } else { "sequential" }),
            &parallel,
            |b, &parallel| b.iter(|| black_box(run_baseline(&pages, 'a', parallel).result)),
        );
    }
    group.finish();

    let concordance = Concordance::new("winding", SearchConfig::default()).unwrap();
    c.bench_function("concordance_32_pages", |b| {
        b.iter(|| black_box(concordance.search(&pages).map(|r| r.matches.len())))
    });
}

criterion_group!(
    benches,
    benchmark_extract,
    benchmark_tokenize,
    benchmark_extract_many,
    benchmark_baseline
);
criterion_main!(benches);
