//! Benchmarks for fragment insertion on report-sized documents.
//!
//! Every insertion maps positions by walking the whole tree, so cost grows
//! with document size. These benchmarks track caret insertion, selection
//! replacement and position mapping on a document of a few hundred
//! paragraphs, roughly the size of a long dictated report.

use std::time::Duration;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use dictum_core::config::DictumConfig;
use dictum_core::types::FlatRange;
use dictum_editor::position::{to_flat_offsets, to_tree_range};
use dictum_editor::{ContentNode, DictationSurface, StructuredContent};

/// Number of paragraphs in the benchmark document.
const PARAGRAPH_COUNT: usize = 300;

/// A report of `PARAGRAPH_COUNT` paragraphs separated by line breaks.
fn generate_report() -> StructuredContent {
    let mut nodes = Vec::with_capacity(PARAGRAPH_COUNT * 2);
    for index in 0..PARAGRAPH_COUNT {
        if index > 0 {
            nodes.push(ContentNode::LineBreak);
        }
        nodes.push(ContentNode::Element {
            tag: "p".to_string(),
            children: vec![ContentNode::Text {
                text: format!(
                    "Series {} demonstrates a low grade intermediate lesion in the \
                     left lobe without surrounding edema or mass effect.",
                    index
                ),
            }],
        });
    }
    StructuredContent { nodes }
}

fn bench_insertion(c: &mut Criterion) {
    let config = DictumConfig::default();
    let report = generate_report();
    let len = report.to_plain_text().chars().count();
    let middle = len / 2;

    let mut group = c.benchmark_group("insertion");
    group.sample_size(50);
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("caret_middle", |b| {
        b.iter_batched(
            || {
                let mut surface = DictationSurface::with_content(&config, report.clone());
                surface.select(FlatRange::caret(middle));
                surface
            },
            |mut surface| surface.insert_fragment("no acute findings"),
            BatchSize::SmallInput,
        );
    });

    group.bench_function("replace_selection_with_joiner", |b| {
        b.iter_batched(
            || {
                let mut surface = DictationSurface::with_content(&config, report.clone());
                surface.select(FlatRange::new(middle, middle + 4));
                surface
            },
            |mut surface| surface.insert_fragment("slash intermediate"),
            BatchSize::SmallInput,
        );
    });

    group.bench_function("dictation_burst_20", |b| {
        b.iter_batched(
            || {
                let mut surface = DictationSurface::with_content(&config, report.clone());
                surface.select(FlatRange::caret(middle));
                surface
            },
            |mut surface| {
                for _ in 0..20 {
                    surface.insert_fragment("twenty-one point five millimeters");
                }
                surface
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_position_mapping(c: &mut Criterion) {
    let surface = DictationSurface::with_content(&DictumConfig::default(), generate_report());
    let doc = surface.document();
    let len = doc.flat_len();

    let mut group = c.benchmark_group("position_mapping");
    group.sample_size(100);

    group.bench_function("round_trip_end_of_document", |b| {
        b.iter(|| {
            let tree = to_tree_range(doc, FlatRange::new(len - 10, len));
            to_flat_offsets(doc, &tree)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_insertion, bench_position_mapping);
criterion_main!(benches);
