use std::hint::black_box;

use charprep::{normalize, Pipeline, PipelineConfig};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, SamplingMode, Throughput};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

const FRAGMENTS: &[&str] = &[
    "The ",
    "river ",
    "[[Danube|Danube River]] ",
    "{{convert|2850|km}} ",
    "flows ",
    "through ",
    "'''ten''' ",
    "countries",
    ". ",
    "&nbsp;",
    "<ref name=\"britannica\">cited</ref>",
    "[http://example.org source] ",
    "user20931 ",
    "\n\n== History ==\n",
    "in 1856 ",
];

fn build_dump(target_len: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(0x454e_5749_4b38); // "ENWIK8"
    let mut body = String::with_capacity(target_len + 64);
    while body.len() < target_len {
        if let Some(fragment) = FRAGMENTS.choose(&mut rng) {
            body.push_str(fragment);
        }
    }
    format!("<page><text xml:space=\"preserve\">{body}</text></page>").into_bytes()
}

fn bench_pipeline(c: &mut Criterion) {
    let dump = build_dump(1 << 20);
    let cfg = PipelineConfig::builder()
        .show_progress(false)
        .build()
        .expect("configuration");
    let raw_text = charprep::bytes::bytes_to_text(&dump);

    let mut group = c.benchmark_group("prepare_wiki_dump");
    group.throughput(Throughput::Bytes(dump.len() as u64));
    group.sampling_mode(SamplingMode::Flat);
    group.bench_function(BenchmarkId::new("normalize", "MiB_1"), |b| {
        b.iter(|| {
            let cleaned = normalize::normalize(&raw_text).expect("normalize");
            let _ = black_box(cleaned);
        });
    });
    group.bench_function(BenchmarkId::new("full", "MiB_1"), |b| {
        b.iter(|| {
            let pipeline = Pipeline::new(cfg.clone());
            let artifacts = pipeline.prepare_from_bytes(&dump).expect("prepare");
            let _ = black_box(artifacts);
        });
    });
    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
