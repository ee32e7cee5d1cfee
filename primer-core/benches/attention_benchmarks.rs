use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use primer_core::attention::{AttentionWeightGenerator, summarize_heads};
use primer_core::scroll_spy::{
    LayoutSnapshot, Rect, ScrollSpy, ScrollSpyOptions, SectionRef, VisibilityEntry,
};
use primer_core::tokenize;

const PANGRAM: &str = "The quick brown fox jumps over the lazy dog.";

fn bench_tokenizer(c: &mut Criterion) {
    c.bench_function("tokenize_pangram", |b| {
        b.iter(|| tokenize(black_box(PANGRAM), true))
    });

    let long_text = PANGRAM.repeat(50);
    c.bench_function("tokenize_long_text", |b| {
        b.iter(|| tokenize(black_box(&long_text), true))
    });
}

fn bench_generator(c: &mut Criterion) {
    let mut group = c.benchmark_group("attention_generate");
    for heads in [1usize, 4, 12] {
        group.bench_with_input(BenchmarkId::from_parameter(heads), &heads, |b, &heads| {
            let mut generator = AttentionWeightGenerator::seeded(7);
            b.iter(|| {
                generator
                    .generate(black_box(PANGRAM), heads, 1.0)
                    .map(|map| map.token_count())
            })
        });
    }
    group.finish();

    let long_text = PANGRAM.repeat(10);
    c.bench_function("attention_generate_100_tokens", |b| {
        let mut generator = AttentionWeightGenerator::seeded(7);
        b.iter(|| generator.generate(black_box(&long_text), 4, 0.5))
    });

    let map = AttentionWeightGenerator::seeded(7)
        .generate(&long_text, 12, 1.0)
        .unwrap();
    c.bench_function("summarize_12_heads", |b| {
        b.iter(|| summarize_heads(black_box(&map)))
    });
}

fn bench_scroll_spy(c: &mut Criterion) {
    let ids: Vec<String> = (0..50).map(|i| format!("section-{}", i)).collect();
    let mut spy = ScrollSpy::new(ScrollSpyOptions::default()).unwrap();
    spy.register(ids.iter().map(SectionRef::new).collect());

    let entries: Vec<VisibilityEntry> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| VisibilityEntry::new(id.clone(), if i > 40 { 0.5 } else { 0.0 }))
        .collect();
    c.bench_function("scroll_spy_visibility_50_sections", |b| {
        b.iter(|| spy.on_visibility(black_box(&entries)).map(str::len))
    });

    let mut snapshot = LayoutSnapshot::new(Rect::new(0.0, 0.0, 1280.0, 800.0));
    for (i, id) in ids.iter().enumerate() {
        snapshot = snapshot.with_region(
            id.clone(),
            Rect::new(0.0, i as f64 * 600.0 - 20_000.0, 1280.0, 600.0),
        );
    }
    c.bench_function("scroll_spy_layout_50_sections", |b| {
        b.iter(|| spy.on_layout(black_box(&snapshot)).map(str::len))
    });
}

criterion_group!(benches, bench_tokenizer, bench_generator, bench_scroll_spy);
criterion_main!(benches);
