use criterion::{criterion_group, criterion_main, Criterion};
use pagedex_core::tokenizer::tokenize;
use pagedex_core::InvertedIndex;

fn sample_page(n: usize) -> String {
    (0..400).map(|i| format!("word{} term{} ", i % 97, (i * n) % 31)).collect()
}

fn bench_tokenize(c: &mut Criterion) {
    let text = sample_page(1);
    c.bench_function("tokenize_page", |b| b.iter(|| tokenize(&text)));
}

fn bench_append(c: &mut Criterion) {
    let pages: Vec<String> = (1..=50).map(sample_page).collect();
    c.bench_function("append_50_pages", |b| {
        b.iter(|| {
            let mut index = InvertedIndex::new();
            for (i, text) in pages.iter().enumerate() {
                index.append(i as u32 + 1, text.as_str());
            }
            index
        })
    });
}

criterion_group!(benches, bench_tokenize, bench_append);
criterion_main!(benches);
