// Benchmarks for the per-query path: filtering, index search, selection, full ask
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use kbquery_core::{FilterChain, KnowledgeStore, QueryContext, RecordSchema, SessionMemory, Vector};
use kbquery_engine::{presets, Engine};
use kbquery_similarity::{Embedder, HashEmbedder, IndexKind, Metric, Scored, Selector};
use rand::prelude::*;
use serde_json::json;
use std::hint::black_box;

const DISTRICTS: [&str; 6] = ["동래구", "서구", "강서구", "해운대구", "금정구", "수영구"];
const ERAS: [&str; 4] = ["삼국", "고려", "조선", "근대"];
const KINDS: [&str; 2] = ["유형문화유산", "무형유산"];

fn heritage_store(size: usize) -> KnowledgeStore {
    let raw = (0..size)
        .map(|i| {
            json!({
                "이름": format!("유산 {}", i),
                "시대": ERAS[i % ERAS.len()],
                "종류": KINDS[i % KINDS.len()],
                "주소": format!("부산 {} {}번지", DISTRICTS[i % DISTRICTS.len()], i),
            })
        })
        .collect();
    KnowledgeStore::from_raw(&RecordSchema::heritage(), raw)
}

fn random_vectors(rng: &mut StdRng, count: usize, dim: usize) -> Vec<Vector> {
    (0..count)
        .map(|_| Vector::new((0..dim).map(|_| rng.random_range(-1.0f32..1.0f32)).collect()))
        .collect()
}

fn benchmark_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter");
    let config = presets::heritage();
    let chain = FilterChain::from_config(&config.filters, &config.keywords);
    let session = SessionMemory::new();

    for size in [100, 1000, 10000].iter() {
        let store = heritage_store(*size);
        let ctx = QueryContext::detect("조선시대 강서구 유형문화유산 알려줘", &config.keywords);
        group.bench_with_input(BenchmarkId::new("heritage_chain", size), size, |b, _| {
            b.iter(|| black_box(chain.apply(&store, &ctx, &session).len()));
        });
    }

    group.finish();
}

fn benchmark_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_search");
    let mut rng = StdRng::seed_from_u64(42);
    let query = random_vectors(&mut rng, 1, 256).remove(0);

    for size in [100, 1000, 10000].iter() {
        let vectors = random_vectors(&mut rng, *size, 256);
        for kind in [IndexKind::Flat, IndexKind::Matrix] {
            let index = kind.build(Metric::Cosine, vectors.clone()).unwrap();
            group.bench_with_input(BenchmarkId::new(format!("{:?}", kind), size), size, |b, _| {
                b.iter(|| black_box(index.search(&query, 20).unwrap()));
            });
        }
    }

    group.finish();
}

fn benchmark_select(c: &mut Criterion) {
    let selector = Selector::new(20, 0.45, Metric::Cosine.default_tie_epsilon()).unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    let scores: Vec<f32> = (0..1000).map(|i| if i % 50 == 0 { 0.9 } else { 0.5 }).collect();

    c.bench_function("select_1000_with_ties", |b| {
        b.iter(|| {
            let scored = scores.iter().enumerate().map(|(i, &s)| Scored::new(i, s)).collect();
            black_box(selector.select(scored, &Metric::Cosine, &mut rng))
        });
    });
}

fn benchmark_embed(c: &mut Criterion) {
    let embedder = HashEmbedder::default();
    let store = heritage_store(1000);
    let texts: Vec<&str> = store.iter().map(|r| r.search_text()).collect();

    c.bench_function("hash_embed_batch_1000", |b| {
        b.iter(|| black_box(embedder.embed_batch(&texts).unwrap()));
    });
}

fn benchmark_ask(c: &mut Criterion) {
    let engine = Engine::new(heritage_store(2000), presets::heritage(), HashEmbedder::default()).unwrap();
    let mut rng = StdRng::seed_from_u64(1);

    c.bench_function("ask_heritage_2000", |b| {
        b.iter(|| {
            let mut session = SessionMemory::new();
            black_box(engine.ask("해운대구 조선시대 문화유산", &mut session, &mut rng).unwrap())
        });
    });
}

criterion_group!(
    benches,
    benchmark_filter,
    benchmark_index,
    benchmark_select,
    benchmark_embed,
    benchmark_ask
);
criterion_main!(benches);
