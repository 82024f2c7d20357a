use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rc_flyweight::{Factory, Handle, StrView};
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

// Fresh values: every intern misses, every drop purges.
fn bench_intern_unique(c: &mut Criterion) {
    c.bench_function("flyweight_intern_purge_unique_10k", |b| {
        b.iter_batched(
            || lcg(1).take(10_000).map(key).collect::<Vec<_>>(),
            |keys| {
                let f: Factory<String> = Factory::new();
                let handles: Vec<_> = keys.into_iter().map(|k| f.intern(k)).collect();
                black_box(f.count_unique());
                drop(handles);
            },
            BatchSize::SmallInput,
        )
    });
}

// One value interned repeatedly: every intern after the first hits.
fn bench_intern_dedup(c: &mut Criterion) {
    c.bench_function("flyweight_intern_dedup_10k", |b| {
        let f: Factory<str, StrView> = Factory::new();
        let _anchor = f.intern_ref("The quick brown fox");
        b.iter(|| {
            let handles: Vec<_> = (0..10_000)
                .map(|_| f.intern_ref("The quick brown fox"))
                .collect();
            black_box(handles.len());
        })
    });
}

fn bench_contains_miss(c: &mut Criterion) {
    c.bench_function("flyweight_contains_miss", |b| {
        let f: Factory<String> = Factory::new();
        let _held: Vec<_> = lcg(11).take(10_000).map(|x| f.intern(key(x))).collect();
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            let k = key(miss.next().unwrap());
            black_box(f.contains(&k));
        })
    });
}

fn bench_clone_drop_handle(c: &mut Criterion) {
    c.bench_function("flyweight_clone_drop_handle", |b| {
        let f: Factory<u64> = Factory::new();
        let h = f.intern(1);
        b.iter(|| {
            let x = h.clone();
            black_box(&x);
            drop(x);
        })
    });
}

fn bench_get_and_compare(c: &mut Criterion) {
    c.bench_function("flyweight_get_and_compare", |b| {
        let f1: Factory<String> = Factory::new();
        let f2: Factory<String> = Factory::new();
        let a = f1.intern("value".to_string());
        let same = a.clone();
        let other: Handle<'_, String> = f2.intern("value".to_string());
        b.iter(|| {
            black_box(a == same);
            black_box(a == other);
            black_box(a.get().len());
        })
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(8))
        .warm_up_time(Duration::from_secs(2))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_intern_unique, bench_intern_dedup, bench_contains_miss,
        bench_clone_drop_handle, bench_get_and_compare
}
criterion_main!(benches);
