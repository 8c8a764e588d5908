use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use findlib_core::select_best;
use findlib_util::fs::walk_files;
use std::path::PathBuf;

fn candidates(count: usize) -> Vec<PathBuf> {
    (0..count)
        .map(|i| PathBuf::from(format!("/usr/lib/x86_64-linux-gnu/libpkg{i}.so.{}", i % 7)))
        .chain(std::iter::once(PathBuf::from("/usr/lib/libpcre.so")))
        .collect()
}

fn bench_select_best(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_best");

    for count in [10, 100, 1000] {
        let files = candidates(count);
        group.throughput(Throughput::Elements(files.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &files, |b, files| {
            b.iter(|| select_best(black_box(files), "libpcre", ".so"));
        });
    }

    group.finish();
}

fn bench_walk_files(c: &mut Criterion) {
    let mut group = c.benchmark_group("walk_files");

    for count in [10, 100, 1000] {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..count {
            let sub = dir.path().join(format!("d{}", i % 10));
            std::fs::create_dir_all(&sub).unwrap();
            std::fs::write(sub.join(format!("lib{i}.so")), b"").unwrap();
        }

        group.bench_with_input(BenchmarkId::from_parameter(count), &dir, |b, dir| {
            b.iter(|| walk_files(black_box(dir.path())));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_select_best, bench_walk_files);
criterion_main!(benches);
