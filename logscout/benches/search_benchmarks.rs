#![allow(unused_must_use)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use logscout::{
    collect_log_files, combine_patterns, source::MemoryOpener, SearchConfig, SearchEngine,
    SearchEvent,
};
use std::{fs::File, io::Write, num::NonZeroUsize, path::PathBuf, sync::Arc, time::Duration};
use tempfile::tempdir;

fn create_test_files(
    dir: &tempfile::TempDir,
    file_count: usize,
    lines_per_file: usize,
) -> std::io::Result<()> {
    for i in 0..file_count {
        let file_path = dir.path().join(format!("trace_{}.log", i));
        let mut file = File::create(file_path)?;
        for j in 0..lines_per_file {
            if j % 250 == 0 {
                writeln!(
                    file,
                    "2024-05-01T10:00:00Z ECU{} NET connection refused by peer {}",
                    i, j
                )?;
            } else {
                writeln!(file, "2024-05-01T10:00:00Z ECU{} NET heartbeat {}", i, j)?;
            }
        }
    }
    Ok(())
}

fn memory_opener(file_count: usize, records: usize) -> (MemoryOpener, Vec<PathBuf>) {
    let mut opener = MemoryOpener::new();
    let mut paths = Vec::with_capacity(file_count);
    for i in 0..file_count {
        let path = PathBuf::from(format!("mem_{}.log", i));
        opener.insert(
            path.clone(),
            (0..records).map(|j| {
                if j % 250 == 0 {
                    format!("timeout after {}ms", j)
                } else {
                    format!("heartbeat {}", j)
                }
            }),
        );
        paths.push(path);
    }
    (opener, paths)
}

/// Runs one search to completion and returns the number of matches
fn run_to_completion(engine: &SearchEngine, paths: &[PathBuf], expression: &str) -> usize {
    let events = engine.events();
    engine.search(paths.iter().cloned(), expression).unwrap();
    while let Ok(event) = events.recv_timeout(Duration::from_secs(60)) {
        if event == SearchEvent::SearchFinished {
            break;
        }
    }
    engine.results().total_matches()
}

fn bench_patterns(c: &mut Criterion) {
    let (opener, paths) = memory_opener(16, 5_000);
    let engine = SearchEngine::with_opener(4, Arc::new(opener)).unwrap();

    let patterns = vec![
        "timeout",
        r"timeout after \d+ms",
        r"(timeout)|(connection refused)",
    ];

    let mut group = c.benchmark_group("Patterns");
    for (i, pattern) in patterns.iter().enumerate() {
        group.bench_function(format!("pattern_{}", i), |b| {
            b.iter(|| black_box(run_to_completion(&engine, &paths, pattern)));
        });
    }
    group.finish();
}

fn bench_pool_scaling(c: &mut Criterion) {
    let (opener, paths) = memory_opener(32, 5_000);
    let opener = Arc::new(opener);

    let mut group = c.benchmark_group("Pool Scaling");
    for threads in [2, 4, 8] {
        let engine = SearchEngine::with_opener(threads, opener.clone()).unwrap();
        group.bench_function(format!("threads_{}", threads), |b| {
            b.iter(|| black_box(run_to_completion(&engine, &paths, "timeout")));
        });
    }
    group.finish();
}

fn bench_file_scaling(c: &mut Criterion) -> std::io::Result<()> {
    let mut group = c.benchmark_group("File Scaling");
    for count in [1, 10, 100] {
        let dir = tempdir()?;
        create_test_files(&dir, count, 1_000)?;

        let config = SearchConfig {
            patterns: vec!["connection refused".to_string()],
            root_path: dir.path().to_path_buf(),
            thread_count: NonZeroUsize::new(4).unwrap(),
            ..SearchConfig::default()
        };
        let expression = combine_patterns(&config.patterns).unwrap();
        let files = collect_log_files(&config).unwrap();
        let engine = SearchEngine::new(&config).unwrap();

        group.bench_function(format!("files_{}", count), |b| {
            b.iter(|| black_box(run_to_completion(&engine, &files, &expression)));
        });
    }
    group.finish();
    Ok(())
}

fn bench_first_match(c: &mut Criterion) {
    // Only the first promotion is awaited, the rest is cancelled
    let (opener, paths) = memory_opener(64, 20_000);
    let engine = SearchEngine::with_opener(4, Arc::new(opener)).unwrap();
    let events = engine.events();

    c.bench_function("time_to_first_match", |b| {
        b.iter(|| {
            engine.search(paths.iter().cloned(), "timeout").unwrap();
            while let Ok(event) = events.recv_timeout(Duration::from_secs(60)) {
                if let SearchEvent::FoundFile { index } = event {
                    black_box(index);
                    break;
                }
            }
            engine.cancel(true);
            engine.wait_idle(Duration::from_secs(60));
            events.try_iter().for_each(drop);
        });
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(20);
    targets = bench_patterns, bench_pool_scaling, bench_file_scaling, bench_first_match
}

criterion_main!(benches);
