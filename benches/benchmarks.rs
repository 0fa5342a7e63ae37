//! Performance benchmarks for rgq
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use rgq::workspace::{resolve_workspace, walk_repositories, WalkOptions};

/// Create a workspace of `groups` x 10 repositories, each with a small source tree
fn create_benchmark_workspace(groups: usize) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root_path = temp_dir.path().to_path_buf();

    for g in 0..groups {
        for r in 0..10 {
            let repo = root_path.join(format!("group{}/repo{}", g, r));
            fs::create_dir_all(repo.join(".git/objects")).expect("Failed to create repo");
            fs::create_dir_all(repo.join("src/nested")).expect("Failed to create src");
            fs::write(repo.join("src/main.rs"), "fn main() {}\n").expect("Failed to write file");
        }
        fs::create_dir_all(root_path.join(format!("group{}/docs/img", g)))
            .expect("Failed to create docs");
    }

    (temp_dir, root_path)
}

fn bench_query_parsing(c: &mut Criterion) {
    let queries = vec![
        "simple",
        "two words",
        "\"exact phrase\"",
        "f:*.rs fn",
        "foo Bar -f:test case:auto",
        "regex:fn\\s+\\w+ f:src",
        "(r:web or r:api) handler -r:vendor",
    ];

    let mut group = c.benchmark_group("query_parsing");
    for query in queries {
        group.bench_with_input(BenchmarkId::from_parameter(query), &query, |b, &q| {
            b.iter(|| rgq::query::parse_query(black_box(q)))
        });
    }
    group.finish();
}

fn bench_compile(c: &mut Criterion) {
    let queries = vec![
        "foo bar baz",
        "foo Bar -f:test",
        "fn\\s+main f:*.rs case:yes",
        "f:src -f:vendor -f:target",
    ];

    let mut group = c.benchmark_group("compile");
    for query in queries {
        let predicate = rgq::query::parse_query(query).expect("Failed to parse");
        group.bench_with_input(BenchmarkId::from_parameter(query), &predicate, |b, p| {
            b.iter(|| rgq::compile::compile(black_box(p)))
        });
    }
    group.finish();
}

fn bench_workspace(c: &mut Criterion) {
    let (_temp_dir, root_path) = create_benchmark_workspace(20);
    let predicate = rgq::query::parse_query("r:repo1 main").expect("Failed to parse");

    let mut group = c.benchmark_group("workspace");

    group.bench_function("walk_200_repos", |b| {
        b.iter(|| walk_repositories(vec![root_path.clone()], WalkOptions::default()).count())
    });

    group.bench_function("resolve_200_repos", |b| {
        b.iter(|| {
            let walk = walk_repositories(vec![root_path.clone()], WalkOptions::default());
            resolve_workspace(black_box(&predicate), walk).into_resolution()
        })
    });

    group.bench_function("first_repo", |b| {
        b.iter(|| walk_repositories(vec![root_path.clone()], WalkOptions::default()).next())
    });

    group.finish();
}

criterion_group!(benches, bench_query_parsing, bench_compile, bench_workspace);

criterion_main!(benches);
