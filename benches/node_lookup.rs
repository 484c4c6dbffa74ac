use codecity::snapshot::SnapshotRecord;
use codecity::tree::optimizer::remove_unnecessary_nodes;
use codecity::tree::walker::PathWalker;
use codecity::tree::Tree;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn synthetic_records(count: usize) -> Vec<SnapshotRecord> {
    (0..count)
        .map(|i| {
            SnapshotRecord::new(
                i as i64 + 1,
                format!("module{}/package{}/Class{}.java", i % 8, i % 41, i),
                (i % 100) as f64,
                (i % 17) as f64,
            )
        })
        .collect()
}

fn build_tree(records: &[SnapshotRecord]) -> Tree {
    let mut walker = PathWalker::new(1);
    for record in records {
        walker.add_record(record);
    }
    let mut tree = walker.into_tree();
    remove_unnecessary_nodes(&mut tree);
    tree
}

fn bench_build(c: &mut Criterion) {
    let records = synthetic_records(1_000);
    c.bench_function("build_and_optimize_1k", |b| {
        b.iter(|| build_tree(black_box(&records)))
    });
}

fn bench_lookup(c: &mut Criterion) {
    let records = synthetic_records(1_000);
    let tree = build_tree(&records);
    c.bench_function("find_by_id_1k", |b| {
        b.iter(|| {
            for id in [1_i64, 250, 500, 999] {
                black_box(tree.find_by_id(black_box(id)));
            }
        })
    });
}

criterion_group!(benches, bench_build, bench_lookup);
criterion_main!(benches);
