use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use steptree::adapter::build_layout_tree;
use steptree::config::LayoutConfig;
use steptree::layout::compute_layout;
use steptree::store::{Side, TreeStore};

fn balanced_store(depth: usize, steps_per_node: usize) -> TreeStore {
    let mut store = TreeStore::new();
    let root = store.create_root("benchmark root");
    grow(&mut store, &root, depth, steps_per_node);
    store
}

fn grow(store: &mut TreeStore, problem_id: &str, depth: usize, steps_per_node: usize) {
    for i in 1..=steps_per_node {
        let step = store
            .create_step(
                problem_id,
                i as u32,
                &format!("Step {i}"),
                "line one\nline two\nline three",
            )
            .expect("generated parent exists");
        if depth > 0 {
            let side = if i % 2 == 0 { Side::Left } else { Side::Right };
            let sub = store
                .create_sub_problem(&step, "generated sub-problem", Some(side))
                .expect("generated step exists");
            grow(store, &sub, depth - 1, steps_per_node);
        }
    }
}

const SHAPES: [(&str, usize, usize); 4] = [
    ("shallow", 2, 2),
    ("medium", 3, 3),
    ("deep", 5, 2),
    ("wide", 2, 6),
];

fn bench_adapt(c: &mut Criterion) {
    let mut group = c.benchmark_group("adapt");
    let config = LayoutConfig::default();
    for (name, depth, steps) in SHAPES {
        let store = balanced_store(depth, steps);
        group.bench_with_input(BenchmarkId::from_parameter(name), &store, |b, store| {
            b.iter(|| {
                let tree = build_layout_tree(black_box(store), None, &config)
                    .expect("generated store has a root");
                black_box(tree.children.len());
            });
        });
    }
    group.finish();
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let config = LayoutConfig::default();
    for (name, depth, steps) in SHAPES {
        let store = balanced_store(depth, steps);
        let tree = build_layout_tree(&store, None, &config).expect("generated store has a root");
        group.bench_with_input(BenchmarkId::from_parameter(name), &tree, |b, tree| {
            b.iter(|| {
                let mut tree = tree.clone();
                compute_layout(black_box(&mut tree), &config).expect("default config is valid");
                black_box(tree.subtree_width);
            });
        });
    }
    group.finish();
}

fn bench_end_to_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("end_to_end");
    let config = LayoutConfig::default();
    for (name, depth, steps) in SHAPES {
        let exported = balanced_store(depth, steps).export_tree();
        group.bench_with_input(
            BenchmarkId::from_parameter(name),
            exported.as_str(),
            |b, data| {
                b.iter(|| {
                    let store = TreeStore::import_tree(black_box(data)).expect("import failed");
                    let mut tree = build_layout_tree(&store, None, &config)
                        .expect("imported store has a root");
                    compute_layout(&mut tree, &config).expect("default config is valid");
                    black_box(tree.subtree_width);
                });
            },
        );
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_adapt, bench_layout, bench_end_to_end
);
criterion_main!(benches);
