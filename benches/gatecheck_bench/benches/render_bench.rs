//! Diagnostic rendering benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gatecheck_core::{render_message, Arguments};
use gatecheck_validate::{
    Constraint, ConstraintViolation, ExecutableId, PathNode, PropertyPath, ViolationSet,
};
use serde_json::json;

fn violations(n: usize) -> ViolationSet {
    (0..n)
        .map(|i| ConstraintViolation {
            message: "must be greater than 0".to_string(),
            message_template: "must be greater than 0".to_string(),
            property_path: PropertyPath::from_nodes(vec![
                PathNode::method("place"),
                PathNode::parameter("lines", 0),
                PathNode::property("quantity").at_index(i),
            ]),
            root_bean: Some(json!({"id": 1})),
            invalid_value: json!(-(i as i64)),
            constraint: Constraint::positive(),
        })
        .collect()
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_message");
    let method = ExecutableId::method("Shop", "place").param("Vec<Line>");
    let arguments = Arguments::from(vec![json!([1, 2, 3])]);

    for n in [1usize, 10, 100] {
        let set = violations(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &set, |b, set| {
            b.iter(|| black_box(render_message(&method, &arguments, set).map(|m| m.len())))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_render);
criterion_main!(benches);
