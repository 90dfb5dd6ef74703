//! Interception overhead benchmarks
//!
//! Measures the cost of wrapping a call in parameter and return value
//! validation, against calling it directly.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gatecheck_core::{Arguments, InterceptorConfig, MethodInvocation, ValidationInterceptor};
use gatecheck_validate::{
    BeanConstraints, Cascade, Constraint, ConstraintRegistry, ExecutableConstraints, ExecutableId,
};
use serde::Serialize;
use serde_json::json;
use std::convert::Infallible;

#[derive(Serialize)]
struct Line {
    sku: String,
    quantity: i64,
}

fn place() -> ExecutableId {
    ExecutableId::method("Shop", "place")
        .params(["Vec<Line>", "String"])
        .returns("u64")
}

fn registry() -> ConstraintRegistry {
    ConstraintRegistry::new()
        .bean(
            "Line",
            BeanConstraints::new()
                .property("sku", [Constraint::regex("^[A-Z]{3}-[0-9]+$").unwrap()])
                .property("quantity", [Constraint::positive()]),
        )
        .executable(
            place(),
            ExecutableConstraints::new()
                .parameter(0, "lines", [Constraint::required()])
                .cascade_parameter(0, Cascade::elements("Line"))
                .parameter(1, "currency", [Constraint::length(3, 3)])
                .return_value([Constraint::positive()]),
        )
}

fn lines(n: usize) -> Vec<Line> {
    (0..n)
        .map(|i| Line {
            sku: format!("ABC-{}", i),
            quantity: 1 + i as i64,
        })
        .collect()
}

fn bench_valid_call(c: &mut Criterion) {
    let mut group = c.benchmark_group("valid_call");
    let interceptor = ValidationInterceptor::new(registry());
    let method = place();

    for n in [1usize, 10, 100] {
        let order = serde_json::to_value(lines(n)).unwrap_or_default();

        group.bench_with_input(BenchmarkId::new("direct", n), &n, |b, &n| {
            b.iter(|| black_box(n as u64))
        });

        group.bench_with_input(BenchmarkId::new("intercepted", n), &n, |b, &n| {
            b.iter(|| {
                let invocation = MethodInvocation::new(
                    json!({}),
                    method.clone(),
                    Arguments::from(vec![order.clone(), json!("EUR")]),
                    || Ok::<_, Infallible>(n as u64),
                );
                black_box(interceptor.around_invoke(invocation).is_ok())
            })
        });
    }

    group.finish();
}

fn bench_rejected_call(c: &mut Criterion) {
    let interceptor = ValidationInterceptor::new(registry());
    let method = place();
    let order = json!([{"sku": "bad", "quantity": 0}, {"sku": "ABC-1", "quantity": -1}]);

    c.bench_function("rejected_call", |b| {
        b.iter(|| {
            let invocation = MethodInvocation::new(
                json!({}),
                method.clone(),
                Arguments::from(vec![order.clone(), json!("EURO")]),
                || Ok::<_, Infallible>(1u64),
            );
            black_box(interceptor.around_invoke(invocation).is_err())
        })
    });
}

fn bench_skipped_call(c: &mut Criterion) {
    let interceptor = ValidationInterceptor::new(registry()).with_config(InterceptorConfig::disabled());
    let method = place();

    c.bench_function("skipped_call", |b| {
        b.iter(|| {
            let invocation = MethodInvocation::new(
                json!({}),
                method.clone(),
                Arguments::new(),
                || Ok::<_, Infallible>(1u64),
            );
            black_box(interceptor.around_invoke(invocation).is_ok())
        })
    });
}

criterion_group!(benches, bench_valid_call, bench_rejected_call, bench_skipped_call);
criterion_main!(benches);
