//! Dispatch-path benchmarks.
//!
//! Covers the two hot paths: warm slot resolution through the registry and
//! a full materializing dispatch through a capability.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use slotcall::{registry, ArgList, Capability, LinePrinter, OpKind};

fn bench_warm_registration(c: &mut Criterion) {
    let types = <(i64, f64, &str) as ArgList>::TYPES;
    registry::global().register(OpKind::Capture, types);

    c.bench_function("register_warm", |b| {
        b.iter(|| registry::global().register(black_box(OpKind::Capture), black_box(types)))
    });
}

fn bench_capture_dispatch(c: &mut Criterion) {
    registry::prime::<(i64, f64, &str)>(OpKind::Capture);
    let printer = Capability::new(LinePrinter).expect("table builds from primed registry");

    c.bench_function("capture_three_args", |b| {
        b.iter(|| printer.capture(black_box((5i64, 2.5, "Hello, world!"))))
    });
}

criterion_group!(benches, bench_warm_registration, bench_capture_dispatch);
criterion_main!(benches);
