//! Performance benchmarks for modifier ordering and hook chain evaluation
//!
//! Measures how ordering scales with the number of modifiers on a step and
//! how much the hook chain adds around a trivial action.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::hint::black_box;
use stepmaker::parse::order_modifiers;
use stepmaker::testing::{
    register_scripted_action, register_scripted_modifier, CallLog, TestKind,
};
use stepmaker::{EngineConfig, ModifierHints, Registry, StepAddress, StepParser};

fn modifier_names(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("mod_{:03}", i)).collect()
}

/// Chain-shaped hints: every modifier must run after its predecessor
fn chained_hints(names: &[String]) -> Vec<ModifierHints> {
    names
        .iter()
        .enumerate()
        .map(|(i, _)| {
            let builder = ModifierHints::declare();
            match i.checked_sub(1) {
                Some(prev) => builder.after([names[prev].as_str()]).build(),
                None => builder.build(),
            }
        })
        .collect()
}

/// Benchmark ordering with and without hints
fn bench_ordering(c: &mut Criterion) {
    let mut group = c.benchmark_group("modifier_ordering");

    for size in &[4, 16, 64, 256] {
        let names = modifier_names(*size);
        let plain = ModifierHints::declare().build();
        let hints = chained_hints(&names);

        let unconstrained: BTreeMap<&str, &ModifierHints> =
            names.iter().map(|name| (name.as_str(), &plain)).collect();
        group.bench_with_input(
            BenchmarkId::new("unconstrained", size),
            &unconstrained,
            |b, map| b.iter(|| order_modifiers(black_box(map))),
        );

        let chained: BTreeMap<&str, &ModifierHints> = names
            .iter()
            .map(String::as_str)
            .zip(hints.iter())
            .collect();
        group.bench_with_input(BenchmarkId::new("chained", size), &chained, |b, map| {
            b.iter(|| order_modifiers(black_box(map)))
        });
    }

    group.finish();
}

/// Benchmark parsing and calling a step with a growing modifier chain
fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("hook_chain");

    for size in &[0, 4, 16, 64] {
        let log = CallLog::new();
        let mut registry = Registry::<TestKind>::new();
        register_scripted_action(&mut registry, "run", &log, "done");

        let mut description = Mapping::new();
        description.insert(Value::from("run"), Value::Null);
        for name in modifier_names(*size) {
            register_scripted_modifier(&mut registry, &name, &log, ModifierHints::declare().build());
            description.insert(Value::from(name), Value::Null);
        }
        let description = Value::Mapping(description);
        let addr = StepAddress::new("bench.yaml").idx(0);
        let parser = StepParser::new(&registry, &EngineConfig::default())
            .expect("distinct namespaces");

        group.bench_with_input(BenchmarkId::new("parse", size), &description, |b, raw| {
            b.iter(|| parser.parse(black_box(raw), &addr).expect("valid step"))
        });

        let step = parser.parse(&description, &addr).expect("valid step");
        group.bench_function(BenchmarkId::new("call", size), |b| {
            b.iter(|| {
                let result = step.call(&mut ()).expect("step succeeds");
                log.clear();
                result
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_ordering, bench_chain);
criterion_main!(benches);
