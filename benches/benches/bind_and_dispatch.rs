// Copyright 2025 the Class Component Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::cell::Cell;
use std::hint::black_box;
use std::rc::Rc;

use class_component::{Class, ClassComponents, Completion, Value, emit, event, trigger};
use class_component_tree::{Document, ElementId};
use criterion::{BatchSize, Criterion, Throughput, criterion_group, criterion_main};

type Doc = Document<Value>;

#[derive(Default)]
struct Counter {
    count: Cell<u64>,
}

fn counter_class() -> Class<Doc, Counter> {
    Class::<Doc, Counter>::builder_default()
        .method("bump", |this, _| {
            this.count.set(this.count.get() + 1);
            Completion::value(this.count.get())
        })
        .annotate("bump", event("click", Some(".plus")))
        .annotate("bump", emit("bumped").last())
        .annotate("bump", trigger(Some("start"), Some("end"), None))
        .build()
        .unwrap()
}

/// A root with `n` component children, each holding one `.plus` button.
fn gen_components(n: usize) -> (Rc<Doc>, ElementId, Vec<ElementId>) {
    let doc = Rc::new(Doc::new());
    let root = doc.create_element(None, "main");
    let mut buttons = Vec::with_capacity(n);
    for _ in 0..n {
        let el = doc.create_with_classes(Some(root), "div", "counter");
        buttons.push(doc.create_with_classes(Some(el), "button", "plus"));
    }
    (doc, root, buttons)
}

fn bench_bind(c: &mut Criterion) {
    let mut group = c.benchmark_group("bind");
    for &n in &[10_usize, 100, 1000] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("init_all_n{n}"), |b| {
            b.iter_batched(
                || {
                    let (doc, root, _) = gen_components(n);
                    let cc = ClassComponents::new(doc);
                    cc.register("counter", counter_class());
                    (cc, root)
                },
                |(cc, root)| black_box(cc.init_all(&root).unwrap()),
                BatchSize::SmallInput,
            );
        });
        group.bench_function(format!("rebind_noop_n{n}"), |b| {
            let (doc, root, _) = gen_components(n);
            let cc = ClassComponents::new(doc);
            cc.register("counter", counter_class());
            cc.init_all(&root).unwrap();
            b.iter(|| black_box(cc.init_all(&root).unwrap()));
        });
    }
    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    let (doc, root, buttons) = gen_components(100);
    let cc = ClassComponents::new(Rc::clone(&doc));
    cc.register("counter", counter_class());
    cc.init_all(&root).unwrap();

    group.throughput(Throughput::Elements(buttons.len() as u64));
    group.bench_function("delegated_click_with_emissions", |b| {
        b.iter(|| {
            for &button in &buttons {
                black_box(doc.dispatch(button, "click", None));
            }
        });
    });
    group.bench_function("direct_call", |b| {
        let el = doc.parent(buttons[0]).unwrap();
        b.iter(|| black_box(cc.call(&el, "counter", "bump", Value::unit()).unwrap()));
    });
    group.finish();
}

criterion_group!(benches, bench_bind, bench_dispatch);
criterion_main!(benches);
