// Copyright 2025 the Class Component Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Counter component.
//!
//! Binds a counter to every `.counter` element under a root, forwards clicks on its
//! `.plus` and `.minus` buttons to methods, and reports each change with an emission.
//!
//! Run:
//! - `cargo run -p class_component_demos --example counter`
//! - `RUST_LOG=class_component=trace cargo run -p class_component_demos --example counter`

use std::cell::Cell;
use std::rc::Rc;

use class_component::{Class, ClassComponents, Completion, Value, emit, event};
use class_component_tree::{Document, Event};
use tracing_subscriber::EnvFilter;

type Doc = Document<Value>;

#[derive(Default)]
struct Counter {
    count: Cell<i64>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let doc = Rc::new(Doc::new());
    let cc = ClassComponents::new(Rc::clone(&doc));
    cc.define(
        Class::<Doc, Counter>::builder_default()
            .component("counter")
            .method("increment", |this, _| {
                this.count.set(this.count.get() + 1);
                Completion::value(this.count.get())
            })
            .method("decrement", |this, _| {
                this.count.set(this.count.get() - 1);
                Completion::value(this.count.get())
            })
            .annotate("increment", event("click", Some(".plus")))
            .annotate("increment", emit("changed").last())
            .annotate("decrement", event("click", Some(".minus")))
            .annotate("decrement", emit("changed").last())
            .build()
            .expect("valid class"),
    )
    .expect("named class");

    let body = doc.create_element(None, "body");
    let mut counters = Vec::new();
    for label in ["left", "right"] {
        let el = doc.create_with_classes(Some(body), "div", "counter");
        doc.set_attr(el, "id", label);
        let plus = doc.create_with_classes(Some(el), "button", "plus");
        let minus = doc.create_with_classes(Some(el), "button", "minus");
        counters.push((label, el, plus, minus));
    }

    // Emissions bubble, so one listener on the body sees every counter.
    let d = Rc::clone(&doc);
    doc.listen(
        body,
        "changed",
        Rc::new(move |ev: &Event<Value>| {
            let id = d.attr(ev.target(), "id").unwrap_or_default();
            let value = ev.detail().and_then(|v| v.downcast_ref::<i64>()).copied();
            println!("#{id} changed to {value:?}");
        }),
    );

    let bound = cc.init_all(&body).expect("live root");
    println!("bound {bound} counters");
    println!("binding again is a no-op: {}", cc.init_all(&body).expect("live root"));

    let (_, _, left_plus, _) = counters[0];
    let (_, _, _, right_minus) = counters[1];
    doc.dispatch(left_plus, "click", None);
    doc.dispatch(left_plus, "click", None);
    doc.dispatch(right_minus, "click", None);

    for (label, el, _, _) in &counters {
        let counter = cc.get::<Counter>(el, "counter").expect("bound");
        println!("{label}: {}", counter.count.get());
    }
}
