// Copyright 2025 the Class Component Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Emission timing for ready and pending methods.
//!
//! A loader component frames its `load` method with start, end and error events. The
//! first load completes immediately; the second waits on a channel and only emits its end
//! event once the host queue has run the method task spawned for it.
//!
//! Run:
//! - `cargo run -p class_component_demos --example emission`

use std::cell::RefCell;
use std::rc::Rc;

use class_component::{Class, ClassComponents, Completion, MethodError, Value, emit, on, trigger};
use class_component_tree::{Document, Event};
use futures::channel::oneshot;
use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use tracing_subscriber::EnvFilter;

type Doc = Document<Value>;

#[derive(Default)]
struct Loader {
    pending: RefCell<Option<oneshot::Receiver<String>>>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let doc = Rc::new(Doc::new());
    let cc = ClassComponents::new(Rc::clone(&doc));
    cc.register(
        "loader",
        Class::<Doc, Loader>::builder_default()
            .method("load", |this, _| match this.pending.borrow_mut().take() {
                None => Completion::value(String::from("cached")),
                Some(rx) => Completion::pending(async move {
                    rx.await
                        .map(Value::new)
                        .map_err(|_| MethodError::new("loader dropped"))
                }),
            })
            .annotate("load", on("reload"))
            .annotate("load", trigger(Some("loading"), Some("loaded"), Some("load-failed")))
            .annotate("load", emit("content").last())
            .build()
            .expect("valid class"),
    );

    let el = doc.create_with_classes(None, "section", "loader");
    for name in ["loading", "loaded", "load-failed", "content"] {
        doc.listen(
            el,
            name,
            Rc::new(|ev: &Event<Value>| {
                let detail = ev.detail().and_then(|d| d.downcast_ref::<String>());
                println!("  <- {} {detail:?}", ev.name());
            }),
        );
    }
    let loader = cc.init::<Loader>(&el, "loader").expect("bound");

    println!("ready load:");
    doc.dispatch(el, "reload", None);

    println!("pending load:");
    let (tx, rx) = oneshot::channel();
    *loader.pending.borrow_mut() = Some(rx);
    doc.dispatch(el, "reload", None);

    let mut pool = LocalPool::new();
    for task in doc.take_tasks() {
        pool.spawner().spawn_local(task).expect("spawn");
    }
    pool.run_until_stalled();
    println!("  (still pending)");

    tx.send(String::from("fresh")).expect("receiver alive");
    pool.run_until_stalled();

    println!("pending load, abandoned:");
    let (tx, rx) = oneshot::channel::<String>();
    *loader.pending.borrow_mut() = Some(rx);
    doc.dispatch(el, "reload", None);
    for task in doc.take_tasks() {
        pool.spawner().spawn_local(task).expect("spawn");
    }
    drop(tx);
    pool.run_until_stalled();
}
