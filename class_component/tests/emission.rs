// Copyright 2025 the Class Component Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Emission and framing timing against the tree host.
//!
//! Deferred methods wait on a oneshot channel, so "after a delay" is whenever the test
//! sends. Every recorded emission snapshots a flag that the method sets when it settles.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use class_component::{
    Annotation, Class, ClassComponents, Coelement, Completion, MethodError, MethodResult, Value,
    emit, on, trigger,
};
use class_component_tree::{Document, ElementId, Event};
use futures::channel::oneshot;
use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;

type Doc = Document<Value>;
type Outcome = Result<i32, String>;

#[derive(Clone, Debug)]
struct Seen {
    name: String,
    detail: Option<Value>,
    settled: bool,
}

struct Fixture {
    doc: Rc<Doc>,
    cc: ClassComponents<Doc>,
    el: ElementId,
    log: Rc<RefCell<Vec<Seen>>>,
}

impl Fixture {
    fn new<F>(method: F, annotations: Vec<Annotation>, settled: &Rc<Cell<bool>>) -> Self
    where
        F: Fn(&Coelement<Doc, ()>, Value) -> Completion + 'static,
    {
        let doc = Rc::new(Doc::new());
        let cc = ClassComponents::new(Rc::clone(&doc));
        let mut builder = Class::<Doc, ()>::builder_default().method("run", method);
        for annotation in annotations {
            builder = builder.annotate("run", annotation);
        }
        cc.register("widget", builder.build().unwrap());
        let el = doc.create_with_classes(None, "div", "widget");
        cc.bind(&el).unwrap();

        let log: Rc<RefCell<Vec<Seen>>> = Rc::default();
        for name in ["before", "done", "failed", "start", "end", "error"] {
            let log = Rc::clone(&log);
            let settled = Rc::clone(settled);
            doc.listen(
                el,
                name,
                Rc::new(move |ev: &Event<Value>| {
                    log.borrow_mut().push(Seen {
                        name: ev.name().to_string(),
                        detail: ev.detail().cloned(),
                        settled: settled.get(),
                    });
                }),
            );
        }
        Self { doc, cc, el, log }
    }

    fn run(&self) -> Completion {
        self.cc
            .call(&self.el, "widget", "run", Value::unit())
            .unwrap()
    }

    fn names(&self) -> Vec<String> {
        self.log.borrow().iter().map(|s| s.name.clone()).collect()
    }

    fn seen(&self, name: &str) -> Vec<Seen> {
        self.log
            .borrow()
            .iter()
            .filter(|s| s.name == name)
            .cloned()
            .collect()
    }
}

/// A method that settles with whatever is sent on the returned channel.
fn deferred(
    settled: &Rc<Cell<bool>>,
) -> (
    impl Fn(&Coelement<Doc, ()>, Value) -> Completion + 'static,
    oneshot::Sender<Outcome>,
) {
    let (tx, rx) = oneshot::channel::<Outcome>();
    let slot = RefCell::new(Some(rx));
    let settled = Rc::clone(settled);
    let method = move |_: &Coelement<Doc, ()>, _: Value| {
        let rx = slot.borrow_mut().take();
        let settled = Rc::clone(&settled);
        Completion::pending(settle_with(rx, settled))
    };
    (method, tx)
}

async fn settle_with(
    rx: Option<oneshot::Receiver<Outcome>>,
    settled: Rc<Cell<bool>>,
) -> MethodResult {
    let rx = rx.ok_or_else(|| MethodError::new("already running"))?;
    let outcome = rx.await.map_err(|_| MethodError::new("canceled"))?;
    settled.set(true);
    outcome.map(Value::new).map_err(MethodError::new)
}

/// Move the host's queued tasks onto `pool`.
fn pump(pool: &LocalPool, doc: &Doc) {
    for task in doc.take_tasks() {
        pool.spawner().spawn_local(task).unwrap();
    }
}

/// Spawn the settlement of `completion` next to the host's queued tasks and run until
/// nothing more can happen.
fn drive(
    pool: &mut LocalPool,
    doc: &Doc,
    completion: Completion,
) -> Rc<RefCell<Option<MethodResult>>> {
    pump(pool, doc);
    let out: Rc<RefCell<Option<MethodResult>>> = Rc::default();
    let sink = Rc::clone(&out);
    pool.spawner()
        .spawn_local(async move {
            *sink.borrow_mut() = Some(completion.settle().await);
        })
        .unwrap();
    pool.run_until_stalled();
    out
}

fn payload_i32(seen: &Seen) -> Option<i32> {
    seen.detail.as_ref()?.downcast_ref::<i32>().copied()
}

fn payload_error(seen: &Seen) -> Option<String> {
    let error = seen.detail.as_ref()?.downcast_ref::<MethodError>()?;
    Some(error.message().to_string())
}

#[test]
fn first_fires_before_the_body_changes_state() {
    let changed = Rc::new(Cell::new(false));
    let body_flag = Rc::clone(&changed);
    let fx = Fixture::new(
        move |_, _| {
            body_flag.set(true);
            Completion::unit()
        },
        vec![emit("before").first().into()],
        &changed,
    );
    assert!(!fx.run().is_pending());
    let before = fx.seen("before");
    assert_eq!(before.len(), 1);
    assert!(!before[0].settled, "listener must observe the state before the body ran");
    assert!(before[0].detail.is_none());
    assert!(changed.get());
}

#[test]
fn last_emits_sync_value_before_returning() {
    let flag = Rc::new(Cell::new(false));
    let fx = Fixture::new(
        |_, _| Completion::value(321_i32),
        vec![emit("done").last().into()],
        &flag,
    );
    let completion = fx.run();
    assert_eq!(fx.names(), ["done"]);
    assert_eq!(payload_i32(&fx.seen("done")[0]), Some(321));
    let value = completion.ready().unwrap().unwrap();
    assert_eq!(value.downcast_ref::<i32>(), Some(&321));
}

#[test]
fn last_waits_for_async_resolution() {
    let settled = Rc::new(Cell::new(false));
    let (method, tx) = deferred(&settled);
    let fx = Fixture::new(method, vec![emit("done").last().into()], &settled);
    let mut pool = LocalPool::new();

    let result = drive(&mut pool, &fx.doc, fx.run());
    assert!(fx.names().is_empty());
    assert!(result.borrow().is_none());

    tx.send(Ok(123)).unwrap();
    pool.run_until_stalled();
    let done = fx.seen("done");
    assert_eq!(done.len(), 1);
    assert!(done[0].settled);
    assert_eq!(payload_i32(&done[0]), Some(123));
    let value = result.borrow_mut().take().unwrap().unwrap();
    assert_eq!(value.downcast_ref::<i32>(), Some(&123));
}

#[test]
fn dropped_pending_call_still_emits_once_settled() {
    let settled = Rc::new(Cell::new(false));
    let (method, tx) = deferred(&settled);
    let fx = Fixture::new(
        method,
        vec![emit("done").last().into(), trigger(None, Some("end"), None)],
        &settled,
    );
    let mut pool = LocalPool::new();

    drop(fx.run());
    pump(&pool, &fx.doc);
    pool.run_until_stalled();
    assert!(fx.names().is_empty());

    tx.send(Ok(123)).unwrap();
    pool.run_until_stalled();
    assert_eq!(fx.names(), ["end", "done"]);
    let done = fx.seen("done");
    assert!(done[0].settled);
    assert_eq!(payload_i32(&done[0]), Some(123));
}

#[test]
fn last_stays_silent_on_failure() {
    let flag = Rc::new(Cell::new(false));
    let fx = Fixture::new(
        |_, _| Completion::err("nope"),
        vec![emit("done").last().into()],
        &flag,
    );
    assert!(fx.run().ready().unwrap().is_err());
    assert!(fx.names().is_empty());
}

#[test]
fn on_error_emits_sync_failure_and_rethrows() {
    let flag = Rc::new(Cell::new(false));
    let fx = Fixture::new(
        |_, _| Completion::err(MethodError::new("abc")),
        vec![emit("failed").on_error().into()],
        &flag,
    );
    let err = fx.run().ready().unwrap().unwrap_err();
    assert_eq!(err.message(), "abc");
    let failed = fx.seen("failed");
    assert_eq!(failed.len(), 1);
    assert_eq!(payload_error(&failed[0]).as_deref(), Some("abc"));
}

#[test]
fn on_error_emits_async_rejection_and_propagates() {
    let settled = Rc::new(Cell::new(false));
    let (method, tx) = deferred(&settled);
    let fx = Fixture::new(method, vec![emit("failed").on_error().into()], &settled);
    let mut pool = LocalPool::new();

    let result = drive(&mut pool, &fx.doc, fx.run());
    assert!(fx.names().is_empty());

    tx.send(Err("abc".into())).unwrap();
    pool.run_until_stalled();
    let failed = fx.seen("failed");
    assert_eq!(failed.len(), 1);
    assert!(failed[0].settled);
    assert_eq!(payload_error(&failed[0]).as_deref(), Some("abc"));
    let err = result.borrow_mut().take().unwrap().unwrap_err();
    assert_eq!(err.message(), "abc");
}

#[test]
fn on_error_stays_silent_on_success() {
    let flag = Rc::new(Cell::new(false));
    let fx = Fixture::new(
        |_, _| Completion::unit(),
        vec![emit("failed").on_error().into()],
        &flag,
    );
    assert!(fx.run().ready().unwrap().is_ok());
    assert!(fx.names().is_empty());
}

#[test]
fn trigger_start_only_fires_before_and_nothing_after() {
    let settled = Rc::new(Cell::new(false));
    let (method, tx) = deferred(&settled);
    let fx = Fixture::new(method, vec![trigger(Some("start"), None, None)], &settled);
    let mut pool = LocalPool::new();

    let result = drive(&mut pool, &fx.doc, fx.run());
    assert_eq!(fx.names(), ["start"]);
    assert!(!fx.seen("start")[0].settled);

    tx.send(Ok(1)).unwrap();
    pool.run_until_stalled();
    assert!(result.borrow().as_ref().unwrap().is_ok());
    assert_eq!(fx.names(), ["start"]);
}

#[test]
fn trigger_end_only_waits_for_success() {
    let settled = Rc::new(Cell::new(false));
    let (method, tx) = deferred(&settled);
    let fx = Fixture::new(method, vec![trigger(None, Some("end"), None)], &settled);
    let mut pool = LocalPool::new();

    let _result = drive(&mut pool, &fx.doc, fx.run());
    assert!(fx.names().is_empty(), "end must not fire before settlement");

    tx.send(Ok(5)).unwrap();
    pool.run_until_stalled();
    let end = fx.seen("end");
    assert_eq!(end.len(), 1);
    assert!(end[0].settled);
    assert!(end[0].detail.is_none());
}

#[test]
fn trigger_end_only_fires_synchronously_for_sync_success() {
    let flag = Rc::new(Cell::new(false));
    let fx = Fixture::new(
        |_, _| Completion::unit(),
        vec![trigger(None, Some("end"), None)],
        &flag,
    );
    assert!(!fx.run().is_pending());
    assert_eq!(fx.names(), ["end"]);
}

#[test]
fn trigger_error_only_waits_for_failure() {
    let settled = Rc::new(Cell::new(false));
    let (method, tx) = deferred(&settled);
    let fx = Fixture::new(method, vec![trigger(None, None, Some("error"))], &settled);
    let mut pool = LocalPool::new();

    let result = drive(&mut pool, &fx.doc, fx.run());
    assert!(fx.names().is_empty(), "error must not fire before the failure is observed");

    tx.send(Err("late".into())).unwrap();
    pool.run_until_stalled();
    let error = fx.seen("error");
    assert_eq!(error.len(), 1);
    assert!(error[0].settled);
    assert!(result.borrow().as_ref().unwrap().is_err());
}

#[test]
fn trigger_error_only_is_silent_on_success() {
    let settled = Rc::new(Cell::new(false));
    let (method, tx) = deferred(&settled);
    let fx = Fixture::new(method, vec![trigger(None, None, Some("error"))], &settled);
    let mut pool = LocalPool::new();

    let _result = drive(&mut pool, &fx.doc, fx.run());
    tx.send(Ok(0)).unwrap();
    pool.run_until_stalled();
    assert!(settled.get());
    assert!(fx.names().is_empty());
}

#[test]
fn listener_pending_completion_runs_on_the_host_queue() {
    let settled = Rc::new(Cell::new(false));
    let (method, tx) = deferred(&settled);
    let fx = Fixture::new(
        method,
        vec![on("go").into(), emit("done").last().into()],
        &settled,
    );
    let mut pool = LocalPool::new();

    fx.doc.dispatch(fx.el, "go", None);
    assert!(fx.names().is_empty());
    let tasks = fx.doc.take_tasks();
    assert_eq!(tasks.len(), 2, "the method itself and the failure logger");
    for task in tasks {
        pool.spawner().spawn_local(task).unwrap();
    }
    pool.run_until_stalled();
    assert!(fx.names().is_empty());

    tx.send(Ok(42)).unwrap();
    pool.run_until_stalled();
    let done = fx.seen("done");
    assert_eq!(done.len(), 1);
    assert!(done[0].settled);
    assert_eq!(payload_i32(&done[0]), Some(42));
}

#[test]
fn listener_failure_does_not_break_dispatch() {
    let flag = Rc::new(Cell::new(false));
    let fx = Fixture::new(
        |_, _| Completion::err("listener boom"),
        vec![on("go").into(), emit("failed").on_error().into()],
        &flag,
    );
    assert!(fx.doc.dispatch(fx.el, "go", None));
    assert_eq!(fx.names(), ["failed"]);
    assert!(fx.doc.take_tasks().is_empty());
}
