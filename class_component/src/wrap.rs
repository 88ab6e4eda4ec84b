// Copyright 2025 the Class Component Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Emission wrappers: fold emission and framing descriptors into a method.
//!
//! ## Policy
//!
//! | Annotation | Before the call | Success | Failure |
//! |---|---|---|---|
//! | `emit(e)` / `emit(e).first()` | `e` | | |
//! | `emit(e).last()` | | `e` with the value | |
//! | `emit(e).on_error()` | | | `e` with the error |
//! | `trigger(s, e, x)` | `s` | `e` | `x` |
//!
//! "Success" and "failure" are observed once the method settles: synchronously, before the
//! wrapper returns, for ready completions; after the future resolves for pending ones.
//! Failures are always handed back unchanged.
//!
//! Each descriptor is its own layer. The first declared descriptor is the outermost.

use alloc::rc::Rc;

use crate::class::{Coelement, Method};
use crate::descriptor::{Annotation, EmitPolicy, Framing};
use crate::host::Host;
use crate::value::{Completion, MethodResult, Value};

/// Wrap `inner` according to `annotation`. Listening annotations leave it untouched.
pub(crate) fn wrap<H: Host, C: 'static>(inner: Method<H, C>, annotation: &Annotation) -> Method<H, C> {
    match annotation {
        Annotation::Listen { .. } => inner,
        Annotation::Emit {
            event,
            on_error: true,
            ..
        } => emit_on_error(inner, event.as_str().into()),
        Annotation::Emit {
            event,
            policy: EmitPolicy::Last,
            ..
        } => emit_last(inner, event.as_str().into()),
        Annotation::Emit { event, .. } => emit_first(inner, event.as_str().into()),
        Annotation::Trigger(framing) => frame(inner, framing),
    }
}

fn emit_first<H: Host, C: 'static>(inner: Method<H, C>, event: Rc<str>) -> Method<H, C> {
    Rc::new(move |this: &Coelement<H, C>, arg: Value| {
        this.emit(&event, None);
        inner(this, arg)
    })
}

fn emit_last<H: Host, C: 'static>(inner: Method<H, C>, event: Rc<str>) -> Method<H, C> {
    Rc::new(move |this: &Coelement<H, C>, arg: Value| {
        let event = Rc::clone(&event);
        observe(this, inner(this, arg), move |this, result| {
            if let Ok(value) = result {
                this.emit(&event, Some(value.clone()));
            }
        })
    })
}

fn emit_on_error<H: Host, C: 'static>(inner: Method<H, C>, event: Rc<str>) -> Method<H, C> {
    Rc::new(move |this: &Coelement<H, C>, arg: Value| {
        let event = Rc::clone(&event);
        observe(this, inner(this, arg), move |this, result| {
            if let Err(error) = result {
                this.emit(&event, Some(Value::new(error.clone())));
            }
        })
    })
}

fn frame<H: Host, C: 'static>(inner: Method<H, C>, framing: &Framing) -> Method<H, C> {
    let framing = Rc::new(framing.clone());
    Rc::new(move |this: &Coelement<H, C>, arg: Value| {
        if let Some(start) = &framing.start {
            this.emit(start, None);
        }
        let completion = inner(this, arg);
        if framing.end.is_none() && framing.error.is_none() {
            return completion;
        }
        let framing = Rc::clone(&framing);
        observe(this, completion, move |this, result| {
            let terminal = match result {
                Ok(_) => &framing.end,
                Err(_) => &framing.error,
            };
            if let Some(event) = terminal {
                this.emit(event, None);
            }
        })
    })
}

/// Run `observer` once `completion` settles, then pass the result on untouched.
///
/// Ready completions are observed before this returns; pending ones when the returned
/// future resolves.
fn observe<H, C, F>(this: &Coelement<H, C>, completion: Completion, observer: F) -> Completion
where
    H: Host,
    C: 'static,
    F: FnOnce(&Coelement<H, C>, &MethodResult) + 'static,
{
    match completion {
        Completion::Ready(result) => {
            observer(this, &result);
            Completion::Ready(result)
        }
        Completion::Pending(fut) => {
            let this = this.clone();
            Completion::pending(async move {
                let result = fut.await;
                observer(&this, &result);
                result
            })
        }
    }
}
