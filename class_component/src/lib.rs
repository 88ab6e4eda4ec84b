// Copyright 2025 the Class Component Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Class Component: declarative event bindings, emissions and lifecycle hooks for
//! components bound to elements by class name.
//!
//! ## Overview
//!
//! A component is a [`Class`]: a constructor plus keyed methods, each of which may carry
//! [`Descriptor`]s built from annotations:
//!
//! - [`event`] and [`on`] call a method when an event reaches the element, directly or
//!   delegated to descendants matching a selector.
//! - [`emit`] makes a method emit an event before it runs ([`Emit::first`]), after it
//!   succeeds with its value ([`Emit::last`]), or when it fails ([`Emit::on_error`]).
//! - [`trigger`] frames a method with start, end and error events.
//!
//! Classes are registered by name on a [`ClassComponents`] facade. Binding an element
//! constructs one coelement per registered component among the element's classes, exactly
//! once: the element is marked with `<name>-initialized` before construction, and any later
//! binding of a marked element is a no-op. [`ClassComponents::get`] returns the bound
//! [`Coelement`].
//!
//! ## Completions
//!
//! Methods return a [`Completion`]. Ready completions fire their terminal emissions before
//! the call returns; pending ones fire them when the future settles. Failures are emitted
//! exactly once and handed back to the caller unchanged. Methods invoked by listeners have
//! no caller: their pending completions go to [`Host::spawn`] and their failures are logged.
//!
//! ## Hosts
//!
//! The engine reaches elements only through the [`Host`] trait. With the default
//! `tree_adapter` feature, `class_component_tree::Document<Value>` is a host.
//!
//! ## Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use class_component::{Class, ClassComponents, Completion, Value, emit, event};
//! use class_component_tree::{Document, Event};
//!
//! type Doc = Document<Value>;
//!
//! #[derive(Default)]
//! struct Counter {
//!     count: Cell<u32>,
//! }
//!
//! let doc = Rc::new(Doc::new());
//! let cc = ClassComponents::new(Rc::clone(&doc));
//! cc.register(
//!     "counter",
//!     Class::<Doc, Counter>::builder_default()
//!         .method("increment", |this, _| {
//!             this.count.set(this.count.get() + 1);
//!             Completion::value(this.count.get())
//!         })
//!         .annotate("increment", event("click", Some(".plus")))
//!         .annotate("increment", emit("counted").last())
//!         .build()
//!         .unwrap(),
//! );
//!
//! let root = doc.create_with_classes(None, "div", "counter");
//! let plus = doc.create_with_classes(Some(root), "button", "plus");
//! cc.bind(&root).unwrap();
//!
//! let last = Rc::new(Cell::new(0));
//! let l = Rc::clone(&last);
//! doc.listen(root, "counted", Rc::new(move |ev: &Event<Value>| {
//!     l.set(*ev.detail().and_then(|d| d.downcast_ref::<u32>()).unwrap());
//! }));
//!
//! doc.dispatch(plus, "click", None);
//! doc.dispatch(plus, "click", None);
//! assert_eq!(last.get(), 2);
//! assert!(doc.has_class(root, "counter-initialized"));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod adapters;

mod class;
mod configuration;
mod descriptor;
mod error;
mod host;
mod registry;
mod value;
mod wrap;

pub use class::{Class, ClassBuilder, Coelement, Constructor, InitHook, Method};
pub use descriptor::{
    Annotation, Descriptor, DescriptorKind, Emit, EmitPolicy, Framing, On, emit, event, on,
    trigger,
};
pub use error::{DefinitionError, Error};
pub use host::{Event, Host, Listener};
pub use registry::{ClassComponents, Settings};
pub use value::{Completion, MethodError, MethodResult, Value};
