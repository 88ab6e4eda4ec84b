// Copyright 2025 the Class Component Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Class Component Tree: a small in-memory element tree to host class components.
//!
//! ## Overview
//!
//! A [`Document`] is an arena of elements addressed by generational [`ElementId`]s.
//! Each element has a tag, an ordered class list, attributes, and per-event listeners.
//! Events dispatched with [`Document::dispatch`] visit the target and then bubble to the
//! root, unless a listener calls [`Event::stop_propagation`].
//!
//! It is the reference host for the `class_component` engine, which reaches it through its
//! `tree_adapter` feature. It is not a DOM: there is no layout, no style, no namespaces, and
//! selectors are limited to tag/id/class compounds with `:not(..)`, joined by descendant
//! and child combinators (see [`Selector`]).
//!
//! ## Re-entrancy
//!
//! Every operation takes `&self` and no internal borrow is held while a listener runs, so
//! listeners can mutate the document and dispatch nested events.
//!
//! ## Deferred work
//!
//! Listeners that need to await something hand a [`Task`] to [`Document::spawn`].
//! The document only queues tasks; the embedder drains them with [`Document::take_tasks`]
//! and runs them on whatever executor it uses.
//!
//! ## Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use class_component_tree::{Document, Event};
//!
//! let doc: Document<u32> = Document::new();
//! let body = doc.create_element(None, "body");
//! let button = doc.create_with_classes(Some(body), "button", "btn primary");
//!
//! let clicks = Rc::new(Cell::new(0));
//! let c = Rc::clone(&clicks);
//! doc.listen(body, "click", Rc::new(move |ev: &Event<u32>| {
//!     assert_eq!(ev.target(), button);
//!     c.set(c.get() + ev.detail().copied().unwrap_or(1));
//! }));
//!
//! doc.dispatch(button, "click", Some(2));
//! assert_eq!(clicks.get(), 2);
//! assert!(doc.matches(button, "button.btn:not(.disabled)"));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod selector;
mod tree;
mod types;

pub use selector::Selector;
pub use tree::Document;
pub use types::{ElementId, Event, EventFlags, Listener, Task};
