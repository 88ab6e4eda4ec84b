// Copyright 2025 the Class Component Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The host abstraction: everything the engine needs from a DOM-like environment.
//!
//! ## Overview
//!
//! The engine never touches elements directly. It asks a [`Host`] to check and add
//! marker classes, match selectors, register listeners, emit events and queue deferred
//! work. Any tree that can answer these questions can carry class components; the
//! [`adapters`](crate::adapters) module provides an implementation for
//! `class_component_tree`.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;

use futures_util::future::LocalBoxFuture;

use crate::value::Value;

/// An event as seen by engine listeners.
///
/// For delegated listeners (descriptors with a selector), `current_target` is the matched
/// descendant and `delegate_target` is the element the component is bound to.
#[derive(Clone, Debug)]
pub struct Event<E> {
    /// Event name.
    pub name: String,
    /// Element the event was dispatched on.
    pub target: E,
    /// Element the listener is considered to run on.
    pub current_target: E,
    /// Component element for delegated listeners.
    pub delegate_target: Option<E>,
    /// Optional payload.
    pub detail: Option<Value>,
}

/// Listener registered with [`Host::listen`].
pub type Listener<E> = Rc<dyn Fn(&Event<E>)>;

/// A DOM-like environment hosting class components.
///
/// All methods take `&self`. Listeners run while the host is shared and may call back
/// into it, so implementations must not hold internal borrows while invoking them.
pub trait Host: 'static {
    /// Element handle. Compared by identity; never derived from element content.
    type Element: Clone + Ord + core::fmt::Debug + 'static;

    /// Returns true if the handle refers to a live element.
    fn contains(&self, element: &Self::Element) -> bool;

    /// Parent of the element, or `None` for roots and detached elements.
    fn parent_of(&self, element: &Self::Element) -> Option<Self::Element>;

    /// Current class list of the element.
    fn class_names(&self, element: &Self::Element) -> Vec<String>;

    /// Returns true if the element carries `class`.
    fn has_class(&self, element: &Self::Element, class: &str) -> bool;

    /// Add `class` to the element. Adding a present class is a no-op.
    fn add_class(&self, element: &Self::Element, class: &str);

    /// A parsed selector.
    type Selector: Clone + core::fmt::Debug + 'static;

    /// Parse `selector`, or return `None` if this host cannot match it.
    fn parse_selector(&self, selector: &str) -> Option<Self::Selector>;

    /// Returns true if the element matches `selector`.
    fn matches(&self, element: &Self::Element, selector: &Self::Selector) -> bool;

    /// Descendants of `root` (excluding `root`) that match `selector`, in document order.
    fn query_descendants(&self, root: &Self::Element, selector: &Self::Selector) -> Vec<Self::Element>;

    /// Register a listener for `event` on the element.
    fn listen(&self, element: &Self::Element, event: &str, listener: Listener<Self::Element>);

    /// Dispatch `event` on the element. Events bubble towards the root.
    fn emit(&self, element: &Self::Element, event: &str, detail: Option<Value>);

    /// Queue deferred work on the host's executor.
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);
}

/// Elements strictly between `root` (excluded) and `target` (included), inner-most first.
///
/// Empty when `target` is `root` or does not lie under `root`.
pub(crate) fn delegation_path<H: Host>(
    host: &H,
    target: &H::Element,
    root: &H::Element,
) -> Vec<H::Element> {
    let mut out = Vec::new();
    let mut cur = target.clone();
    // Ancestry is acyclic; the walk ends at `root` or at a detached top.
    loop {
        if cur == *root {
            return out;
        }
        let parent = host.parent_of(&cur);
        out.push(cur);
        match parent {
            Some(p) => cur = p,
            None => return Vec::new(),
        }
    }
}
