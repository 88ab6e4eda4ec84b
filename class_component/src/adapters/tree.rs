// Copyright 2025 the Class Component Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`Host`] for `class_component_tree`.
//!
//! ## Feature
//!
//! Enable with `tree_adapter` (on by default).
//!
//! ## Notes
//!
//! Event details travel as [`Value`]s, so the host is `Document<Value>`. Tree events are
//! converted into engine [`Event`]s at the listener boundary; `current_target` is the
//! element the listener was registered on.
//! Spawned tasks land in the document's task queue and run when the embedder drains it
//! with [`Document::take_tasks`].

use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use class_component_tree::{Document, ElementId, Selector};
use futures_util::future::LocalBoxFuture;

use crate::host::{Event, Host, Listener};
use crate::value::Value;

impl Host for Document<Value> {
    type Element = ElementId;
    type Selector = Selector;

    fn contains(&self, element: &ElementId) -> bool {
        self.is_alive(*element)
    }

    fn parent_of(&self, element: &ElementId) -> Option<ElementId> {
        self.parent(*element)
    }

    fn class_names(&self, element: &ElementId) -> Vec<String> {
        Self::class_names(self, *element)
    }

    fn has_class(&self, element: &ElementId, class: &str) -> bool {
        Self::has_class(self, *element, class)
    }

    fn add_class(&self, element: &ElementId, class: &str) {
        Self::add_class(self, *element, class);
    }

    fn parse_selector(&self, selector: &str) -> Option<Selector> {
        Selector::parse(selector)
    }

    fn matches(&self, element: &ElementId, selector: &Selector) -> bool {
        self.matches_selector(*element, selector)
    }

    fn query_descendants(&self, root: &ElementId, selector: &Selector) -> Vec<ElementId> {
        self.query_selector_all(*root, selector)
    }

    fn listen(&self, element: &ElementId, event: &str, listener: Listener<ElementId>) {
        let registered_on = *element;
        Self::listen(
            self,
            *element,
            event,
            Rc::new(move |ev: &class_component_tree::Event<Value>| {
                listener(&Event {
                    name: ev.name().to_string(),
                    target: ev.target(),
                    current_target: registered_on,
                    delegate_target: None,
                    detail: ev.detail().cloned(),
                });
            }),
        );
    }

    fn emit(&self, element: &ElementId, event: &str, detail: Option<Value>) {
        self.dispatch(*element, event, detail);
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        Self::spawn(self, task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;

    use crate::host::delegation_path;

    type Doc = Document<Value>;

    #[test]
    fn delegation_path_stops_below_root() {
        let doc = Doc::new();
        let root = doc.create_element(None, "section");
        let mid = doc.create_element(Some(root), "div");
        let leaf = doc.create_element(Some(mid), "span");
        assert_eq!(delegation_path(&doc, &leaf, &root), [leaf, mid]);
        assert!(delegation_path(&doc, &root, &root).is_empty());
    }

    #[test]
    fn delegation_path_is_empty_outside_root() {
        let doc = Doc::new();
        let root = doc.create_element(None, "section");
        let other = doc.create_element(None, "aside");
        let inside_other = doc.create_element(Some(other), "span");
        assert!(delegation_path(&doc, &inside_other, &root).is_empty());
    }

    #[test]
    fn listeners_see_converted_events() {
        let doc = Doc::new();
        let parent = doc.create_element(None, "div");
        let child = doc.create_element(Some(parent), "span");
        let seen: Rc<RefCell<Vec<Event<ElementId>>>> = Rc::default();
        let sink = Rc::clone(&seen);
        Host::listen(
            &doc,
            &parent,
            "ping",
            Rc::new(move |ev: &Event<ElementId>| sink.borrow_mut().push(ev.clone())),
        );
        Host::emit(&doc, &child, "ping", Some(Value::new(9_u8)));

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].name, "ping");
        assert_eq!(seen[0].target, child);
        assert_eq!(seen[0].current_target, parent);
        assert!(seen[0].delegate_target.is_none());
        assert_eq!(
            seen[0].detail.as_ref().and_then(|d| d.downcast_ref::<u8>()),
            Some(&9)
        );
    }

    #[test]
    fn selectors_parse_once_and_match_through_the_host() {
        let doc = Doc::new();
        let root = doc.create_element(None, "ul");
        let item = doc.create_with_classes(Some(root), "li", "row");
        let sel = doc.parse_selector("ul > .row").unwrap();
        assert!(Host::matches(&doc, &item, &sel));
        assert_eq!(doc.query_descendants(&root, &sel), [item]);
        assert!(doc.parse_selector("ul + li").is_none());
    }

    #[test]
    fn spawned_tasks_queue_on_the_document() {
        let doc = Doc::new();
        Host::spawn(&doc, alloc::boxed::Box::pin(async {}));
        assert_eq!(doc.take_tasks().len(), 1);
        assert!(doc.take_tasks().is_empty());
    }
}
