// Copyright 2025 the Class Component Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core document implementation: structure, classes, selectors, listeners and dispatch.

use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::selector::{Selector, Subject};
use crate::types::{ElementId, Event, EventFlags, Listener, Task};

/// An in-memory element tree.
///
/// All operations take `&self`: listeners run while the document is shared and are free
/// to call back into it (add classes, register listeners, dispatch nested events).
/// No internal borrow is held while a listener runs.
///
/// `D` is the payload type carried by [`Event::detail`].
pub struct Document<D = ()> {
    slots: RefCell<Slots<D>>,
    tasks: RefCell<Vec<Task>>,
}

impl<D> core::fmt::Debug for Document<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let slots = self.slots.borrow();
        let total = slots.nodes.len();
        let alive = slots.nodes.iter().filter(|n| n.is_some()).count();
        f.debug_struct("Document")
            .field("elements_total", &total)
            .field("elements_alive", &alive)
            .field("free_list", &slots.free_list.len())
            .field("pending_tasks", &self.tasks.borrow().len())
            .finish_non_exhaustive()
    }
}

impl<D> Default for Document<D> {
    fn default() -> Self {
        Self::new()
    }
}

struct Slots<D> {
    nodes: Vec<Option<Node<D>>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
}

struct Node<D> {
    generation: u32,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    tag: String,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
    listeners: Vec<(String, Listener<D>)>,
}

impl<D> Node<D> {
    fn new(generation: u32, tag: &str) -> Self {
        Self {
            generation,
            parent: None,
            children: Vec::new(),
            tag: tag.to_ascii_lowercase(),
            classes: Vec::new(),
            attrs: Vec::new(),
            listeners: Vec::new(),
        }
    }

    fn id_attr(&self) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == "id")
            .map(|(_, v)| v.as_str())
    }

    fn subject(&self) -> Subject<'_> {
        Subject {
            tag: &self.tag,
            id: self.id_attr(),
            classes: &self.classes,
        }
    }
}

impl<D> Slots<D> {
    fn node(&self, id: ElementId) -> Option<&Node<D>> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.generation == id.generation()).then_some(n)
    }

    /// Subject and parent of a live element, for selector matching.
    fn lookup(&self, id: ElementId) -> Option<(Subject<'_>, Option<ElementId>)> {
        self.node(id).map(|n| (n.subject(), n.parent))
    }

    fn node_mut(&mut self, id: ElementId) -> Option<&mut Node<D>> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        (n.generation == id.generation()).then_some(n)
    }

    fn unlink(&mut self, id: ElementId) {
        let parent = self.node_mut(id).and_then(|n| n.parent.take());
        if let Some(p) = parent.and_then(|p| self.node_mut(p)) {
            p.children.retain(|c| *c != id);
        }
    }

    fn collect_descendants(&self, root: ElementId, out: &mut Vec<ElementId>) {
        let Some(node) = self.node(root) else {
            return;
        };
        for &child in &node.children {
            out.push(child);
            self.collect_descendants(child, out);
        }
    }
}

impl<D> Document<D> {
    /// Create an empty document.
    pub fn new() -> Self {
        Self {
            slots: RefCell::new(Slots {
                nodes: Vec::new(),
                generations: Vec::new(),
                free_list: Vec::new(),
            }),
            tasks: RefCell::new(Vec::new()),
        }
    }

    /// Create an element with the given tag, appended to `parent` (or detached if `None`).
    pub fn create_element(&self, parent: Option<ElementId>, tag: &str) -> ElementId {
        let mut slots = self.slots.borrow_mut();
        let (idx, generation) = if let Some(idx) = slots.free_list.pop() {
            let generation = slots.generations[idx].saturating_add(1);
            slots.generations[idx] = generation;
            slots.nodes[idx] = Some(Node::new(generation, tag));
            (idx, generation)
        } else {
            slots.nodes.push(Some(Node::new(1, tag)));
            slots.generations.push(1);
            (slots.nodes.len() - 1, 1)
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "ElementId uses 32-bit indices by design."
        )]
        let id = ElementId::new(idx as u32, generation);
        drop(slots);
        if let Some(p) = parent {
            self.append(p, id);
        }
        id
    }

    /// Convenience: create an element and give it a whitespace separated class list.
    pub fn create_with_classes(
        &self,
        parent: Option<ElementId>,
        tag: &str,
        classes: &str,
    ) -> ElementId {
        let id = self.create_element(parent, tag);
        for class in classes.split_whitespace() {
            self.add_class(id, class);
        }
        id
    }

    /// Move `child` under `parent`, detaching it from its current parent first.
    ///
    /// Ignored if either id is stale or if `parent` lies inside `child`'s subtree.
    pub fn append(&self, parent: ElementId, child: ElementId) {
        if parent == child || self.path_to_root(parent).contains(&child) {
            return;
        }
        let mut slots = self.slots.borrow_mut();
        if slots.node(parent).is_none() || slots.node(child).is_none() {
            return;
        }
        slots.unlink(child);
        if let Some(p) = slots.node_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = slots.node_mut(child) {
            c.parent = Some(parent);
        }
    }

    /// Remove an element and its subtree. Ids into the subtree become stale.
    pub fn remove(&self, id: ElementId) {
        let mut slots = self.slots.borrow_mut();
        if slots.node(id).is_none() {
            return;
        }
        slots.unlink(id);
        let mut doomed = Vec::from([id]);
        slots.collect_descendants(id, &mut doomed);
        let mut removed = Vec::with_capacity(doomed.len());
        for d in doomed {
            removed.push(slots.nodes[d.idx()].take());
            slots.free_list.push(d.idx());
        }
        // Listeners may own state whose drop reaches back into the document.
        drop(slots);
        drop(removed);
    }

    /// Returns true if `id` refers to a live element.
    pub fn is_alive(&self, id: ElementId) -> bool {
        self.slots.borrow().node(id).is_some()
    }

    /// Parent of a live element.
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.slots.borrow().node(id)?.parent
    }

    /// Children of a live element, in insertion order.
    pub fn children(&self, id: ElementId) -> Vec<ElementId> {
        self.slots
            .borrow()
            .node(id)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Lowercase tag name of a live element.
    pub fn tag(&self, id: ElementId) -> Option<String> {
        self.slots.borrow().node(id).map(|n| n.tag.clone())
    }

    /// Root→element path (inclusive). Empty for stale ids.
    pub fn path_to_root(&self, id: ElementId) -> Vec<ElementId> {
        let slots = self.slots.borrow();
        let mut out = Vec::new();
        let mut cur = Some(id);
        while let Some(c) = cur {
            let Some(node) = slots.node(c) else {
                break;
            };
            out.push(c);
            cur = node.parent;
        }
        out.reverse();
        out
    }

    /// Add a class if not already present.
    pub fn add_class(&self, id: ElementId, class: &str) {
        if let Some(n) = self.slots.borrow_mut().node_mut(id)
            && !n.classes.iter().any(|c| c == class)
        {
            n.classes.push(class.to_string());
        }
    }

    /// Remove a class if present.
    pub fn remove_class(&self, id: ElementId, class: &str) {
        if let Some(n) = self.slots.borrow_mut().node_mut(id) {
            n.classes.retain(|c| c != class);
        }
    }

    /// Returns true if the element carries `class`.
    pub fn has_class(&self, id: ElementId, class: &str) -> bool {
        self.slots
            .borrow()
            .node(id)
            .is_some_and(|n| n.classes.iter().any(|c| c == class))
    }

    /// Class list of the element, in insertion order.
    pub fn class_names(&self, id: ElementId) -> Vec<String> {
        self.slots
            .borrow()
            .node(id)
            .map(|n| n.classes.clone())
            .unwrap_or_default()
    }

    /// Set (or replace) an attribute.
    pub fn set_attr(&self, id: ElementId, name: &str, value: &str) {
        let mut slots = self.slots.borrow_mut();
        let Some(n) = slots.node_mut(id) else {
            return;
        };
        match n.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => n.attrs.push((name.to_string(), value.to_string())),
        }
    }

    /// Read an attribute.
    pub fn attr(&self, id: ElementId, name: &str) -> Option<String> {
        let slots = self.slots.borrow();
        let n = slots.node(id)?;
        n.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }

    /// Returns true if the element matches `selector`. Unparseable selectors never match.
    pub fn matches(&self, id: ElementId, selector: &str) -> bool {
        Selector::parse(selector).is_some_and(|sel| self.matches_selector(id, &sel))
    }

    /// Returns true if the element matches the pre-parsed `selector`.
    pub fn matches_selector(&self, id: ElementId, selector: &Selector) -> bool {
        let slots = self.slots.borrow();
        selector.matches_in(id, &|id| slots.lookup(id))
    }

    /// Descendants of `root` (excluding `root`) matching `selector`, in document order.
    pub fn query_all(&self, root: ElementId, selector: &str) -> Vec<ElementId> {
        Selector::parse(selector)
            .map(|sel| self.query_selector_all(root, &sel))
            .unwrap_or_default()
    }

    /// Descendants of `root` (excluding `root`) matching the pre-parsed `selector`.
    pub fn query_selector_all(&self, root: ElementId, selector: &Selector) -> Vec<ElementId> {
        let slots = self.slots.borrow();
        let mut all = Vec::new();
        slots.collect_descendants(root, &mut all);
        all.retain(|&id| selector.matches_in(id, &|id| slots.lookup(id)));
        all
    }

    /// Register a listener for `event` on the element.
    pub fn listen(&self, id: ElementId, event: &str, listener: Listener<D>) {
        if let Some(n) = self.slots.borrow_mut().node_mut(id) {
            n.listeners.push((event.to_string(), listener));
        }
    }

    /// Number of listeners registered for `event` on the element.
    pub fn listener_count(&self, id: ElementId, event: &str) -> usize {
        self.slots
            .borrow()
            .node(id)
            .map(|n| n.listeners.iter().filter(|(e, _)| e == event).count())
            .unwrap_or(0)
    }

    /// Dispatch a bubbling event on `target`.
    ///
    /// Returns false if a listener stopped propagation.
    pub fn dispatch(&self, target: ElementId, event: &str, detail: Option<D>) -> bool {
        self.dispatch_with(target, event, detail, EventFlags::BUBBLES)
    }

    /// Dispatch with explicit flags. Without [`EventFlags::BUBBLES`] only `target` is visited.
    ///
    /// Listeners of each element are snapshotted right before they run, so listeners
    /// added during dispatch on elements not yet visited do take part.
    pub fn dispatch_with(
        &self,
        target: ElementId,
        event: &str,
        detail: Option<D>,
        flags: EventFlags,
    ) -> bool {
        if !self.is_alive(target) {
            return true;
        }
        let ev = Event::new(event, target, detail, flags);
        let path = if ev.bubbles() {
            let mut p = self.path_to_root(target);
            p.reverse();
            p
        } else {
            Vec::from([target])
        };
        for node in path {
            let listeners: Vec<Listener<D>> = match self.slots.borrow().node(node) {
                Some(n) => n
                    .listeners
                    .iter()
                    .filter(|(e, _)| e == event)
                    .map(|(_, l)| Rc::clone(l))
                    .collect(),
                None => continue,
            };
            ev.set_current_target(node);
            for l in listeners {
                l(&ev);
            }
            if ev.is_propagation_stopped() {
                return false;
            }
        }
        true
    }

    /// Queue deferred work for the embedder's executor.
    pub fn spawn(&self, task: Task) {
        self.tasks.borrow_mut().push(task);
    }

    /// Take every queued task, leaving the queue empty.
    pub fn take_tasks(&self) -> Vec<Task> {
        core::mem::take(&mut *self.tasks.borrow_mut())
    }
}
