// Copyright 2025 the Class Component Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the element tree: element identifiers, events and listeners.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use core::cell::Cell;
use core::future::Future;
use core::pin::Pin;

/// Identifier for an element in a [`Document`](crate::Document).
///
/// A small, copyable handle made of a slot index and a generation counter.
///
/// ## Semantics
///
/// - On creation, a fresh slot is allocated with generation `1`.
/// - On removal, the slot is freed and every `ElementId` pointing at it becomes stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new, distinct id.
///
/// Stale ids never alias a different live element because the generation must match.
/// Use [`Document::is_alive`](crate::Document::is_alive) to check liveness.
///
/// The ordering is only meaningful as a stable key for side tables.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ElementId(pub(crate) u32, pub(crate) u32);

impl ElementId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn generation(self) -> u32 {
        self.1
    }
}

bitflags::bitflags! {
    /// Dispatch flags carried by an [`Event`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct EventFlags: u8 {
        /// The event walks from the target up to the root.
        const BUBBLES = 0b0000_0001;
        /// A listener asked to stop propagation; no further elements are visited.
        const PROPAGATION_STOPPED = 0b0000_0010;
    }
}

impl Default for EventFlags {
    fn default() -> Self {
        Self::BUBBLES
    }
}

/// An event travelling through the tree.
///
/// Created by [`Document::dispatch`](crate::Document::dispatch). The same event value is
/// handed to every listener along the propagation path; only
/// [`current_target`](Self::current_target) changes between steps.
#[derive(Debug)]
pub struct Event<D> {
    name: String,
    target: ElementId,
    current_target: Cell<ElementId>,
    detail: Option<D>,
    flags: Cell<EventFlags>,
}

impl<D> Event<D> {
    pub(crate) fn new(name: &str, target: ElementId, detail: Option<D>, flags: EventFlags) -> Self {
        Self {
            name: name.into(),
            target,
            current_target: Cell::new(target),
            detail,
            flags: Cell::new(flags - EventFlags::PROPAGATION_STOPPED),
        }
    }

    /// Event name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Element the event was dispatched on.
    pub fn target(&self) -> ElementId {
        self.target
    }

    /// Element whose listeners are currently running.
    pub fn current_target(&self) -> ElementId {
        self.current_target.get()
    }

    /// Optional payload.
    pub fn detail(&self) -> Option<&D> {
        self.detail.as_ref()
    }

    /// Whether the event bubbles to ancestors.
    pub fn bubbles(&self) -> bool {
        self.flags.get().contains(EventFlags::BUBBLES)
    }

    /// Stop propagation after the listeners of the current element have run.
    pub fn stop_propagation(&self) {
        self.flags
            .set(self.flags.get() | EventFlags::PROPAGATION_STOPPED);
    }

    /// Returns true once a listener called [`stop_propagation`](Self::stop_propagation).
    pub fn is_propagation_stopped(&self) -> bool {
        self.flags.get().contains(EventFlags::PROPAGATION_STOPPED)
    }

    pub(crate) fn set_current_target(&self, id: ElementId) {
        self.current_target.set(id);
    }
}

/// Listener registered on an element for one event name.
pub type Listener<D> = Rc<dyn Fn(&Event<D>)>;

/// A unit of deferred work handed to the document by listeners.
///
/// The document never polls tasks itself; the embedder drains them with
/// [`Document::take_tasks`](crate::Document::take_tasks) and runs them on its executor.
pub type Task = Pin<Box<dyn Future<Output = ()>>>;
