// Copyright 2025 the Class Component Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Component configuration: the per-class initialization state machine.
//!
//! An element is either unbound or bound for a given component. Binding marks the element
//! with the component's initialized marker class before anything else happens, then
//! constructs the coelement, binds its listening descriptors and stores it in a side table
//! keyed by element and component name. Once marked, further initialization is a no-op.
//!
//! A failed construction is not rolled back: the marker stays, nothing is stored, and
//! retrieval keeps failing with [`Error::MissingCoelement`].

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;
use core::cell::RefCell;

use tracing::debug;

use crate::class::{Class, Coelement};
use crate::error::Error;
use crate::host::Host;
use crate::value::{Completion, Value};

/// A bound coelement with its component type erased.
pub(crate) trait ErasedCoelement {
    fn as_any(&self) -> &dyn Any;

    fn call(&self, method: &str, arg: Value) -> Result<Completion, Error>;
}

impl<H: Host, C: 'static> ErasedCoelement for Coelement<H, C> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn call(&self, method: &str, arg: Value) -> Result<Completion, Error> {
        Self::call(self, method, arg)
    }
}

/// Side table of bound coelements, keyed by element and component name.
pub(crate) struct CoelementStore<H: Host> {
    entries: RefCell<BTreeMap<(H::Element, String), Rc<dyn ErasedCoelement>>>,
}

impl<H: Host> Default for CoelementStore<H> {
    fn default() -> Self {
        Self {
            entries: RefCell::new(BTreeMap::new()),
        }
    }
}

impl<H: Host> core::fmt::Debug for CoelementStore<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CoelementStore")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl<H: Host> CoelementStore<H> {
    pub(crate) fn insert(&self, element: H::Element, name: &str, coelement: Rc<dyn ErasedCoelement>) {
        self.entries
            .borrow_mut()
            .insert((element, name.into()), coelement);
    }

    pub(crate) fn get(&self, element: &H::Element, name: &str) -> Option<Rc<dyn ErasedCoelement>> {
        self.entries
            .borrow()
            .get(&(element.clone(), name.into()))
            .cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Drop entries whose element `host` no longer contains. Returns how many were dropped.
    pub(crate) fn prune(&self, host: &H) -> usize {
        let removed: Vec<_> = {
            let mut entries = self.entries.borrow_mut();
            let dead: Vec<_> = entries
                .keys()
                .filter(|(element, _)| !host.contains(element))
                .cloned()
                .collect();
            dead.iter().filter_map(|key| entries.remove(key)).collect()
        };
        // Dropped outside the borrow: a coelement's drop may re-enter the store.
        removed.len()
    }
}

/// Registry entry for one component name, with the component type erased.
pub(crate) trait Configure<H: Host> {
    /// Class name marking elements bound for this component.
    fn marker(&self) -> &str;

    /// Bind `element`. Returns `Ok(false)` if it was already bound.
    fn init_element(
        &self,
        host: &Rc<H>,
        element: &H::Element,
        store: &CoelementStore<H>,
    ) -> Result<bool, Error>;
}

/// Configuration of one registered class under one component name.
pub(crate) struct Configuration<H: Host, C> {
    name: Rc<str>,
    marker: String,
    class: Rc<Class<H, C>>,
}

impl<H: Host, C> core::fmt::Debug for Configuration<H, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Configuration")
            .field("name", &self.name)
            .field("marker", &self.marker)
            .field("class", &self.class)
            .finish()
    }
}

impl<H: Host, C: 'static> Configuration<H, C> {
    pub(crate) fn new(name: &str, marker_suffix: &str, class: Rc<Class<H, C>>) -> Self {
        let mut marker = String::from(name);
        marker.push_str(marker_suffix);
        Self {
            name: name.into(),
            marker,
            class,
        }
    }
}

impl<H: Host, C: 'static> Configure<H> for Configuration<H, C> {
    fn marker(&self) -> &str {
        &self.marker
    }

    fn init_element(
        &self,
        host: &Rc<H>,
        element: &H::Element,
        store: &CoelementStore<H>,
    ) -> Result<bool, Error> {
        if host.has_class(element, &self.marker) {
            return Ok(false);
        }
        // Marked before construction so re-entrant initialization stops above.
        host.add_class(element, &self.marker);
        debug!(component = &*self.name, ?element, "initializing element");

        let construction = |source| Error::Construction {
            name: String::from(&*self.name),
            source,
        };
        let instance = (self.class.constructor)(host, element).map_err(construction)?;
        if let Some(hook) = &self.class.init_hook {
            hook(&instance, host, element).map_err(construction)?;
        }

        let coelement = Coelement::new(
            Rc::clone(&self.name),
            Rc::new(instance),
            element.clone(),
            Rc::clone(host),
            Rc::clone(&self.class),
        );
        for descriptor in self.class.descriptors() {
            descriptor.bind_to(&coelement);
        }
        store.insert(element.clone(), &self.name, Rc::new(coelement));
        Ok(true)
    }
}
