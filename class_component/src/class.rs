// Copyright 2025 the Class Component Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Class definitions and coelement handles.
//!
//! ## Defining a class
//!
//! A [`Class`] pairs a constructor with a table of keyed methods and the descriptors
//! attached to them. It is built once, before registration, with a [`ClassBuilder`]:
//!
//! ```rust
//! use std::cell::Cell;
//! use class_component::{Class, Completion, Value, emit, on};
//! use class_component_tree::Document;
//!
//! type Doc = Document<Value>;
//!
//! #[derive(Default)]
//! struct Counter {
//!     count: Cell<u32>,
//! }
//!
//! let class = Class::<Doc, Counter>::builder_default()
//!     .component("counter")
//!     .method("increment", |this, _| {
//!         this.count.set(this.count.get() + 1);
//!         Completion::value(this.count.get())
//!     })
//!     .annotate("increment", on("click").at(".plus"))
//!     .annotate("increment", emit("counted").last())
//!     .build()
//!     .unwrap();
//! assert_eq!(class.descriptors().len(), 2);
//! ```
//!
//! Building validates the method table and folds emission and framing descriptors into
//! the methods they target, so they fire from inside every call.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::ops::Deref;

use futures_channel::oneshot;
use futures_util::future::{FutureExt, LocalBoxFuture};
use tracing::trace;

use crate::descriptor::{Annotation, Descriptor};
use crate::error::{DefinitionError, Error};
use crate::host::Host;
use crate::value::{Completion, MethodError, MethodResult, Value};
use crate::wrap::wrap;

/// A keyed method of a class.
pub type Method<H, C> = Rc<dyn Fn(&Coelement<H, C>, Value) -> Completion>;

/// Builds the coelement for an element.
pub type Constructor<H, C> = Rc<dyn Fn(&H, &<H as Host>::Element) -> Result<C, MethodError>>;

/// Runs right after construction, with the element the coelement belongs to.
pub type InitHook<H, C> = Rc<dyn Fn(&C, &H, &<H as Host>::Element) -> Result<(), MethodError>>;

/// Builder for a [`Class`].
pub struct ClassBuilder<H: Host, C> {
    name: Option<String>,
    constructor: Constructor<H, C>,
    init_hook: Option<InitHook<H, C>>,
    methods: Vec<(String, Method<H, C>)>,
    descriptors: Vec<Descriptor>,
}

impl<H: Host, C> core::fmt::Debug for ClassBuilder<H, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ClassBuilder")
            .field("name", &self.name)
            .field("methods", &self.methods.len())
            .field("descriptors", &self.descriptors)
            .finish_non_exhaustive()
    }
}

impl<H: Host, C: 'static> ClassBuilder<H, C> {
    /// Declare the component name this class registers under with
    /// [`ClassComponents::define`](crate::ClassComponents::define).
    #[must_use]
    pub fn component(mut self, name: &str) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Run `hook` with the element right after construction.
    #[must_use]
    pub fn init_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&C, &H, &H::Element) -> Result<(), MethodError> + 'static,
    {
        self.init_hook = Some(Rc::new(hook));
        self
    }

    /// Define a method under `key`.
    #[must_use]
    pub fn method<F>(mut self, key: &str, method: F) -> Self
    where
        F: Fn(&Coelement<H, C>, Value) -> Completion + 'static,
    {
        self.methods.push((key.into(), Rc::new(method)));
        self
    }

    /// Attach a behavior to the method under `key`. Descriptors accumulate in declaration
    /// order; nothing is ever replaced.
    #[must_use]
    pub fn annotate(mut self, key: &str, annotation: impl Into<Annotation>) -> Self {
        self.descriptors.push(Descriptor::new(key, annotation.into()));
        self
    }

    /// Validate the class and fold emission descriptors into their methods.
    pub fn build(self) -> Result<Class<H, C>, DefinitionError> {
        let mut methods: BTreeMap<String, Method<H, C>> = BTreeMap::new();
        for (key, method) in self.methods {
            if methods.contains_key(&key) {
                return Err(DefinitionError::DuplicateMethod(key));
            }
            methods.insert(key, method);
        }
        // Innermost first, so the first declared descriptor ends up outermost.
        for d in self.descriptors.iter().rev() {
            let Some(method) = methods.get_mut(d.method()) else {
                return Err(DefinitionError::UnknownMethod(d.method().into()));
            };
            *method = wrap(Rc::clone(method), d.annotation());
        }
        trace!(
            name = ?self.name,
            methods = methods.len(),
            descriptors = self.descriptors.len(),
            "class built"
        );
        Ok(Class {
            name: self.name,
            constructor: self.constructor,
            init_hook: self.init_hook,
            methods,
            descriptors: self.descriptors,
        })
    }
}

/// A class component definition: constructor, methods and descriptors.
///
/// Shared by every coelement constructed from it.
pub struct Class<H: Host, C> {
    name: Option<String>,
    pub(crate) constructor: Constructor<H, C>,
    pub(crate) init_hook: Option<InitHook<H, C>>,
    methods: BTreeMap<String, Method<H, C>>,
    descriptors: Vec<Descriptor>,
}

impl<H: Host, C> core::fmt::Debug for Class<H, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("descriptors", &self.descriptors)
            .finish_non_exhaustive()
    }
}

impl<H: Host, C: 'static> Class<H, C> {
    /// Start a class whose coelements are built by `constructor`.
    pub fn builder<F>(constructor: F) -> ClassBuilder<H, C>
    where
        F: Fn(&H, &H::Element) -> Result<C, MethodError> + 'static,
    {
        ClassBuilder {
            name: None,
            constructor: Rc::new(constructor),
            init_hook: None,
            methods: Vec::new(),
            descriptors: Vec::new(),
        }
    }

    /// Start a class whose coelements are built with [`Default`].
    pub fn builder_default() -> ClassBuilder<H, C>
    where
        C: Default,
    {
        Self::builder(|_, _| Ok(C::default()))
    }

    /// Declared component name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Descriptors in declaration order.
    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    /// Returns true if a method is defined under `key`.
    pub fn has_method(&self, key: &str) -> bool {
        self.methods.contains_key(key)
    }

    pub(crate) fn method(&self, key: &str) -> Option<&Method<H, C>> {
        self.methods.get(key)
    }
}

/// A constructed coelement together with the element it belongs to.
///
/// Cloning is cheap and every clone refers to the same instance. Dereferences to the
/// instance, so methods can read their state directly.
pub struct Coelement<H: Host, C> {
    name: Rc<str>,
    instance: Rc<C>,
    element: H::Element,
    host: Rc<H>,
    class: Rc<Class<H, C>>,
}

impl<H: Host, C> Clone for Coelement<H, C> {
    fn clone(&self) -> Self {
        Self {
            name: Rc::clone(&self.name),
            instance: Rc::clone(&self.instance),
            element: self.element.clone(),
            host: Rc::clone(&self.host),
            class: Rc::clone(&self.class),
        }
    }
}

impl<H: Host, C> core::fmt::Debug for Coelement<H, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Coelement")
            .field("name", &self.name)
            .field("element", &self.element)
            .finish_non_exhaustive()
    }
}

impl<H: Host, C> Deref for Coelement<H, C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.instance
    }
}

impl<H: Host, C: 'static> Coelement<H, C> {
    pub(crate) fn new(
        name: Rc<str>,
        instance: Rc<C>,
        element: H::Element,
        host: Rc<H>,
        class: Rc<Class<H, C>>,
    ) -> Self {
        Self {
            name,
            instance,
            element,
            host,
            class,
        }
    }

    /// Component name this coelement was bound under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The shared instance.
    pub fn instance(&self) -> &Rc<C> {
        &self.instance
    }

    /// The element this coelement belongs to.
    pub fn element(&self) -> &H::Element {
        &self.element
    }

    /// The host of the element.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The class this coelement was built from.
    pub fn class(&self) -> &Class<H, C> {
        &self.class
    }

    /// Call the (wrapped) method under `key`.
    ///
    /// A pending result is handed to the host executor right away, so the method body and
    /// its terminal emissions run even if the returned completion is dropped. The returned
    /// completion resolves to the same result.
    pub fn call(&self, key: &str, arg: Value) -> Result<Completion, Error> {
        let method = self.class.method(key).ok_or_else(|| Error::UnknownMethod {
            component: self.name().into(),
            method: key.into(),
        })?;
        Ok(match method(self, arg) {
            Completion::Pending(fut) => self.drive_on_host(key, fut),
            ready => ready,
        })
    }

    fn drive_on_host(&self, key: &str, fut: LocalBoxFuture<'static, MethodResult>) -> Completion {
        let (tx, rx) = oneshot::channel();
        trace!(component = self.name(), method = key, "spawning pending method");
        self.host.spawn(
            async move {
                // The caller may have dropped its end; the emissions already ran.
                let _ = tx.send(fut.await);
            }
            .boxed_local(),
        );
        Completion::pending(async move {
            rx.await
                .unwrap_or_else(|_| Err(MethodError::new("method task dropped before settling")))
        })
    }

    /// Emit `event` on the element.
    pub fn emit(&self, event: &str, detail: Option<Value>) {
        trace!(component = self.name(), event, "emit");
        self.host.emit(&self.element, event, detail);
    }

    /// Returns true if both handles refer to the same instance.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.instance, &b.instance)
    }
}
