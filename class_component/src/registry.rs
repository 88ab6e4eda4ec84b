// Copyright 2025 the Class Component Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The component registry and element binding facade.
//!
//! ## Usage
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use class_component::{Class, ClassComponents, Completion, Value, on};
//! use class_component_tree::Document;
//!
//! type Doc = Document<Value>;
//!
//! #[derive(Default)]
//! struct Toggle {
//!     on: Cell<bool>,
//! }
//!
//! let doc = Rc::new(Doc::new());
//! let cc = ClassComponents::new(Rc::clone(&doc));
//! cc.define(
//!     Class::<Doc, Toggle>::builder_default()
//!         .component("toggle")
//!         .method("flip", |this, _| {
//!             this.on.set(!this.on.get());
//!             Completion::unit()
//!         })
//!         .annotate("flip", on("flip"))
//!         .build()
//!         .unwrap(),
//! )
//! .unwrap();
//!
//! let el = doc.create_with_classes(None, "button", "toggle");
//! cc.bind(&el).unwrap();
//! doc.dispatch(el, "flip", None);
//! assert!(cc.get::<Toggle>(&el, "toggle").unwrap().on.get());
//! ```

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::RefCell;

use tracing::{debug, warn};

use crate::class::{Class, Coelement};
use crate::configuration::{CoelementStore, Configuration, Configure};
use crate::error::Error;
use crate::host::Host;
use crate::value::{Completion, Value};

/// Facade configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Appended to a component name to form the class that marks bound elements.
    pub marker_suffix: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            marker_suffix: "-initialized".to_string(),
        }
    }
}

/// Registry of component classes by name, bound to one host.
///
/// Bound coelements live in a side table keyed by element and component name. Entries are
/// not evicted when the host removes an element; call [`prune`](Self::prune) (or
/// [`init_all`](Self::init_all), which prunes) after removing subtrees.
pub struct ClassComponents<H: Host> {
    host: Rc<H>,
    settings: Settings,
    registry: RefCell<BTreeMap<String, Rc<dyn Configure<H>>>>,
    store: CoelementStore<H>,
}

impl<H: Host> core::fmt::Debug for ClassComponents<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ClassComponents")
            .field("settings", &self.settings)
            .field("components", &self.names())
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl<H: Host> ClassComponents<H> {
    /// Create an empty registry with default [`Settings`].
    pub fn new(host: Rc<H>) -> Self {
        Self::with_settings(host, Settings::default())
    }

    /// Create an empty registry.
    pub fn with_settings(host: Rc<H>, settings: Settings) -> Self {
        Self {
            host,
            settings,
            registry: RefCell::new(BTreeMap::new()),
            store: CoelementStore::default(),
        }
    }

    /// The host.
    pub fn host(&self) -> &Rc<H> {
        &self.host
    }

    /// The settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Register `class` under `name`. A later registration under the same name replaces
    /// the earlier one; elements already bound keep their coelements.
    pub fn register<C: 'static>(&self, name: &str, class: Class<H, C>) {
        let config = Configuration::new(name, &self.settings.marker_suffix, Rc::new(class));
        let replaced = self
            .registry
            .borrow_mut()
            .insert(name.to_string(), Rc::new(config))
            .is_some();
        debug!(component = name, replaced, "registered component");
    }

    /// Register `class` under its declared component name.
    pub fn define<C: 'static>(&self, class: Class<H, C>) -> Result<(), Error> {
        let name = class.name().ok_or(Error::Unnamed)?.to_string();
        self.register(&name, class);
        Ok(())
    }

    /// Returns true if a class is registered under `name`.
    pub fn is_registered(&self, name: &str) -> bool {
        self.registry.borrow().contains_key(name)
    }

    /// Registered component names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.registry.borrow().keys().cloned().collect()
    }

    /// Initialize `element` for every registered component among its classes.
    ///
    /// Classes that name no registered component are skipped.
    pub fn bind(&self, element: &H::Element) -> Result<H::Element, Error> {
        self.ensure_live(element)?;
        for name in self.host.class_names(element) {
            self.init_named(element, &name)?;
        }
        Ok(element.clone())
    }

    /// Initialize `element` for each of the whitespace separated component `names`,
    /// adding the component class to the element where needed.
    pub fn bind_as(&self, element: &H::Element, names: &str) -> Result<H::Element, Error> {
        self.ensure_live(element)?;
        for name in names.split_whitespace() {
            self.init_named(element, name)?;
        }
        Ok(element.clone())
    }

    /// Returns true if `element` carries the initialized marker of the component `name`.
    ///
    /// This is also true after a failed construction, which leaves the marker in place.
    pub fn is_bound(&self, element: &H::Element, name: &str) -> bool {
        let Some(config) = self.registry.borrow().get(name).cloned() else {
            return false;
        };
        self.host.has_class(element, config.marker())
    }

    /// The coelement bound to `element` under `name`.
    pub fn get<C: 'static>(&self, element: &H::Element, name: &str) -> Result<Coelement<H, C>, Error> {
        self.ensure_live(element)?;
        let bound = self
            .store
            .get(element, name)
            .ok_or_else(|| Error::MissingCoelement {
                name: name.to_string(),
            })?;
        bound
            .as_any()
            .downcast_ref::<Coelement<H, C>>()
            .cloned()
            .ok_or_else(|| Error::CoelementType {
                name: name.to_string(),
                expected: core::any::type_name::<C>(),
            })
    }

    /// Bind `element` as `name`, then return its coelement.
    pub fn init<C: 'static>(&self, element: &H::Element, name: &str) -> Result<Coelement<H, C>, Error> {
        self.bind_as(element, name)?;
        self.get(element, name)
    }

    /// Initialize every element under `root`, and `root` itself, that carries a registered
    /// component class but not yet its marker. Returns how many bindings were made.
    ///
    /// Coelements of elements removed from the host since the last pass are pruned first.
    pub fn init_all(&self, root: &H::Element) -> Result<usize, Error> {
        self.ensure_live(root)?;
        self.prune();
        let mut count = 0;
        for name in self.names() {
            let mut candidates = Vec::new();
            if self.host.has_class(root, &name) {
                candidates.push(root.clone());
            }
            let mut source = String::from(".");
            source.push_str(&name);
            match self.host.parse_selector(&source) {
                Some(selector) => candidates.extend(self.host.query_descendants(root, &selector)),
                None => warn!(component = %name, "component name is not a class selector, descendants skipped"),
            }
            for element in candidates {
                if self.init_named(&element, &name)? {
                    count += 1;
                }
            }
        }
        Ok(count)
    }

    /// Forget the coelements of elements the host no longer contains, releasing them.
    ///
    /// The side table is not notified when an element is removed, so entries outlive their
    /// element until this runs. [`init_all`](Self::init_all) prunes on every pass. Returns
    /// how many coelements were dropped.
    pub fn prune(&self) -> usize {
        let pruned = self.store.prune(&self.host);
        if pruned > 0 {
            debug!(pruned, "pruned coelements of removed elements");
        }
        pruned
    }

    /// Call `method` on the coelement bound to `element` under `name`.
    pub fn call(
        &self,
        element: &H::Element,
        name: &str,
        method: &str,
        arg: Value,
    ) -> Result<Completion, Error> {
        self.ensure_live(element)?;
        let bound = self
            .store
            .get(element, name)
            .ok_or_else(|| Error::MissingCoelement {
                name: name.to_string(),
            })?;
        bound.call(method, arg)
    }

    fn ensure_live(&self, element: &H::Element) -> Result<(), Error> {
        if self.host.contains(element) {
            Ok(())
        } else {
            Err(Error::EmptySelection)
        }
    }

    /// Returns `Ok(true)` if this call bound the element.
    fn init_named(&self, element: &H::Element, name: &str) -> Result<bool, Error> {
        // Cloned out so construction may re-enter the registry.
        let Some(config) = self.registry.borrow().get(name).cloned() else {
            return Ok(false);
        };
        self.host.add_class(element, name);
        config.init_element(&self.host, element, &self.store)
    }
}

#[cfg(all(test, feature = "tree_adapter"))]
mod tests {
    use super::*;
    use class_component_tree::Document;

    type Doc = Document<Value>;

    fn unit_class() -> Class<Doc, ()> {
        Class::<Doc, ()>::builder_default().build().unwrap()
    }

    #[test]
    fn later_registration_wins() {
        let doc = Rc::new(Doc::new());
        let cc = ClassComponents::new(Rc::clone(&doc));
        cc.register("a", unit_class());
        cc.register("b", unit_class());
        cc.register("a", Class::<Doc, u8>::builder(|_, _| Ok(7)).build().unwrap());
        assert_eq!(cc.names(), ["a", "b"]);

        let el = doc.create_with_classes(None, "div", "a");
        cc.bind(&el).unwrap();
        assert_eq!(*cc.get::<u8>(&el, "a").unwrap(), 7);
    }

    #[test]
    fn define_requires_a_component_name() {
        let cc = ClassComponents::new(Rc::new(Doc::new()));
        assert!(matches!(cc.define(unit_class()), Err(Error::Unnamed)));
        assert!(cc.names().is_empty());
    }

    #[test]
    fn custom_marker_suffix() {
        let doc = Rc::new(Doc::new());
        let cc = ClassComponents::with_settings(
            Rc::clone(&doc),
            Settings {
                marker_suffix: "--ready".into(),
            },
        );
        cc.register("widget", unit_class());
        let el = doc.create_element(None, "div");
        assert!(!cc.is_bound(&el, "widget"));
        cc.bind_as(&el, "widget").unwrap();
        assert!(cc.is_bound(&el, "widget"));
        assert!(!cc.is_bound(&el, "other"));
        assert!(doc.has_class(el, "widget"));
        assert!(doc.has_class(el, "widget--ready"));
        assert!(!doc.has_class(el, "widget-initialized"));
    }

    #[test]
    fn wrong_type_is_reported() {
        let doc = Rc::new(Doc::new());
        let cc = ClassComponents::new(Rc::clone(&doc));
        cc.register("unit", unit_class());
        let el = doc.create_element(None, "div");
        cc.bind_as(&el, "unit").unwrap();
        assert!(matches!(
            cc.get::<u32>(&el, "unit"),
            Err(Error::CoelementType { .. })
        ));
    }

    #[test]
    fn removed_element_is_an_empty_selection() {
        let doc = Rc::new(Doc::new());
        let cc = ClassComponents::new(Rc::clone(&doc));
        let el = doc.create_element(None, "div");
        doc.remove(el);
        assert!(matches!(cc.bind(&el), Err(Error::EmptySelection)));
        assert!(matches!(cc.get::<()>(&el, "x"), Err(Error::EmptySelection)));
    }
}
