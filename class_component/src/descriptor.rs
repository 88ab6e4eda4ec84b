// Copyright 2025 the Class Component Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Behavior descriptors attached to class methods.
//!
//! ## Overview
//!
//! An [`Annotation`] describes one behavior before it is attached to a method:
//!
//! - [`event`]: call the method when a native event reaches the element (optionally
//!   delegated to descendants matching a selector).
//! - [`on`]: the same for events dispatched programmatically, scoped with [`On::at`].
//! - [`emit`]: make the method emit an event; [`Emit::first`], [`Emit::last`] and
//!   [`Emit::on_error`] choose when.
//! - [`trigger`]: frame the method with optional start, end and error events.
//!
//! [`ClassBuilder::annotate`](crate::ClassBuilder::annotate) pairs an annotation with a
//! method key, producing an immutable [`Descriptor`]. Descriptors belong to the class, so
//! every coelement of that class shares them.
//!
//! Listening descriptors are bound per element when a component is initialized.
//! Emission and framing descriptors are folded into the method itself when the class is
//! built and need no per-element binding.

use alloc::borrow::ToOwned;
use alloc::rc::Rc;
use alloc::string::String;

use futures_util::future::FutureExt;
use tracing::{trace, warn};

use crate::class::Coelement;
use crate::host::{Event, Host, delegation_path};
use crate::value::{Completion, Value};

/// Descriptor kinds.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DescriptorKind {
    /// Native event listener.
    DomEvent,
    /// Listener for programmatically dispatched events.
    NamedEvent,
    /// Emission around the method.
    Emit,
    /// Start/end/error framing around the method.
    TriggerFrame,
}

/// When an [`Emit`] annotation fires.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum EmitPolicy {
    /// Before the method body runs, without payload.
    #[default]
    Immediate,
    /// Same as `Immediate`; spelled out for readability at the annotation site.
    First,
    /// After the method settles successfully, with its value as payload.
    Last,
}

/// Optional framing events of a [`trigger`] annotation.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Framing {
    /// Emitted before the method runs.
    pub start: Option<String>,
    /// Emitted after the method settles successfully.
    pub end: Option<String>,
    /// Emitted after the method fails.
    pub error: Option<String>,
}

/// A behavior not yet attached to a method.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Annotation {
    /// Call the method when the event reaches the element.
    Listen {
        /// [`DescriptorKind::DomEvent`] or [`DescriptorKind::NamedEvent`].
        kind: DescriptorKind,
        /// Event name.
        event: String,
        /// Delegation selector; `None` binds directly on the element.
        selector: Option<String>,
    },
    /// Emit an event around the method.
    Emit {
        /// Event name.
        event: String,
        /// When to emit.
        policy: EmitPolicy,
        /// Only emit on failure, with the error as payload.
        on_error: bool,
    },
    /// Frame the method with start/end/error events.
    Trigger(Framing),
}

impl Annotation {
    /// The kind of descriptor this annotation produces.
    pub fn kind(&self) -> DescriptorKind {
        match self {
            Self::Listen { kind, .. } => *kind,
            Self::Emit { .. } => DescriptorKind::Emit,
            Self::Trigger(_) => DescriptorKind::TriggerFrame,
        }
    }
}

/// Listen for a native event, directly on the element or delegated to `selector`.
pub fn event(name: &str, selector: Option<&str>) -> Annotation {
    Annotation::Listen {
        kind: DescriptorKind::DomEvent,
        event: name.to_owned(),
        selector: selector.map(ToOwned::to_owned),
    }
}

/// Listen for an event dispatched on the element. Scope it with [`On::at`].
pub fn on(name: &str) -> On {
    On {
        event: name.to_owned(),
        selector: None,
    }
}

/// Make the method emit `name`. Defaults to [`EmitPolicy::Immediate`].
pub fn emit(name: &str) -> Emit {
    Emit {
        event: name.to_owned(),
        policy: EmitPolicy::Immediate,
        on_error: false,
    }
}

/// Frame the method with any subset of start, end and error events.
pub fn trigger(start: Option<&str>, end: Option<&str>, error: Option<&str>) -> Annotation {
    Annotation::Trigger(Framing {
        start: start.map(ToOwned::to_owned),
        end: end.map(ToOwned::to_owned),
        error: error.map(ToOwned::to_owned),
    })
}

/// Builder returned by [`on`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct On {
    event: String,
    selector: Option<String>,
}

impl On {
    /// Only react when the event comes from a descendant matching `selector`.
    #[must_use]
    pub fn at(mut self, selector: &str) -> Self {
        self.selector = Some(selector.to_owned());
        self
    }
}

impl From<On> for Annotation {
    fn from(on: On) -> Self {
        Self::Listen {
            kind: DescriptorKind::NamedEvent,
            event: on.event,
            selector: on.selector,
        }
    }
}

/// Builder returned by [`emit`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Emit {
    event: String,
    policy: EmitPolicy,
    on_error: bool,
}

impl Emit {
    /// Emit before the method body runs.
    #[must_use]
    pub fn first(mut self) -> Self {
        self.policy = EmitPolicy::First;
        self
    }

    /// Emit the settled value after the method succeeds.
    #[must_use]
    pub fn last(mut self) -> Self {
        self.policy = EmitPolicy::Last;
        self
    }

    /// Emit only when the method fails, with the error as payload.
    #[must_use]
    pub fn on_error(mut self) -> Self {
        self.on_error = true;
        self
    }
}

impl From<Emit> for Annotation {
    fn from(emit: Emit) -> Self {
        Self::Emit {
            event: emit.event,
            policy: emit.policy,
            on_error: emit.on_error,
        }
    }
}

/// An annotation attached to a method of a class. Immutable once created.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Descriptor {
    method: String,
    annotation: Annotation,
}

impl Descriptor {
    pub(crate) fn new(method: &str, annotation: Annotation) -> Self {
        Self {
            method: method.to_owned(),
            annotation,
        }
    }

    /// Key of the method this descriptor is attached to.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The attached behavior.
    pub fn annotation(&self) -> &Annotation {
        &self.annotation
    }

    /// The kind of behavior.
    pub fn kind(&self) -> DescriptorKind {
        self.annotation.kind()
    }

    /// Bind this descriptor to a freshly constructed coelement and its element.
    ///
    /// Only listening descriptors register anything; the others already live inside the
    /// wrapped method.
    pub(crate) fn bind_to<H: Host, C: 'static>(&self, coelement: &Coelement<H, C>) {
        let Annotation::Listen {
            event, selector, ..
        } = &self.annotation
        else {
            return;
        };
        trace!(
            component = coelement.name(),
            method = %self.method,
            event = %event,
            selector = ?selector,
            "binding listener"
        );
        let selector = match selector {
            None => None,
            Some(source) => match coelement.host().parse_selector(source) {
                Some(parsed) => Some(parsed),
                None => {
                    warn!(
                        component = coelement.name(),
                        method = %self.method,
                        event = %event,
                        selector = %source,
                        "unsupported selector, listener not bound"
                    );
                    return;
                }
            },
        };
        let this = coelement.clone();
        let method: Rc<str> = self.method.as_str().into();
        coelement.host().listen(
            coelement.element(),
            event,
            Rc::new(move |ev: &Event<H::Element>| match &selector {
                None => dispatch(&this, &method, ev.clone()),
                Some(selector) => {
                    let root = this.element();
                    for matched in delegation_path(this.host(), &ev.target, root) {
                        if this.host().matches(&matched, selector) {
                            let delegated = Event {
                                current_target: matched,
                                delegate_target: Some(root.clone()),
                                ..ev.clone()
                            };
                            dispatch(&this, &method, delegated);
                        }
                    }
                }
            }),
        );
    }
}

/// Invoke a method from a listener. Nobody awaits the result, so failures are logged; a
/// pending call already runs on the host and a second host task waits to log its failure.
fn dispatch<H: Host, C: 'static>(this: &Coelement<H, C>, method: &str, ev: Event<H::Element>) {
    let event = ev.name.clone();
    match this.call(method, Value::new(ev)) {
        Ok(Completion::Ready(Ok(_))) => {}
        Ok(Completion::Ready(Err(error))) => {
            warn!(component = this.name(), method, event = %event, %error, "listener method failed");
        }
        Ok(Completion::Pending(fut)) => {
            let component: Rc<str> = this.name().into();
            let method: Rc<str> = method.into();
            this.host().spawn(
                async move {
                    if let Err(error) = fut.await {
                        warn!(
                            component = &*component,
                            method = &*method,
                            event = %event,
                            %error,
                            "listener method failed"
                        );
                    }
                }
                .boxed_local(),
            );
        }
        Err(error) => {
            warn!(component = this.name(), method, %error, "listener could not call method");
        }
    }
}
