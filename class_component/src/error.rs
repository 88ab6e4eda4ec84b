// Copyright 2025 the Class Component Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors raised by the engine.

use alloc::string::String;

use crate::value::MethodError;

/// Errors returned by [`ClassComponents`](crate::ClassComponents) and coelement handles.
#[derive(Clone, Debug, thiserror::Error)]
pub enum Error {
    /// The element handle does not refer to a live element.
    #[error("operation invoked on an empty selection")]
    EmptySelection,
    /// The element was never initialized for the component.
    #[error("no coelement `{name}` bound to the element")]
    MissingCoelement {
        /// Component name.
        name: String,
    },
    /// The coelement exists but is not of the requested type.
    #[error("coelement `{name}` is not a `{expected}`")]
    CoelementType {
        /// Component name.
        name: String,
        /// Requested type name.
        expected: &'static str,
    },
    /// The component class has no method under the key.
    #[error("component `{component}` has no method `{method}`")]
    UnknownMethod {
        /// Component name.
        component: String,
        /// Method key.
        method: String,
    },
    /// [`define`](crate::ClassComponents::define) was given a class without a component name.
    #[error("class declares no component name")]
    Unnamed,
    /// The constructor or init hook failed. The element keeps its initialized marker.
    #[error("constructing component `{name}` failed")]
    Construction {
        /// Component name.
        name: String,
        /// The failure.
        #[source]
        source: MethodError,
    },
}

/// Errors found while building a [`Class`](crate::Class).
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum DefinitionError {
    /// A descriptor names a method the class does not define.
    #[error("descriptor attached to undefined method `{0}`")]
    UnknownMethod(String),
    /// Two methods share a key.
    #[error("method `{0}` defined twice")]
    DuplicateMethod(String),
}
