// Copyright 2025 the Class Component Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Values passed into methods and emissions, method failures, and method completions.
//!
//! ## Overview
//!
//! Methods on a class are dynamically keyed, so their arguments and results travel as
//! type-erased [`Value`]s. A method returns a [`Completion`]: either a result that is
//! already known, or a pending future that settles later on the host's executor.
//! Failures are [`MethodError`]s; the engine observes them (for `.on_error()` emissions and
//! error framing) but always hands them back to the caller unchanged.

use alloc::rc::Rc;
use alloc::string::String;
use core::any::Any;
use core::future::Future;

use futures_util::future::{self, FutureExt, LocalBoxFuture};

/// A type-erased, cheaply cloneable value.
#[derive(Clone)]
pub struct Value(Rc<dyn Any>);

impl Value {
    /// Wrap any `'static` value.
    pub fn new<T: Any>(value: T) -> Self {
        Self(Rc::new(value))
    }

    /// The unit value, used when there is nothing meaningful to pass.
    pub fn unit() -> Self {
        Self::new(())
    }

    /// Borrow the inner value if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Returns true if the inner value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.0.is::<T>()
    }

    /// Returns true if both values share the same allocation.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::unit()
    }
}

impl core::fmt::Debug for Value {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Value").finish_non_exhaustive()
    }
}

/// Failure of a class method, either returned synchronously or from a pending completion.
///
/// Carries a message and an optional payload for callers that need structured data.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{message}")]
pub struct MethodError {
    message: String,
    payload: Option<Value>,
}

impl MethodError {
    /// Create an error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            payload: None,
        }
    }

    /// Attach a payload.
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// The message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The payload, if any.
    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }
}

impl From<&str> for MethodError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for MethodError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Outcome of a method once it has settled.
pub type MethodResult = Result<Value, MethodError>;

/// What a method returns to its caller.
///
/// A [`Completion::Pending`] returned from [`Coelement::call`](crate::Coelement::call) is
/// already running on the host executor (see [`Host::spawn`](crate::Host::spawn)): its
/// terminal emissions fire when it settles, whether or not the caller awaits it. One built
/// by hand with [`Completion::pending`] is an ordinary lazy future until it goes through a
/// call.
#[must_use = "the method result is lost if the completion is dropped"]
pub enum Completion {
    /// The method already produced its result.
    Ready(MethodResult),
    /// The method settles later.
    Pending(LocalBoxFuture<'static, MethodResult>),
}

impl Completion {
    /// A successful result.
    pub fn ok(value: Value) -> Self {
        Self::Ready(Ok(value))
    }

    /// A successful result wrapping `value`.
    pub fn value<T: Any>(value: T) -> Self {
        Self::ok(Value::new(value))
    }

    /// A successful result carrying [`Value::unit`].
    pub fn unit() -> Self {
        Self::ok(Value::unit())
    }

    /// A synchronous failure.
    pub fn err(error: impl Into<MethodError>) -> Self {
        Self::Ready(Err(error.into()))
    }

    /// A result that settles when `fut` does.
    pub fn pending(fut: impl Future<Output = MethodResult> + 'static) -> Self {
        Self::Pending(fut.boxed_local())
    }

    /// Returns true for [`Completion::Pending`].
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// The result, if already known.
    pub fn ready(self) -> Option<MethodResult> {
        match self {
            Self::Ready(result) => Some(result),
            Self::Pending(_) => None,
        }
    }

    /// Normalize into a future, whether or not the result is already known.
    pub fn settle(self) -> LocalBoxFuture<'static, MethodResult> {
        match self {
            Self::Ready(result) => future::ready(result).boxed_local(),
            Self::Pending(fut) => fut,
        }
    }
}

impl From<MethodResult> for Completion {
    fn from(result: MethodResult) -> Self {
        Self::Ready(result)
    }
}

impl core::fmt::Debug for Completion {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Ready(result) => f.debug_tuple("Ready").field(result).finish(),
            Self::Pending(_) => f.write_str("Pending"),
        }
    }
}
