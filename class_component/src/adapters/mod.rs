// Copyright 2025 the Class Component Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host implementations for concrete element trees.
//!
//! Enabled via feature flags to keep the core small and `no_std` by default.

#[cfg(feature = "tree_adapter")]
pub mod tree;
