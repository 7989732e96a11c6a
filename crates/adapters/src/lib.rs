// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dagrun-adapters: external-collaborator boundary of the dagrun engine
//!
//! The engine talks to the outside world through three seams:
//! - [`JobBackend`] / [`Job`] — the remote job-execution backend
//! - [`ResourceHandler`] — artifact path generation and content digests
//!
//! A scripted [`FakeBackend`] test double is available behind the
//! `test-support` feature.

pub mod job;
pub mod resource;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeBackend, JobScript};

pub use job::{Job, JobBackend, JobError, JobInfo, JobValues};
pub use resource::{FsResourceHandler, ResourceError, ResourceHandler};
