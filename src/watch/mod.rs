//! Call expectations with optional timeouts.
//!
//! This module provides [`ExpectationWatcher`], which arms one-shot watches
//! for "operation X will be invoked on object O" and dispatches exactly one
//! of a success or timeout callback per watch:
//!
//! - [`ExpectationWatcher`] - arms and tears down watches
//! - [`WatchHandle`] - observes one watch's settlement
//! - [`WatchOutcome`] - the terminal state of a settled watch
//! - [`SettledFuture`] - an awaitable view of settlement
//!
//! # Example
//!
//! ```rust
//! use std::sync::mpsc;
//! use std::sync::Arc;
//! use testkit_swizzle::fixture::{ops, GenericTestObject};
//! use testkit_swizzle::swizzle::SwizzleRegistry;
//! use testkit_swizzle::watch::{ExpectationWatcher, WatchOutcome};
//!
//! let watcher = ExpectationWatcher::new(SwizzleRegistry::new());
//! let object = Arc::new(GenericTestObject::new());
//! let (tx, rx) = mpsc::channel();
//!
//! let handle = watcher
//!     .expect_call(ops::VOID_METHOD_WITHOUT_PARAMS, &object, move || {
//!         tx.send(()).unwrap();
//!     })
//!     .unwrap();
//!
//! object.void_method_without_params();
//!
//! rx.try_recv().unwrap();
//! assert_eq!(handle.outcome(), Some(WatchOutcome::Called));
//! ```

mod future;
mod timer;
mod watcher;

pub use future::SettledFuture;
pub use watcher::{ExpectationWatcher, WatchHandle, WatchOutcome};
