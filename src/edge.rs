// SPDX-License-Identifier: Apache-2.0

//! Edge-triggered readiness notifications between buffers and their owners.

use std::cell::RefCell;
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;
use crate::Error;

/// Receives edge-triggered notifications. An edge fires on a transition only:
/// *readable* when a buffer goes from empty to holding data, *writable* when it
/// goes from full to having free space.
///
/// Handlers are called synchronously on the event loop thread, after the buffer
/// has released its internal state, so they may call back into it.
pub trait EdgeHandler {
	/// The buffer became readable.
	fn readable_edge(&self);

	/// The buffer became writable.
	fn writable_edge(&self);

	/// The stream failed with a terminal error. Called at most once per stream.
	fn stream_error(&self, error: &Error) {
		let _ = error;
	}
}

/// A set of [`EdgeHandler`]s, notified in registration order.
#[derive(Default)]
pub struct Handlers(RefCell<Vec<Rc<dyn EdgeHandler>>>);

impl Handlers {
	/// Registers `handler`, if not already registered.
	pub fn add(&self, handler: Rc<dyn EdgeHandler>) {
		let mut handlers = self.0.borrow_mut();
		if !handlers.iter().any(|h| Rc::ptr_eq(h, &handler)) {
			handlers.push(handler);
		}
	}

	/// Unregisters `handler`, returning `true` if it was registered.
	pub fn remove(&self, handler: &Rc<dyn EdgeHandler>) -> bool {
		let mut handlers = self.0.borrow_mut();
		let len = handlers.len();
		handlers.retain(|h| !Rc::ptr_eq(h, handler));
		handlers.len() != len
	}

	/// Returns the number of registered handlers.
	pub fn len(&self) -> usize { self.0.borrow().len() }

	/// Returns `true` if no handlers are registered.
	pub fn is_empty(&self) -> bool { self.len() == 0 }

	/// Notifies all handlers of a readable edge.
	pub fn readable(&self) {
		for handler in self.snapshot() {
			handler.readable_edge()
		}
	}

	/// Notifies all handlers of a writable edge.
	pub fn writable(&self) {
		for handler in self.snapshot() {
			handler.writable_edge()
		}
	}

	/// Notifies all handlers of a terminal error.
	pub fn error(&self, error: &Error) {
		for handler in self.snapshot() {
			handler.stream_error(error)
		}
	}

	/// Handlers may (un)register handlers while being notified, so notifications
	/// iterate over a copy.
	fn snapshot(&self) -> Vec<Rc<dyn EdgeHandler>> {
		self.0.borrow().clone()
	}
}

impl Debug for Handlers {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Handlers")
		 .field(&self.len())
		 .finish()
	}
}
