// SPDX-License-Identifier: Apache-2.0

use std::cell::Cell;
use std::thread;
use crate::edge::Handlers;

/// Holds the operating flag of a pipeline for the duration of one run. When
/// dropped, on any exit path, the flag is reset and a writable edge is emitted
/// if the run freed capacity.
pub(super) struct OperatingGuard<'a> {
	operating: &'a Cell<bool>,
	pending_writable: &'a Cell<bool>,
	handlers: &'a Handlers,
}

impl<'a> OperatingGuard<'a> {
	/// Sets the operating flag, returning `None` if it was already set.
	pub fn acquire(
		operating: &'a Cell<bool>,
		pending_writable: &'a Cell<bool>,
		handlers: &'a Handlers
	) -> Option<Self> {
		if operating.replace(true) {
			return None
		}

		Some(Self { operating, pending_writable, handlers })
	}
}

impl Drop for OperatingGuard<'_> {
	fn drop(&mut self) {
		self.operating.set(false);
		// Handlers are foreign code, don't call them while unwinding.
		if self.pending_writable.take() && !thread::panicking() {
			self.handlers.writable()
		}
	}
}

#[cfg(test)]
mod test {
	use std::cell::Cell;
	use std::panic::{AssertUnwindSafe, catch_unwind};
	use std::rc::Rc;
	use crate::edge::{EdgeHandler, Handlers};
	use super::OperatingGuard;

	#[derive(Default)]
	struct Writable(Cell<usize>);

	impl EdgeHandler for Writable {
		fn readable_edge(&self) { }
		fn writable_edge(&self) { self.0.set(self.0.get() + 1) }
	}

	#[test]
	fn release() {
		let operating = Cell::new(false);
		let pending = Cell::new(false);
		let handlers = Handlers::default();
		let writable = Rc::new(Writable::default());
		handlers.add(writable.clone());

		{
			let _guard = OperatingGuard::acquire(&operating, &pending, &handlers).unwrap();
			assert!(operating.get());
			assert!(OperatingGuard::acquire(&operating, &pending, &handlers).is_none());
			assert!(operating.get());
		}
		assert!(!operating.get());
		assert_eq!(writable.0.get(), 0);

		{
			let _guard = OperatingGuard::acquire(&operating, &pending, &handlers).unwrap();
			pending.set(true);
		}
		assert!(!pending.get());
		assert_eq!(writable.0.get(), 1);
	}

	#[test]
	fn release_on_panic() {
		let operating = Cell::new(false);
		let pending = Cell::new(false);
		let handlers = Handlers::default();
		let writable = Rc::new(Writable::default());
		handlers.add(writable.clone());

		let result = catch_unwind(AssertUnwindSafe(|| {
			let _guard = OperatingGuard::acquire(&operating, &pending, &handlers);
			pending.set(true);
			panic!("transform panicked");
		}));
		assert!(result.is_err());
		assert!(!operating.get());
		assert_eq!(writable.0.get(), 0);
	}
}
