// SPDX-License-Identifier: Apache-2.0

use std::cell::RefCell;
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;
use crate::Result;
use crate::edge::{EdgeHandler, Handlers};
use crate::streams::{Sink, Source, Stream};
use super::{ByteRing, Region, RingBuffer, Stored};

/// A shared handle to a [`ByteRing`], emitting edges to its registered handlers.
/// Clones refer to the same buffer; equality is identity.
///
/// A readable edge fires after a store takes the buffer from empty to holding
/// data, a writable edge after a write-out takes it from full to having free
/// space. Handlers run once the buffer is released, so they may use it.
#[derive(Clone)]
pub struct SharedRing(Rc<Shared>);

struct Shared {
	ring: RefCell<ByteRing>,
	handlers: Handlers,
}

impl From<ByteRing> for SharedRing {
	fn from(ring: ByteRing) -> Self {
		Self(Rc::new(Shared {
			ring: RefCell::new(ring),
			handlers: Handlers::default(),
		}))
	}
}

impl PartialEq for SharedRing {
	fn eq(&self, other: &Self) -> bool { self.ptr_eq(other) }
}

impl Eq for SharedRing { }

impl SharedRing {
	/// Creates a new buffer of `capacity` bytes in `region`.
	pub fn new(capacity: usize, region: Region) -> Self {
		ByteRing::new(capacity, region).into()
	}

	/// Creates a new buffer of `capacity` bytes of heap memory.
	pub fn heap(capacity: usize) -> Self { ByteRing::heap(capacity).into() }

	/// Creates a new buffer of `capacity` bytes in a fixed region.
	pub fn fixed(capacity: usize) -> Self { ByteRing::fixed(capacity).into() }

	/// Returns `true` if both handles refer to the same buffer.
	pub fn ptr_eq(&self, other: &Self) -> bool { Rc::ptr_eq(&self.0, &other.0) }

	pub fn capacity(&self) -> usize { self.0.ring.borrow().capacity() }
	pub fn used(&self) -> usize { self.0.ring.borrow().used() }
	pub fn free(&self) -> usize { self.0.ring.borrow().free() }
	pub fn region(&self) -> Region { self.0.ring.borrow().region() }
	pub fn can_defragment(&self) -> bool { self.0.ring.borrow().can_defragment() }

	/// Copies the content into a new vector without consuming it.
	pub fn to_vec(&self) -> Vec<u8> {
		let ring = self.0.ring.borrow();
		let (a, b) = ring.as_slices();
		[a, b].concat()
	}

	/// Registers `handler` for edges from this buffer.
	pub fn add_handler(&self, handler: Rc<dyn EdgeHandler>) {
		self.0.handlers.add(handler)
	}

	/// Unregisters `handler`, returning `true` if it was registered.
	pub fn remove_handler(&self, handler: &Rc<dyn EdgeHandler>) -> bool {
		self.0.handlers.remove(handler)
	}

	/// Returns the number of registered handlers.
	pub fn handler_count(&self) -> usize { self.0.handlers.len() }

	/// Stores bytes from `source`, firing a readable edge if the buffer was
	/// empty.
	pub fn store_from(&self, source: &mut (impl Source + ?Sized)) -> Result<Stored> {
		self.storing(|ring| ring.store_from(source))
	}

	/// Copies as much of `data` as fits, firing a readable edge if the buffer was
	/// empty.
	pub fn store_slice(&self, data: &[u8]) -> Result<usize> {
		self.storing(|ring| ring.store_slice(data))
	}

	/// Writes at most `max` bytes into `sink`, firing a writable edge if the
	/// buffer was full.
	pub fn write_to(&self, sink: &mut (impl Sink + ?Sized), max: usize) -> Result<usize> {
		let (written, became_writable) = {
			let mut ring = self.0.ring.borrow_mut();
			let was_full = ring.free() == 0;
			let written = ring.write_to(sink, max)?;
			(written, was_full && written > 0)
		};

		if became_writable {
			self.0.handlers.writable();
		}
		Ok(written)
	}

	/// Discards all content. No edge fires: clearing is part of stream teardown.
	pub fn clear(&self) { self.0.ring.borrow_mut().clear() }

	/// Releases the backing memory. Idempotent.
	pub fn clean(&self) { self.0.ring.borrow_mut().clean() }

	/// Defragments the buffer, if supported.
	pub fn defragment(&self) -> Result { self.0.ring.borrow_mut().defragment() }

	fn storing<T>(&self, store: impl FnOnce(&mut ByteRing) -> Result<T>) -> Result<T> {
		let (result, became_readable) = {
			let mut ring = self.0.ring.borrow_mut();
			let was_empty = ring.used() == 0;
			let result = store(&mut ring)?;
			(result, was_empty && ring.used() > 0)
		};

		if became_readable {
			self.0.handlers.readable();
		}
		Ok(result)
	}
}

impl Debug for SharedRing {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("SharedRing")
		 .field("ring", &self.0.ring)
		 .field("handlers", &self.0.handlers)
		 .finish()
	}
}

impl Stream for SharedRing { }

impl Sink for SharedRing {
	/// Stores as much of `src` as fits into the buffer.
	fn write(&mut self, src: &[u8]) -> Result<usize> {
		self.store_slice(src)
	}
}

impl RingBuffer for SharedRing {
	fn capacity(&self) -> usize { SharedRing::capacity(self) }

	fn used(&self) -> usize { SharedRing::used(self) }

	fn store_from(&mut self, source: &mut (impl Source + ?Sized)) -> Result<Stored> {
		SharedRing::store_from(self, source)
	}

	fn write_to(&mut self, sink: &mut (impl Sink + ?Sized), max: usize) -> Result<usize> {
		SharedRing::write_to(self, sink, max)
	}

	fn clear(&mut self) { SharedRing::clear(self) }

	fn clean(&mut self) { SharedRing::clean(self) }

	fn can_defragment(&self) -> bool { SharedRing::can_defragment(self) }

	fn defragment(&mut self) -> Result { SharedRing::defragment(self) }
}
