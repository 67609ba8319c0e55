// SPDX-License-Identifier: Apache-2.0

mod byte_ring;
mod shared;

pub use byte_ring::*;
pub use shared::*;

use crate::{Error, Result};
use crate::error::OperationKind::Defragment;
use crate::streams::{Sink, Source};

/// The result of storing bytes from a [`Source`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Stored {
	/// Some number of bytes were stored, possibly none if the buffer was full or
	/// the source had nothing to read.
	Bytes(usize),
	/// The source reached its end. Callers should propagate this rather than
	/// retry.
	Eos,
}

impl Stored {
	/// Returns the number of bytes stored, `0` at end-of-stream.
	pub fn count(self) -> usize {
		match self {
			Self::Bytes(count) => count,
			Self::Eos => 0
		}
	}

	/// Returns `true` if the source reached its end.
	pub fn is_eos(self) -> bool { matches!(self, Self::Eos) }
}

/// The kind of memory backing a ring buffer.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Region {
	/// Relocatable heap memory. Content can be moved to defragment the buffer.
	#[default]
	Heap,
	/// A fixed, non-relocatable region, such as memory registered with a device.
	/// Content never moves, so the buffer can't be defragmented.
	Fixed,
}

impl Region {
	/// Returns `true` if content in the region can be moved.
	pub fn is_relocatable(&self) -> bool { matches!(self, Self::Heap) }
}

/// A fixed-capacity byte buffer, filled from [`Source`]s and drained into
/// [`Sink`]s without blocking. At all times, `used() + free() == capacity()`.
pub trait RingBuffer {
	/// Returns the number of bytes the buffer can hold. Fixed at construction.
	fn capacity(&self) -> usize;

	/// Returns the number of readable bytes in the buffer.
	fn used(&self) -> usize;

	/// Returns the number of bytes that can be stored before the buffer is full.
	fn free(&self) -> usize { self.capacity() - self.used() }

	/// Stores as many bytes from `source` as fit in the free space. Returns
	/// [`Stored::Eos`] if the source ended before any byte could be read.
	fn store_from(&mut self, source: &mut (impl Source + ?Sized)) -> Result<Stored>;

	/// Writes at most `max` bytes into `sink`, returning the number of bytes
	/// written.
	fn write_to(&mut self, sink: &mut (impl Sink + ?Sized), max: usize) -> Result<usize>;

	/// Discards all content, keeping the backing memory.
	fn clear(&mut self);

	/// Releases the backing memory. The buffer can't be used after cleaning.
	/// Cleaning is idempotent.
	fn clean(&mut self);

	/// Returns `true` if the buffer supports [`defragment`](Self::defragment).
	fn can_defragment(&self) -> bool { false }

	/// Moves wrapped content into one contiguous run, maximizing the contiguous
	/// readable and writable spans.
	fn defragment(&mut self) -> Result {
		Err(Error::unsupported(Defragment))
	}
}

/// A buffer whose application-facing storage can be replaced at runtime.
pub trait Switch {
	/// Replaces the current buffer with `buffer`, returning the previous one. The
	/// switch is rejected, with no effect, if the current buffer isn't empty or
	/// `buffer` differs in capacity or region.
	fn switch_buffer(&mut self, buffer: SharedRing) -> Result<SharedRing>;
}
