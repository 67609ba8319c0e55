// SPDX-License-Identifier: Apache-2.0

//! A fixed-capacity byte ring over a single region of memory.

use std::fmt;
use std::fmt::{Debug, Formatter};
use all_asserts::debug_assert_le;
use tracing::trace;
use crate::{Error, Result};
use crate::error::OperationKind::{Defragment, Store, Write};
use crate::streams::{Sink, Source};
use super::{Region, RingBuffer, Stored};

/// A fixed-capacity byte ring. Content is contiguous in logical order, but may
/// wrap around the end of the region; [`as_slices`](Self::as_slices) exposes up
/// to two slices that yield the content when concatenated.
pub struct ByteRing {
	buf: Box<[u8]>,
	cap: usize,
	head: usize,
	len: usize,
	region: Region,
	cleaned: bool,
}

impl ByteRing {
	/// Creates an empty ring of `capacity` bytes in `region`.
	pub fn new(capacity: usize, region: Region) -> Self {
		Self {
			buf: vec![0; capacity].into_boxed_slice(),
			cap: capacity,
			head: 0,
			len: 0,
			region,
			cleaned: false,
		}
	}

	/// Creates an empty ring of `capacity` bytes of heap memory.
	pub fn heap(capacity: usize) -> Self { Self::new(capacity, Region::Heap) }

	/// Creates an empty ring of `capacity` bytes in a fixed region.
	pub fn fixed(capacity: usize) -> Self { Self::new(capacity, Region::Fixed) }

	/// Creates a full ring from `chunk` without copying it. The ring's capacity is
	/// the chunk length.
	pub fn wrap(chunk: Vec<u8>) -> Self {
		let len = chunk.len();
		Self {
			buf: chunk.into_boxed_slice(),
			cap: len,
			head: 0,
			len,
			region: Region::Heap,
			cleaned: false,
		}
	}

	/// Returns the region kind backing the ring.
	pub fn region(&self) -> Region { self.region }
	/// Returns `true` if the ring is empty.
	pub fn is_empty(&self) -> bool { self.len == 0 }
	/// Returns `true` if the ring is full.
	pub fn is_full(&self) -> bool { self.len == self.cap }
	/// Returns `true` if the ring was cleaned.
	pub fn is_cleaned(&self) -> bool { self.cleaned }
	/// Returns `true` if the content doesn't wrap around the end of the region.
	pub fn is_contiguous(&self) -> bool { self.head + self.len <= self.cap }

	/// Returns a pair of slices which contain the content of the ring.
	pub fn as_slices(&self) -> (&[u8], &[u8]) {
		if self.len == 0 {
			return (&[], &[])
		}

		if self.is_contiguous() {
			(&self.buf[self.head..self.head + self.len], &[])
		} else {
			let wrapped = self.head + self.len - self.cap;
			(&self.buf[self.head..], &self.buf[..wrapped])
		}
	}

	/// Returns the first contiguous span of content. This is all content when the
	/// ring [is contiguous](Self::is_contiguous).
	pub fn readable(&self) -> &[u8] { self.as_slices().0 }

	/// Returns a pair of mutable slices covering the free space, in write order.
	fn free_slices_mut(&mut self) -> (&mut [u8], &mut [u8]) {
		if self.len == self.cap {
			return (&mut [], &mut [])
		}

		let tail = self.wrap_index(self.head + self.len);
		if tail >= self.head {
			let head = self.head;
			let (front, back) = self.buf.split_at_mut(tail);
			(back, &mut front[..head])
		} else {
			(&mut self.buf[tail..self.head], &mut [])
		}
	}

	fn wrap_index(&self, index: usize) -> usize {
		if self.cap == 0 { 0 } else { index % self.cap }
	}

	/// Marks `count` bytes of free space, written through
	/// [`free_slices_mut`](Self::free_slices_mut), as content.
	fn commit(&mut self, count: usize) {
		debug_assert_le!(count, self.cap - self.len);
		self.len += count;
	}

	/// Discards `count` bytes from the front of the ring.
	///
	/// # Panics
	///
	/// Panics if `count` is more than the number of bytes in the ring.
	pub fn consume(&mut self, count: usize) {
		assert!(count <= self.len, "cannot consume {count} of {} bytes", self.len);
		self.len -= count;
		self.head = if self.len == 0 {
			0
		} else {
			self.wrap_index(self.head + count)
		};
	}

	/// Copies as much of `data` as fits into the ring, returning the number of
	/// bytes copied.
	pub fn store_slice(&mut self, mut data: &[u8]) -> Result<usize> {
		if self.cleaned { return Err(Error::closed(Store)) }
		let mut count = 0;
		while !data.is_empty() {
			let (dst, _) = self.free_slices_mut();
			let n = dst.len().min(data.len());
			if n == 0 { break }
			dst[..n].copy_from_slice(&data[..n]);
			self.commit(n);
			data = &data[n..];
			count += n;
		}
		Ok(count)
	}
}

impl RingBuffer for ByteRing {
	fn capacity(&self) -> usize { self.cap }

	fn used(&self) -> usize { self.len }

	fn store_from(&mut self, source: &mut (impl Source + ?Sized)) -> Result<Stored> {
		if self.cleaned { return Err(Error::closed(Store)) }
		if self.is_full() { return Ok(Stored::Bytes(0)) }

		let mut count = 0;
		loop {
			let (dst, _) = self.free_slices_mut();
			let wanted = dst.len();
			if wanted == 0 { break }
			let read = source.read(dst)?;
			debug_assert_le!(read, wanted);
			self.commit(read);
			count += read;
			if read < wanted { break }
		}

		if count == 0 && source.is_eos() {
			Ok(Stored::Eos)
		} else {
			Ok(Stored::Bytes(count))
		}
	}

	fn write_to(&mut self, sink: &mut (impl Sink + ?Sized), max: usize) -> Result<usize> {
		if self.cleaned { return Err(Error::closed(Write)) }

		let mut count = 0;
		while count < max {
			let (src, _) = self.as_slices();
			let wanted = src.len().min(max - count);
			if wanted == 0 { break }
			let written = sink.write(&src[..wanted])?;
			debug_assert_le!(written, wanted);
			self.consume(written);
			count += written;
			if written < wanted { break }
		}
		Ok(count)
	}

	fn clear(&mut self) {
		self.head = 0;
		self.len = 0;
	}

	fn clean(&mut self) {
		if self.cleaned { return }
		self.clear();
		self.buf = Box::default();
		self.cleaned = true;
	}

	fn can_defragment(&self) -> bool {
		self.region.is_relocatable() && !self.cleaned
	}

	fn defragment(&mut self) -> Result {
		if self.cleaned { return Err(Error::closed(Defragment)) }
		if !self.region.is_relocatable() {
			return Err(Error::unsupported(Defragment))
		}

		if self.head > 0 {
			trace!(head = self.head, len = self.len, "defragmenting ring");
			self.buf.rotate_left(self.head);
			self.head = 0;
		}
		Ok(())
	}
}

impl Debug for ByteRing {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("ByteRing")
		 .field("capacity", &self.cap)
		 .field("head", &self.head)
		 .field("len", &self.len)
		 .field("region", &self.region)
		 .field("cleaned", &self.cleaned)
		 .finish_non_exhaustive()
	}
}
