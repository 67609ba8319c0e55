// SPDX-License-Identifier: Apache-2.0

use std::collections::VecDeque;
use crate::ring::{ByteRing, RingBuffer};

/// An ordered queue of transform output segments awaiting drain. Segments are
/// drained strictly in insertion order; drained segments are never kept.
#[derive(Debug, Default)]
pub struct IntermediateQueue {
	segments: VecDeque<ByteRing>,
	/// The number of undrained bytes across all segments.
	bytes: usize,
}

impl IntermediateQueue {
	/// Creates a new, empty queue.
	pub fn new() -> Self { Self::default() }

	/// Returns the number of segments in the queue.
	pub fn len(&self) -> usize { self.segments.len() }

	/// Returns `true` if the queue holds no segments.
	pub fn is_empty(&self) -> bool { self.segments.is_empty() }

	/// Returns the number of undrained bytes in the queue.
	pub fn byte_size(&self) -> usize { self.bytes }

	/// Appends `segment` to the back of the queue. Empty segments are dropped.
	pub fn push_back(&mut self, segment: ByteRing) {
		if segment.is_empty() { return }
		self.bytes += segment.used();
		self.segments.push_back(segment);
	}

	/// Returns a partially drained head segment to the front of the queue. Empty
	/// segments are dropped.
	pub fn push_front(&mut self, segment: ByteRing) {
		if segment.is_empty() { return }
		self.bytes += segment.used();
		self.segments.push_front(segment);
	}

	/// Removes the head segment.
	pub fn pop_front(&mut self) -> Option<ByteRing> {
		let segment = self.segments.pop_front()?;
		self.bytes -= segment.used();
		Some(segment)
	}

	/// Drops all segments.
	pub fn clear(&mut self) {
		self.segments.clear();
		self.bytes = 0;
	}
}
