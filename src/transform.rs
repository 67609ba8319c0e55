// SPDX-License-Identifier: Apache-2.0

//! Stream transforms, converting bytes from a source buffer into chunks of output
//! queued for a destination buffer.

mod base64_lines;
mod identity;
mod length;

pub use base64_lines::*;
pub use identity::*;
pub use length::*;

use tracing::trace;
use crate::{Error, ErrorBox, Result};
use crate::error::ErrorKind::Ceiling;
use crate::error::OperationKind::Emit;
use crate::queue::IntermediateQueue;
use crate::ring::ByteRing;

/// Converts a byte stream from one format to another, unit by unit.
///
/// The transform is given the readable bytes of its source buffer and emits any
/// number of output chunks. It must consume only complete units; a trailing
/// partial unit is left in place and offered again, with more bytes after it,
/// on a later call.
pub trait Transform {
	/// Transforms complete units at the start of `input`, pushing their output to
	/// `output`.
	fn transform(&mut self, input: &[u8], output: &mut Output<'_>) -> Step;
}

impl<F: FnMut(&[u8], &mut Output<'_>) -> Step> Transform for F {
	fn transform(&mut self, input: &[u8], output: &mut Output<'_>) -> Step {
		self(input, output)
	}
}

/// The outcome of one [`Transform::transform`] call.
#[derive(Debug)]
pub enum Step {
	/// All complete units that fit were transformed. `consumed` may be less than
	/// the input length if the output would have exceeded its ceiling.
	Done { consumed: usize },
	/// The input ended with an incomplete unit, starting at `consumed`.
	Underflow { consumed: usize },
	/// The input is malformed. The stream can't continue.
	Errored(ErrorBox),
}

impl Step {
	/// Creates a [`Step::Errored`] from any error.
	pub fn errored(error: impl Into<ErrorBox>) -> Self {
		Self::Errored(error.into())
	}

	/// Returns the number of input bytes consumed, `0` if errored.
	pub fn consumed(&self) -> usize {
		match self {
			Self::Done { consumed } |
			Self::Underflow { consumed } => *consumed,
			Self::Errored(_) => 0
		}
	}

	/// Returns `true` if the input ended with an incomplete unit.
	pub fn is_underflow(&self) -> bool { matches!(self, Self::Underflow { .. }) }
}

/// The output of a transform, appending chunks to the intermediate queue.
///
/// The queue is bounded by a ceiling: a chunk is accepted only if it fits within
/// the [`headroom`](Self::headroom), or if the queue is empty. Transforms should
/// check [`fits`](Self::fits) before consuming a unit, and stop when it doesn't
/// fit, leaving the unit for the next call.
pub struct Output<'a> {
	queue: &'a mut IntermediateQueue,
	scratch: &'a mut Scratch,
	ceiling: usize,
	emitted: usize,
}

impl<'a> Output<'a> {
	pub(crate) fn new(
		queue: &'a mut IntermediateQueue,
		scratch: &'a mut Scratch,
		ceiling: usize
	) -> Self {
		Self { queue, scratch, ceiling, emitted: 0 }
	}

	/// Returns the number of bytes that can be pushed before reaching the ceiling.
	pub fn headroom(&self) -> usize {
		self.ceiling.saturating_sub(self.queue.byte_size())
	}

	/// Returns `true` if a chunk of `len` bytes would be accepted.
	pub fn fits(&self, len: usize) -> bool {
		self.queue.is_empty() || len <= self.headroom()
	}

	/// Returns the number of bytes pushed through this output.
	pub fn emitted(&self) -> usize { self.emitted }

	/// Pushes an owned chunk without copying it. Empty chunks are ignored.
	pub fn push(&mut self, chunk: Vec<u8>) -> Result {
		let len = chunk.len();
		if len == 0 { return Ok(()) }
		if !self.fits(len) {
			return Err(Error::new(Emit, Ceiling, None))
		}

		self.queue.push_back(ByteRing::wrap(chunk));
		self.emitted += len;
		Ok(())
	}

	/// Pushes a copy of `chunk`.
	pub fn push_slice(&mut self, chunk: &[u8]) -> Result {
		if chunk.is_empty() { return Ok(()) }
		self.push(chunk.to_vec())
	}

	/// Returns the scratch buffer, at least `min_len` bytes long, to assemble a
	/// chunk in. Its content is unspecified.
	pub fn scratch(&mut self, min_len: usize) -> &mut [u8] {
		self.scratch.get(min_len)
	}

	/// Pushes a copy of the first `len` bytes of the scratch buffer. If `len` is
	/// more than the scratch buffer length, the buffer is grown with zeros first,
	/// as [`scratch`](Self::scratch) would.
	pub fn push_scratch(&mut self, len: usize) -> Result {
		let chunk = self.scratch.get(len)[..len].to_vec();
		self.push(chunk)
	}

	/// Releases the scratch buffer's memory.
	pub fn discard_scratch(&mut self) { self.scratch.discard() }
}

/// A lazily allocated buffer for transforms to assemble output in. It grows to
/// fit the largest request, and is never shrunk except by discarding it.
#[derive(Debug, Default)]
pub struct Scratch {
	buf: Vec<u8>,
}

impl Scratch {
	/// Returns the buffer, growing it to at least `min_len` bytes.
	pub fn get(&mut self, min_len: usize) -> &mut [u8] {
		if self.buf.len() < min_len {
			trace!(from = self.buf.len(), to = min_len, "growing scratch buffer");
			self.buf.resize(min_len, 0);
		}
		&mut self.buf
	}

	/// Returns the allocated length.
	pub fn capacity(&self) -> usize { self.buf.len() }

	/// Releases the buffer's memory.
	pub fn discard(&mut self) {
		self.buf = Vec::new();
	}
}

#[cfg(test)]
mod test {
	use pretty_assertions::assert_eq;
	use crate::ErrorKind;
	use crate::queue::IntermediateQueue;
	use crate::ring::RingBuffer;
	use super::{Output, Scratch, Step, Transform};

	#[test]
	fn ceiling() {
		let mut queue = IntermediateQueue::new();
		let mut scratch = Scratch::default();
		let mut output = Output::new(&mut queue, &mut scratch, 8);
		assert!(output.fits(100));
		output.push(vec![0; 12]).unwrap();
		assert_eq!(output.headroom(), 0);
		assert!(!output.fits(1));
		assert_eq!(output.push_slice(b"a").unwrap_err().kind(), ErrorKind::Ceiling);
		output.push(Vec::new()).unwrap();
		assert_eq!(output.emitted(), 12);
		assert_eq!(queue.len(), 1);
	}

	#[test]
	fn scratch_grows() {
		let mut queue = IntermediateQueue::new();
		let mut scratch = Scratch::default();
		let mut output = Output::new(&mut queue, &mut scratch, 64);
		output.scratch(4)[..4].copy_from_slice(b"abcd");
		assert_eq!(output.scratch(2).len(), 4);
		output.push_scratch(3).unwrap();
		assert_eq!(output.scratch(16).len(), 16);
		output.discard_scratch();
		assert_eq!(scratch.capacity(), 0);
		assert_eq!(queue.byte_size(), 3);
	}

	#[test]
	fn push_scratch_past_length() {
		let mut queue = IntermediateQueue::new();
		let mut scratch = Scratch::default();
		let mut output = Output::new(&mut queue, &mut scratch, 64);
		output.scratch(2).copy_from_slice(b"ab");
		output.push_scratch(4).unwrap();
		assert_eq!(output.emitted(), 4);
		assert_eq!(scratch.capacity(), 4);

		let mut out = Vec::new();
		while let Some(mut segment) = queue.pop_front() {
			segment.write_to(&mut out, usize::MAX).unwrap();
		}
		assert_eq!(out, b"ab\0\0");
	}

	#[test]
	fn closure() {
		let mut upper = |input: &[u8], output: &mut Output<'_>| {
			match output.push(input.to_ascii_uppercase()) {
				Ok(()) => Step::Done { consumed: input.len() },
				Err(error) => Step::errored(error)
			}
		};
		let mut queue = IntermediateQueue::new();
		let mut scratch = Scratch::default();
		let step = upper.transform(b"abc", &mut Output::new(&mut queue, &mut scratch, 8));
		assert_eq!(step.consumed(), 3);
		assert!(!step.is_underflow());
		assert_eq!(queue.byte_size(), 3);
	}
}
