// Copyright 2023 Strixpyrr
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::fmt::{Arguments, Debug};
use std::rc::Rc;
use wrapring::{EdgeHandler, Error, Pipeline, SharedRing};
use wrapring::streams::{Source, Stream};
use wrapring::transform::{Output, Step, Transform};

macro_rules! qc_assert_eq {
	($left:expr,$right:expr) => {{
		let left = $left;
		let right = $right;
		if left == right {
			TestResult::passed()
		} else {
			TestResult::error(
				common::format_qc_assert_error(&left, &right, None)
			)
		}
	}};
    ($left:expr,$right:expr,$($arg:tt)+) => {{
		let left = $left;
		let right = $right;
		if left == right {
			TestResult::passed()
		} else {
			TestResult::error(
				common::format_qc_assert_error(&left, &right, Some(format_args!($($arg)+)))
			)
		}
	}};
}

pub fn format_qc_assert_error<L: Debug, R: Debug>(left: &L, right: &R, msg: Option<Arguments>) -> String {
	if let Some(msg) = msg {
		format!(
			"assertion failed `(left == right)`: {msg}\n \
			left: `{left:?}`,\nright: `{right:?}`",
		)
	} else {
		format!(
			"assertion failed `(left == right)`:\n \
			left: `{left:?}`,\nright: `{right:?}`",
		)
	}
}

/// Returns `len` bytes of a non-repeating-looking pattern.
pub fn pattern(len: usize) -> Vec<u8> {
	(0..len).map(|i| (i * 31 % 251) as u8).collect()
}

/// Prefixes `payload` with its 32-bit big-endian length.
pub fn frame(payload: &[u8]) -> Vec<u8> {
	let mut frame = (payload.len() as u32).to_be_bytes().to_vec();
	frame.extend_from_slice(payload);
	frame
}

/// A source producing at most `step` bytes per read, like a socket receiving
/// data in small packets.
pub struct ChunkedSource {
	data: Vec<u8>,
	pos: usize,
	step: usize,
}

impl ChunkedSource {
	pub fn new(data: Vec<u8>, step: usize) -> Self {
		Self { data, pos: 0, step }
	}

	pub fn remaining(&self) -> usize { self.data.len() - self.pos }
}

impl Stream for ChunkedSource { }

impl Source for ChunkedSource {
	fn read(&mut self, dst: &mut [u8]) -> wrapring::Result<usize> {
		let count = dst.len().min(self.step).min(self.remaining());
		dst[..count].copy_from_slice(&self.data[self.pos..self.pos + count]);
		self.pos += count;
		Ok(count)
	}

	fn is_eos(&self) -> bool { self.remaining() == 0 }
}

/// Counts edges and records stream errors.
#[derive(Default)]
pub struct Recorder {
	pub readable: Cell<usize>,
	pub writable: Cell<usize>,
	pub errors: RefCell<Vec<String>>,
}

impl Recorder {
	pub fn counts(&self) -> (usize, usize, usize) {
		(self.readable.get(), self.writable.get(), self.errors.borrow().len())
	}
}

impl EdgeHandler for Recorder {
	fn readable_edge(&self) { self.readable.set(self.readable.get() + 1) }
	fn writable_edge(&self) { self.writable.set(self.writable.get() + 1) }

	fn stream_error(&self, error: &Error) {
		self.errors.borrow_mut().push(error.to_string())
	}
}

/// Registers a new [`Recorder`] on `pipeline`.
pub fn record<T: Transform + 'static>(pipeline: &Pipeline<T>) -> Rc<Recorder> {
	let recorder = Rc::new(Recorder::default());
	pipeline.add_handler(recorder.clone());
	recorder
}

/// Registers a new [`Recorder`] on `buffer`.
pub fn record_buffer(buffer: &SharedRing) -> Rc<Recorder> {
	let recorder = Rc::new(Recorder::default());
	buffer.add_handler(recorder.clone());
	recorder
}

/// Copies its input verbatim in units of exactly `size` bytes, counting calls.
/// The ceiling is checked before each unit, so the input may be left ending
/// with a partial unit.
#[derive(Clone)]
pub struct FixedChunks {
	size: usize,
	calls: Rc<Cell<usize>>,
}

impl FixedChunks {
	pub fn new(size: usize) -> Self {
		Self { size, calls: Rc::default() }
	}

	/// Returns a shared counter of transform calls.
	pub fn calls(&self) -> Rc<Cell<usize>> { self.calls.clone() }
}

impl Transform for FixedChunks {
	fn transform(&mut self, input: &[u8], output: &mut Output<'_>) -> Step {
		self.calls.set(self.calls.get() + 1);
		let mut consumed = 0;
		loop {
			if consumed == input.len() {
				return Step::Done { consumed }
			}
			if !output.fits(self.size) {
				return Step::Done { consumed }
			}

			let Some(unit) = input.get(consumed..consumed + self.size) else {
				return Step::Underflow { consumed }
			};
			if let Err(error) = output.push_slice(unit) {
				return Step::errored(error)
			}
			consumed += self.size;
		}
	}
}

/// Drains the destination of `pipeline` until it stays empty.
pub fn drain_all<T: Transform + 'static>(pipeline: &Pipeline<T>, out: &mut Vec<u8>) {
	while pipeline.write_to(out, usize::MAX).unwrap() > 0 { }
}
