// SPDX-License-Identifier: Apache-2.0

use super::{Output, Step, Transform};

/// A transform copying its input verbatim, in chunks of at most a set size.
#[derive(Copy, Clone, Debug)]
pub struct Identity {
	chunk_size: usize,
}

impl Default for Identity {
	fn default() -> Self { Self::new() }
}

impl Identity {
	/// Creates a transform copying each input into one chunk.
	pub const fn new() -> Self { Self { chunk_size: usize::MAX } }

	/// Creates a transform copying its input into chunks of at most `chunk_size`
	/// bytes.
	///
	/// # Panics
	///
	/// Panics if `chunk_size` is zero.
	pub const fn chunked(chunk_size: usize) -> Self {
		assert!(chunk_size > 0, "chunk size must be non-zero");
		Self { chunk_size }
	}

	/// Returns the maximum chunk size.
	pub const fn chunk_size(&self) -> usize { self.chunk_size }
}

impl Transform for Identity {
	fn transform(&mut self, mut input: &[u8], output: &mut Output<'_>) -> Step {
		let mut consumed = 0;
		while !input.is_empty() {
			// Bytes have no unit boundaries, so chunks are cut to the headroom.
			let len = input.len()
						   .min(self.chunk_size)
						   .min(output.headroom());
			if len == 0 { break }

			if let Err(error) = output.push_slice(&input[..len]) {
				return Step::errored(error)
			}
			input = &input[len..];
			consumed += len;
		}
		Step::Done { consumed }
	}
}
