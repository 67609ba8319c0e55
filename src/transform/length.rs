// SPDX-License-Identifier: Apache-2.0

//! Length-prefixed framing: each frame is a 32-bit big-endian payload length
//! followed by the payload.

use thiserror::Error;
use super::{Output, Step, Transform};

/// The length of a frame header.
pub const HEADER_LEN: usize = 4;
/// The default maximum payload length, `64KiB`.
pub const DEFAULT_MAX_FRAME: usize = 64 * 1024;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum FrameError {
	#[error("frame of {len} bytes exceeds the maximum of {max} bytes")]
	TooLong { len: usize, max: usize },
}

/// Unwraps length-prefixed frames into their payloads.
#[derive(Copy, Clone, Debug)]
pub struct LengthDecoder {
	max_frame: usize,
}

/// Wraps plain bytes into length-prefixed frames.
#[derive(Copy, Clone, Debug)]
pub struct LengthEncoder {
	max_frame: usize,
}

impl Default for LengthDecoder {
	fn default() -> Self { Self::new(DEFAULT_MAX_FRAME) }
}

impl Default for LengthEncoder {
	fn default() -> Self { Self::new(DEFAULT_MAX_FRAME) }
}

impl LengthDecoder {
	/// Creates a decoder rejecting payloads longer than `max_frame`.
	pub const fn new(max_frame: usize) -> Self { Self { max_frame } }

	/// Returns the maximum payload length.
	pub const fn max_frame(&self) -> usize { self.max_frame }
}

impl LengthEncoder {
	/// Creates an encoder splitting input into payloads of at most `max_frame`
	/// bytes.
	///
	/// # Panics
	///
	/// Panics if `max_frame` is zero or doesn't fit in the 32-bit header.
	pub const fn new(max_frame: usize) -> Self {
		assert!(max_frame > 0 && max_frame <= u32::MAX as usize, "invalid maximum frame length");
		Self { max_frame }
	}

	/// Returns the maximum payload length.
	pub const fn max_frame(&self) -> usize { self.max_frame }
}

fn read_header(input: &[u8]) -> Option<usize> {
	let header: [u8; HEADER_LEN] = input.get(..HEADER_LEN)?.try_into().ok()?;
	Some(u32::from_be_bytes(header) as usize)
}

impl Transform for LengthDecoder {
	fn transform(&mut self, input: &[u8], output: &mut Output<'_>) -> Step {
		let mut consumed = 0;
		loop {
			let rest = &input[consumed..];
			if rest.is_empty() {
				return Step::Done { consumed }
			}

			let Some(len) = read_header(rest) else {
				return Step::Underflow { consumed }
			};
			if len > self.max_frame {
				return Step::errored(FrameError::TooLong { len, max: self.max_frame })
			}

			let Some(payload) = rest.get(HEADER_LEN..HEADER_LEN + len) else {
				return Step::Underflow { consumed }
			};
			if !output.fits(len) {
				return Step::Done { consumed }
			}
			if let Err(error) = output.push_slice(payload) {
				return Step::errored(error)
			}
			consumed += HEADER_LEN + len;
		}
	}
}

impl Transform for LengthEncoder {
	fn transform(&mut self, mut input: &[u8], output: &mut Output<'_>) -> Step {
		let mut consumed = 0;
		while !input.is_empty() {
			// Payloads split anywhere, so frames are cut to the headroom. Only a
			// ceiling smaller than a one-byte frame forces one past it.
			let room = match output.headroom().saturating_sub(HEADER_LEN) {
				0 if output.fits(HEADER_LEN + 1) => 1,
				room => room
			};
			let len = input.len().min(self.max_frame).min(room);
			if len == 0 { break }
			let frame_len = HEADER_LEN + len;

			let frame = output.scratch(frame_len);
			frame[..HEADER_LEN].copy_from_slice(&(len as u32).to_be_bytes());
			frame[HEADER_LEN..frame_len].copy_from_slice(&input[..len]);
			if let Err(error) = output.push_scratch(frame_len) {
				return Step::errored(error)
			}
			input = &input[len..];
			consumed += len;
		}
		Step::Done { consumed }
	}
}
