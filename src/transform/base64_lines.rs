// SPDX-License-Identifier: Apache-2.0

//! Line-delimited base64: each line holds the standard, padded base64 encoding of
//! one chunk, terminated by `\n` (optionally preceded by `\r`).

use base64::{DecodeError, Engine};
use base64::prelude::BASE64_STANDARD;
use thiserror::Error;
use super::{Output, Step, Transform};

/// The default maximum encoded line length, excluding the line terminator.
pub const DEFAULT_MAX_LINE: usize = 16 * 1024;
/// The default number of input bytes encoded per line. Encodes to 76 characters.
pub const DEFAULT_LINE_INPUT: usize = 57;

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum Base64Error {
	#[error("line exceeds the maximum of {max} bytes")]
	LineTooLong { max: usize },
	#[error("invalid base64")]
	Decode(#[from] DecodeError),
}

/// Decodes base64 lines into their bytes.
#[derive(Copy, Clone, Debug)]
pub struct Base64Decoder {
	max_line: usize,
}

/// Encodes bytes into base64 lines.
#[derive(Copy, Clone, Debug)]
pub struct Base64Encoder {
	line_input: usize,
}

impl Default for Base64Decoder {
	fn default() -> Self { Self::new(DEFAULT_MAX_LINE) }
}

impl Default for Base64Encoder {
	fn default() -> Self { Self::new(DEFAULT_LINE_INPUT) }
}

impl Base64Decoder {
	/// Creates a decoder rejecting lines longer than `max_line` bytes.
	pub const fn new(max_line: usize) -> Self { Self { max_line } }

	/// Returns the maximum line length.
	pub const fn max_line(&self) -> usize { self.max_line }
}

impl Base64Encoder {
	/// Creates an encoder writing `line_input` bytes of input per line.
	///
	/// # Panics
	///
	/// Panics if `line_input` is zero.
	pub const fn new(line_input: usize) -> Self {
		assert!(line_input > 0, "line input length must be non-zero");
		Self { line_input }
	}

	/// Returns the number of input bytes encoded per line.
	pub const fn line_input(&self) -> usize { self.line_input }
}

/// The padded encoded length of `len` bytes, plus the line terminator.
fn encoded_line_len(len: usize) -> usize {
	(len + 2) / 3 * 4 + 1
}

impl Transform for Base64Decoder {
	fn transform(&mut self, input: &[u8], output: &mut Output<'_>) -> Step {
		let mut consumed = 0;
		loop {
			let rest = &input[consumed..];
			if rest.is_empty() {
				return Step::Done { consumed }
			}

			let Some(end) = rest.iter().position(|&b| b == b'\n') else {
				return if rest.len() > self.max_line {
					Step::errored(Base64Error::LineTooLong { max: self.max_line })
				} else {
					Step::Underflow { consumed }
				}
			};

			let line = &rest[..end];
			let line = line.strip_suffix(b"\r").unwrap_or(line);
			if line.len() > self.max_line {
				return Step::errored(Base64Error::LineTooLong { max: self.max_line })
			}
			if line.is_empty() {
				consumed += end + 1;
				continue
			}

			if !output.fits(line.len() / 4 * 3) {
				return Step::Done { consumed }
			}

			let mut chunk = Vec::with_capacity(line.len() / 4 * 3);
			if let Err(error) = BASE64_STANDARD.decode_vec(line, &mut chunk) {
				return Step::errored(Base64Error::from(error))
			}
			if let Err(error) = output.push(chunk) {
				return Step::errored(error)
			}
			consumed += end + 1;
		}
	}
}

impl Transform for Base64Encoder {
	fn transform(&mut self, mut input: &[u8], output: &mut Output<'_>) -> Step {
		let mut consumed = 0;
		while !input.is_empty() {
			// Lines are cut to the largest whole number of 3-byte groups that fits
			// the headroom. Only a ceiling smaller than one group's line forces a
			// line past it.
			let room = match output.headroom().saturating_sub(1) / 4 * 3 {
				0 if output.fits(encoded_line_len(3)) => 3,
				room => room
			};
			let len = input.len().min(self.line_input).min(room);
			if len == 0 { break }
			let line_len = encoded_line_len(len);

			let mut line = String::with_capacity(line_len);
			BASE64_STANDARD.encode_string(&input[..len], &mut line);
			line.push('\n');
			if let Err(error) = output.push(line.into_bytes()) {
				return Step::errored(error)
			}
			input = &input[len..];
			consumed += len;
		}
		Step::Done { consumed }
	}
}
