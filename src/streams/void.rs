// SPDX-License-Identifier: Apache-2.0

use crate::Result;
use super::{Sink, Source, Stream};

/// Returns a [`Sink`] that writes to nowhere, dropping any data written to it.
pub fn void_sink() -> VoidSink { VoidSink }

/// Returns a [`Source`] that reads from nowhere, producing no data.
pub fn void_source() -> VoidSource { VoidSource }

/// A [`Sink`] that writes to nowhere, dropping any data written to it.
#[derive(Copy, Clone, Debug, Default)]
pub struct VoidSink;

impl Stream for VoidSink { }

impl Sink for VoidSink {
	/// Accepts and drops all of `src`.
	fn write(&mut self, src: &[u8]) -> Result<usize> {
		Ok(src.len())
	}
}

/// A [`Source`] that reads from nowhere, producing no data. It never reaches its
/// end, behaving like a socket with nothing to read.
#[derive(Copy, Clone, Debug, Default)]
pub struct VoidSource;

impl Stream for VoidSource { }

impl Source for VoidSource {
	/// Reads nothing, returning `0`.
	fn read(&mut self, _dst: &mut [u8]) -> Result<usize> {
		Ok(0)
	}

	fn is_eos(&self) -> bool { false }
}
