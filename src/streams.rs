// SPDX-License-Identifier: Apache-2.0

//! Non-blocking byte streams that buffers are filled from and drained into.

mod void;

pub use void::*;

use crate::Result;

/// A data stream, either [`Source`] or [`Sink`].
pub trait Stream {
	/// Returns `true` if the stream is closed.
	fn is_closed(&self) -> bool { false }

	/// Closes the stream. Closing is idempotent, [`close`] may be called more than
	/// once with no effect.
	///
	/// [`close`]: Self::close
	fn close(&mut self) -> Result { Ok(()) }
}

/// A non-blocking data source.
pub trait Source: Stream {
	/// Reads at most `dst.len()` bytes into `dst`, returning the number of bytes
	/// read. Returns `0` without blocking when no data is available yet; whether
	/// `0` means end-of-stream is reported by [`is_eos`](Self::is_eos).
	fn read(&mut self, dst: &mut [u8]) -> Result<usize>;

	/// Returns `true` if the source reached its end, and will never produce more
	/// data.
	fn is_eos(&self) -> bool;
}

/// A non-blocking data sink.
pub trait Sink: Stream {
	/// Writes at most `src.len()` bytes from `src`, returning the number of bytes
	/// accepted. Returns `0` without blocking when the sink can't accept data yet.
	fn write(&mut self, src: &[u8]) -> Result<usize>;

	/// Writes all buffered data to its final target.
	fn flush(&mut self) -> Result { Ok(()) }
}

impl Stream for &[u8] { }

impl Source for &[u8] {
	fn read(&mut self, dst: &mut [u8]) -> Result<usize> {
		let count = dst.len().min(self.len());
		let (data, rest) = self.split_at(count);
		dst[..count].copy_from_slice(data);
		*self = rest;
		Ok(count)
	}

	fn is_eos(&self) -> bool { self.is_empty() }
}

impl Stream for Vec<u8> { }

impl Sink for Vec<u8> {
	fn write(&mut self, src: &[u8]) -> Result<usize> {
		self.extend_from_slice(src);
		Ok(src.len())
	}
}
