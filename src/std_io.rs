// SPDX-License-Identifier: Apache-2.0

use std::io;
use std::io::{Read, Write};
use tracing::trace;
use crate::{Error, ResultContext, Result};
use crate::error::OperationKind::{Close, Flush, Store, Write as WriteOp};
use crate::streams::{Sink, Source, Stream};

/// A [`Source`] reading from a wrapped [`Read`]er, usually a socket configured as
/// non-blocking.
pub struct ReaderSource<R: Read> {
	reader: Option<R>,
	is_eos: bool,
}

/// A [`Sink`] writing to a wrapped [`Write`]r, usually a socket configured as
/// non-blocking.
pub struct WriterSink<W: Write> {
	writer: Option<W>,
}

impl<R: Read> From<R> for ReaderSource<R> {
	fn from(reader: R) -> Self {
		Self {
			reader: Some(reader),
			is_eos: false,
		}
	}
}

impl<W: Write> From<W> for WriterSink<W> {
	fn from(writer: W) -> Self {
		Self { writer: Some(writer) }
	}
}

impl<R: Read> ReaderSource<R> {
	/// Consumes the source, returning the reader if it hasn't been closed.
	pub fn into_inner(self) -> Option<R> { self.reader }
}

impl<W: Write> WriterSink<W> {
	/// Returns a reference to the writer, if it hasn't been closed.
	pub fn get_ref(&self) -> Option<&W> { self.writer.as_ref() }

	/// Consumes the sink, returning the writer if it hasn't been closed.
	pub fn into_inner(self) -> Option<W> { self.writer }
}

/// Maps the "try again" kinds of a non-blocking stream to an empty transfer.
fn non_blocking(result: io::Result<usize>) -> io::Result<usize> {
	match result {
		Err(err) if matches!(
			err.kind(),
			io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
		) => Ok(0),
		result => result
	}
}

impl<R: Read> Stream for ReaderSource<R> {
	fn is_closed(&self) -> bool {
		self.reader.is_none()
	}

	/// Closes the underlying reader by letting it fall out of scope. Subsequent
	/// reads will fail.
	fn close(&mut self) -> Result {
		self.reader.take();
		Ok(())
	}
}

impl<R: Read> Source for ReaderSource<R> {
	fn read(&mut self, dst: &mut [u8]) -> Result<usize> {
		if self.is_eos || dst.is_empty() { return Ok(0) }
		let reader = self.reader
						 .as_mut()
						 .ok_or_else(|| Error::closed(Store))?;
		match reader.read(dst) {
			Ok(0) => {
				trace!("reader reached end-of-stream");
				self.is_eos = true;
				Ok(0)
			}
			result => non_blocking(result).context(Store)
		}
	}

	fn is_eos(&self) -> bool { self.is_eos }
}

impl<W: Write> Stream for WriterSink<W> {
	fn is_closed(&self) -> bool {
		self.writer.is_none()
	}

	/// Flushes then closes the underlying writer by letting it fall out of scope.
	/// Subsequent writes will fail.
	fn close(&mut self) -> Result {
		if let Some(mut writer) = self.writer.take() {
			writer.flush().context(Close)?;
		}
		Ok(())
	}
}

impl<W: Write> Sink for WriterSink<W> {
	fn write(&mut self, src: &[u8]) -> Result<usize> {
		let writer = self.writer.as_mut().ok_or_else(|| Error::closed(WriteOp))?;
		non_blocking(writer.write(src)).context(WriteOp)
	}

	fn flush(&mut self) -> Result {
		let writer = self.writer.as_mut().ok_or_else(|| Error::closed(Flush))?;
		match writer.flush() {
			Err(err) if err.kind() == io::ErrorKind::WouldBlock => Ok(()),
			result => result.context(Flush)
		}
	}
}

#[cfg(test)]
mod test {
	use std::io;
	use std::io::{Read, Write};
	use crate::ErrorKind;
	use crate::streams::{Sink, Source, Stream};
	use super::{ReaderSource, WriterSink};

	/// Reads `WouldBlock` once, then the data, then EOF.
	struct Pending<'a> {
		blocked: bool,
		data: &'a [u8],
	}

	impl Read for Pending<'_> {
		fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
			if !self.blocked {
				self.blocked = true;
				return Err(io::ErrorKind::WouldBlock.into())
			}
			Read::read(&mut self.data, buf)
		}
	}

	#[test]
	fn read_would_block() {
		let mut source = ReaderSource::from(Pending { blocked: false, data: b"ping" });
		let mut buf = [0; 8];
		assert_eq!(source.read(&mut buf).unwrap(), 0);
		assert!(!source.is_eos());
		assert_eq!(source.read(&mut buf).unwrap(), 4);
		assert_eq!(&buf[..4], b"ping");
		assert_eq!(source.read(&mut buf).unwrap(), 0);
		assert!(source.is_eos());
	}

	#[test]
	fn closed() {
		let mut source = ReaderSource::from(&b"data"[..]);
		source.close().unwrap();
		assert!(source.is_closed());
		let err = source.read(&mut [0; 4]).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::Closed);

		let mut sink = WriterSink::from(Vec::new());
		sink.close().unwrap();
		sink.close().unwrap();
		assert_eq!(sink.write(b"data").unwrap_err().kind(), ErrorKind::Closed);
	}

	struct Full;

	impl Write for Full {
		fn write(&mut self, _: &[u8]) -> io::Result<usize> {
			Err(io::ErrorKind::WouldBlock.into())
		}

		fn flush(&mut self) -> io::Result<()> { Ok(()) }
	}

	#[test]
	fn write_would_block() {
		let mut sink = WriterSink::from(Full);
		assert_eq!(sink.write(b"data").unwrap(), 0);

		let mut sink = WriterSink::from(Vec::new());
		assert_eq!(sink.write(b"data").unwrap(), 4);
		assert_eq!(sink.get_ref().map(Vec::as_slice), Some(&b"data"[..]));
	}
}
