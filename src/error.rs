// SPDX-License-Identifier: Apache-2.0

use std::{fmt, io, result};
use std::error::Error as StdError;
use std::fmt::{Display, Formatter};
use amplify_derive::Display;

pub type ErrorBox = Box<dyn StdError + Send + Sync>;
pub type Result<T = ()> = result::Result<T, Error>;

/// The operation an [`Error`] occurred in.
#[derive(Copy, Clone, Debug, Default, Display, Eq, PartialEq)]
pub enum OperationKind {
	#[default]
	#[display("unknown operation")]
	Unknown,
	#[display("store into buffer")]
	Store,
	#[display("write out of buffer")]
	Write,
	#[display("flush stream")]
	Flush,
	#[display("close stream")]
	Close,
	#[display("defragment buffer")]
	Defragment,
	#[display("transform")]
	Transform,
	#[display("emit transform output")]
	Emit,
	#[display("switch buffer")]
	Switch,
	#[display("{0}")]
	Other(&'static str)
}

#[derive(Copy, Clone, Debug, Display, Eq, PartialEq)]
pub enum ErrorKind {
	#[display("premature end-of-stream")]
	Eos,
	#[display("IO error")]
	Io,
	#[display("buffer or stream closed")]
	Closed,
	#[display("input underflow with no room left to assemble a unit")]
	Underflow,
	#[display("transform rejected its input")]
	Transform,
	#[display("intermediate ceiling reached")]
	Ceiling,
	#[display("operation not supported by this buffer")]
	Unsupported,
	#[display("{0}")]
	Rejected(&'static str),
	#[display("{0}")]
	Other(&'static str),
}

impl ErrorKind {
	/// Returns `true` if the error ends the stream: after it, a pipeline performs
	/// no further work until it's rebuilt.
	pub fn is_terminal(&self) -> bool {
		matches!(self, Self::Underflow | Self::Transform)
	}
}

#[derive(Debug)]
pub struct Error {
	op: OperationKind,
	kind: ErrorKind,
	source: Option<ErrorBox>,
}

impl Display for Error {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let Self { op, kind, source } = self;
		if let Some(source) = source {
			write!(f, "{op} failed; {kind} ({source})")
		} else {
			write!(f, "{op} failed; {kind}")
		}
	}
}

impl StdError for Error {
	fn source(&self) -> Option<&(dyn StdError + 'static)> {
		if let Some(ref source) = self.source {
			Some(source.as_ref())
		} else {
			None
		}
	}
}

impl From<io::Error> for Error {
	fn from(value: io::Error) -> Self {
		if let io::ErrorKind::UnexpectedEof = value.kind() {
			Self::eos(OperationKind::Unknown)
		} else {
			Self::io(OperationKind::Unknown, value)
		}
	}
}

impl From<&'static str> for Error {
	fn from(value: &'static str) -> Self {
		Self::other(OperationKind::Unknown, value, None)
	}
}

impl Error {
	pub(crate) fn new(
		op: OperationKind,
		kind: ErrorKind,
		source: Option<ErrorBox>
	) -> Self {
		Self { op, kind, source }
	}

	/// Creates a new error with a custom message.
	pub fn other(
		op: OperationKind,
		message: &'static str,
		source: Option<ErrorBox>
	) -> Self {
		Self::new(op, ErrorKind::Other(message), source)
	}

	/// Creates a new "end-of-stream" error.
	pub fn eos(op: OperationKind) -> Self { Self::new(op, ErrorKind::Eos, None) }

	/// Creates a new IO error.
	pub fn io(op: OperationKind, error: io::Error) -> Self {
		Self::new(op, ErrorKind::Io, Some(error.into()))
	}

	/// Creates a new "closed" error.
	pub fn closed(op: OperationKind) -> Self {
		Self::new(op, ErrorKind::Closed, None)
	}

	/// Creates a new fatal underflow error.
	pub fn underflow() -> Self {
		Self::new(OperationKind::Transform, ErrorKind::Underflow, None)
	}

	/// Creates a new error for input the transform couldn't accept.
	pub fn transform(source: Option<ErrorBox>) -> Self {
		Self::new(OperationKind::Transform, ErrorKind::Transform, source)
	}

	/// Creates a new "unsupported" error.
	pub fn unsupported(op: OperationKind) -> Self {
		Self::new(op, ErrorKind::Unsupported, None)
	}

	/// Creates a new rejected buffer switch error.
	pub fn rejected(reason: &'static str) -> Self {
		Self::new(OperationKind::Switch, ErrorKind::Rejected(reason), None)
	}

	/// Returns the operation kind.
	pub fn operation(&self) -> OperationKind { self.op }

	/// Sets the operation kind.
	pub fn with_operation(mut self, op: OperationKind) -> Self {
		self.op = op;
		self
	}

	/// Returns the error kind.
	pub fn kind(&self) -> ErrorKind { self.kind }

	/// Sets the error kind.
	pub fn with_kind(mut self, kind: ErrorKind) -> Self {
		self.kind = kind;
		self
	}

	/// Returns the source downcast into an IO Error, if possible.
	pub fn io_source(&self) -> Option<&io::Error> {
		self.source()?.downcast_ref()
	}
}

/// Attaches an operation to errors converted from foreign results.
pub(crate) trait ResultContext<T> {
	fn context(self, op: OperationKind) -> Result<T>;
}

impl<T, E: Into<Error>> ResultContext<T> for result::Result<T, E> {
	fn context(self, op: OperationKind) -> Result<T> {
		self.map_err(|err| err.into().with_operation(op))
	}
}
