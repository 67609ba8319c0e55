// SPDX-License-Identifier: Apache-2.0

//! The transform pipeline, moving bytes from a source buffer through a transform
//! into a destination buffer.
//!
//! ## How it works
//!
//! Bytes stored into the pipeline land in its *source* buffer, owned by the
//! pipeline. Each *run* invokes the transform over the source's readable bytes,
//! queueing its output chunks as *segments* in the intermediate queue, then drains
//! the queue into the *destination* buffer, shared with the owning connection. A
//! run repeats both phases until neither makes progress.
//!
//! The queue is bounded by the intermediate ceiling. Once its size reaches the
//! ceiling, the transform isn't invoked until the destination drains some of it.
//! Input then backs up into the source buffer, and from there to the connection:
//! when the source is full, the pipeline has no free space to store into.
//!
//! Runs are started by storing into the pipeline, by the destination becoming
//! writable and by switching the destination buffer. A run started while another
//! is in progress, from an edge handler for example, returns immediately; the
//! active run re-evaluates all conditions before returning.
//!
//! ### Underflow
//!
//! A transform *underflows* when the source ends with an incomplete unit. The
//! source is defragmented, if it can be, so the next store has the most room to
//! complete the unit. A unit which can never be assembled, because the source is
//! full or its wrapped content can't be made contiguous, fails the pipeline.
//!
//! ### Failure
//!
//! Underflow with no room left and transform errors are terminal: the failure is
//! logged, reported once through [`EdgeHandler::stream_error`], and the pipeline
//! performs no further work. Only this direction of the stream fails; closing the
//! connection is up to its owner.

mod guard;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::rc::{Rc, Weak};
use amplify_derive::Display;
use tracing::{debug, error, trace, warn};
use guard::OperatingGuard;
use crate::{Error, ErrorKind, Result};
use crate::edge::{EdgeHandler, Handlers};
use crate::error::OperationKind;
use crate::options::PipelineOptions;
use crate::queue::IntermediateQueue;
use crate::ring::{ByteRing, RingBuffer, SharedRing, Stored, Switch};
use crate::streams::{Sink, Source};
use crate::transform::{Output, Scratch, Step, Transform};

/// The direction a pipeline transforms in.
#[derive(Copy, Clone, Debug, Display, Eq, PartialEq)]
pub enum Direction {
	/// Wire-format bytes into plain application bytes.
	#[display("unwrap")]
	Unwrap,
	/// Plain application bytes into wire-format bytes.
	#[display("wrap")]
	Wrap,
}

/// A transform pipeline between a source buffer, which it owns, and a shared
/// destination buffer.
///
/// Edges from the destination are forwarded: a readable edge is proxied to the
/// pipeline's handlers, a writable edge resumes draining the intermediate queue.
/// The pipeline emits a writable edge of its own at the end of a run which freed
/// capacity, telling the producer more bytes can be stored.
pub struct Pipeline<T: Transform + 'static> {
	engine: Rc<Engine<T>>,
}

struct Engine<T: Transform + 'static> {
	direction: Direction,
	options: PipelineOptions,
	source: RefCell<ByteRing>,
	queue: RefCell<IntermediateQueue>,
	scratch: RefCell<Scratch>,
	transform: RefCell<T>,
	destination: RefCell<SharedRing>,
	/// Registered on the destination.
	listener: Rc<dyn EdgeHandler>,
	handlers: Handlers,
	operating: Cell<bool>,
	pending_writable: Cell<bool>,
	failure: Cell<Option<ErrorKind>>,
}

/// Receives edges from the destination buffer.
struct Listener<T: Transform + 'static> {
	engine: Weak<Engine<T>>,
}

impl<T: Transform + 'static> EdgeHandler for Listener<T> {
	fn readable_edge(&self) {
		if let Some(engine) = self.engine.upgrade() {
			engine.handlers.readable()
		}
	}

	fn writable_edge(&self) {
		if let Some(engine) = self.engine.upgrade() {
			engine.run()
		}
	}
}

impl<T: Transform + 'static> Pipeline<T> {
	/// Creates a pipeline unwrapping into `destination` with default options.
	pub fn unwrapping(destination: SharedRing, transform: T) -> Result<Self> {
		Self::with_options(Direction::Unwrap, destination, transform, PipelineOptions::default())
	}

	/// Creates a pipeline wrapping into `destination` with default options.
	pub fn wrapping(destination: SharedRing, transform: T) -> Result<Self> {
		Self::with_options(Direction::Wrap, destination, transform, PipelineOptions::default())
	}

	/// Creates a pipeline transforming into `destination` with `options`.
	pub fn with_options(
		direction: Direction,
		destination: SharedRing,
		transform: T,
		options: PipelineOptions
	) -> Result<Self> {
		options.validate()?;
		let capacity = options.source_capacity().unwrap_or(destination.capacity());
		if capacity == 0 {
			return Err(Error::other(
				OperationKind::Other("create pipeline"),
				"source capacity must be non-zero",
				None
			))
		}

		let engine = Rc::new_cyclic(|engine: &Weak<Engine<T>>| Engine {
			direction,
			options,
			source: RefCell::new(ByteRing::new(capacity, options.source_region())),
			queue: RefCell::default(),
			scratch: RefCell::default(),
			transform: RefCell::new(transform),
			destination: RefCell::new(destination.clone()),
			listener: Rc::new(Listener { engine: engine.clone() }),
			handlers: Handlers::default(),
			operating: Cell::new(false),
			pending_writable: Cell::new(false),
			failure: Cell::new(None),
		});
		destination.add_handler(engine.listener.clone());

		debug!(
			%direction,
			source_capacity = capacity,
			destination_capacity = destination.capacity(),
			ceiling = options.intermediate_ceiling(),
			"created pipeline"
		);
		Ok(Self { engine })
	}

	/// Runs the pipeline until no further progress can be made. Does nothing if a
	/// run is already in progress, or if the pipeline failed.
	pub fn run(&self) { self.engine.run() }

	/// Stores bytes from `source` into the source buffer, then runs the pipeline.
	/// Fails with the terminal error kind if the pipeline failed.
	pub fn store_from(&self, source: &mut (impl Source + ?Sized)) -> Result<Stored> {
		self.engine.store_from(source)
	}

	/// Writes at most `max` bytes from the destination buffer into `sink`. Frees
	/// space in the destination, resuming the pipeline if it was full.
	pub fn write_to(&self, sink: &mut (impl Sink + ?Sized), max: usize) -> Result<usize> {
		self.destination().write_to(sink, max)
	}

	/// Replaces the destination buffer with `buffer`, returning the previous one,
	/// then runs the pipeline to drain queued data into it.
	///
	/// The switch is rejected, with no effect, if the current destination isn't
	/// empty or `buffer` differs in capacity or region kind.
	pub fn switch_buffer(&self, buffer: SharedRing) -> Result<SharedRing> {
		self.engine.switch_buffer(buffer)
	}

	/// Registers `handler` for edges from the pipeline.
	pub fn add_handler(&self, handler: Rc<dyn EdgeHandler>) {
		self.engine.handlers.add(handler)
	}

	/// Unregisters `handler`, returning `true` if it was registered.
	pub fn remove_handler(&self, handler: &Rc<dyn EdgeHandler>) -> bool {
		self.engine.handlers.remove(handler)
	}

	/// Returns a handle to the current destination buffer.
	pub fn destination(&self) -> SharedRing {
		self.engine.destination.borrow().clone()
	}

	pub fn direction(&self) -> Direction { self.engine.direction }
	pub fn options(&self) -> PipelineOptions { self.engine.options }

	/// Returns the number of bytes waiting in the intermediate queue.
	pub fn queued_bytes(&self) -> usize { self.engine.queue.borrow().byte_size() }
	/// Returns the number of segments in the intermediate queue.
	pub fn queued_segments(&self) -> usize { self.engine.queue.borrow().len() }
	/// Returns the number of untransformed bytes in the source buffer.
	pub fn source_used(&self) -> usize { self.engine.source.borrow().used() }
	/// Returns the free space in the source buffer.
	pub fn source_free(&self) -> usize { self.engine.source.borrow().free() }
	/// Returns the allocated length of the transform's scratch buffer.
	pub fn scratch_capacity(&self) -> usize { self.engine.scratch.borrow().capacity() }

	/// Returns `true` while a run is in progress.
	pub fn is_operating(&self) -> bool { self.engine.operating.get() }

	/// Returns the kind of terminal error the pipeline failed with, if any.
	pub fn failure(&self) -> Option<ErrorKind> { self.engine.failure.get() }

	/// Returns the destination capacity.
	pub fn capacity(&self) -> usize { self.destination().capacity() }

	/// Returns the number of readable bytes in the destination.
	pub fn used(&self) -> usize { self.destination().used() }

	/// Returns the number of bytes that can be stored into the pipeline.
	pub fn free(&self) -> usize { self.source_free() }

	/// Discards the destination's content.
	pub fn clear(&self) { self.destination().clear() }

	/// Releases all buffers: the destination, source, queue and scratch buffer.
	/// Idempotent.
	pub fn clean(&self) {
		let engine = &self.engine;
		engine.queue.borrow_mut().clear();
		engine.scratch.borrow_mut().discard();
		engine.source.borrow_mut().clean();
		self.destination().clean();
		trace!(direction = %engine.direction, "cleaned pipeline");
	}
}

impl<T: Transform + 'static> Switch for Pipeline<T> {
	fn switch_buffer(&mut self, buffer: SharedRing) -> Result<SharedRing> {
		Pipeline::switch_buffer(self, buffer)
	}
}

impl<T: Transform + 'static> Debug for Pipeline<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let engine = &self.engine;
		f.debug_struct("Pipeline")
		 .field("direction", &engine.direction)
		 .field("source", &engine.source)
		 .field("queue", &engine.queue)
		 .field("destination", &engine.destination)
		 .field("handlers", &engine.handlers)
		 .field("operating", &engine.operating.get())
		 .field("failure", &engine.failure.get())
		 .finish_non_exhaustive()
	}
}

impl<T: Transform + 'static> Engine<T> {
	fn run(&self) {
		let Some(_guard) = OperatingGuard::acquire(
			&self.operating,
			&self.pending_writable,
			&self.handlers
		) else {
			trace!(direction = %self.direction, "run already in progress");
			return
		};

		if self.failure.get().is_some() { return }

		if let Err(error) = self.run_to_fixed_point() {
			self.fail(error)
		}
	}

	fn run_to_fixed_point(&self) -> Result {
		loop {
			if self.is_settled() { return Ok(()) }

			let drained = self.drain()?;
			let transformed = self.transform_once()?;
			if !drained && !transformed {
				return Ok(())
			}
		}
	}

	/// Returns `true` if neither phase could make progress.
	fn is_settled(&self) -> bool {
		let queue = self.queue.borrow();
		let cannot_drain = queue.is_empty() || self.destination.borrow().free() == 0;
		let cannot_transform = self.source.borrow().used() == 0 ||
							   queue.byte_size() >= self.options.intermediate_ceiling();
		cannot_drain && cannot_transform
	}

	/// Drains queued segments into the destination, in order, until it's full.
	fn drain(&self) -> Result<bool> {
		let mut destination = self.destination.borrow().clone();
		let mut count = 0;
		while destination.free() > 0 {
			// A handler may have switched the destination; the next pass of the
			// fixed-point loop drains into the new one.
			if !destination.ptr_eq(&self.destination.borrow()) { break }
			let Some(mut segment) = self.queue.borrow_mut().pop_front() else { break };

			// The queue isn't borrowed while writing, the destination's readable edge
			// may call back into the pipeline.
			let result = segment.write_to(&mut destination, usize::MAX);
			if self.source.borrow().is_cleaned() {
				trace!(direction = %self.direction, "pipeline cleaned while draining");
				return Ok(false)
			}
			let drained = segment.is_empty();
			self.queue.borrow_mut().push_front(segment);
			let written = result?;

			if drained {
				self.pending_writable.set(true);
			}
			count += written;
			if written == 0 { break }
		}

		if count > 0 {
			trace!(direction = %self.direction, count, "drained into destination");
		}
		Ok(count > 0)
	}

	/// Invokes the transform once over the source's readable bytes.
	fn transform_once(&self) -> Result<bool> {
		let ceiling = self.options.intermediate_ceiling();
		let mut source = self.source.borrow_mut();
		if source.used() == 0 { return Ok(false) }
		let mut queue = self.queue.borrow_mut();
		if queue.byte_size() >= ceiling { return Ok(false) }
		let mut scratch = self.scratch.borrow_mut();
		let mut transform = self.transform.borrow_mut();

		let wrapped = !source.is_contiguous();
		let full = source.is_full();
		let input = source.readable();
		let len = input.len();
		let mut output = Output::new(&mut queue, &mut scratch, ceiling);
		let step = transform.transform(input, &mut output);
		let emitted = output.emitted();

		let underflow = step.is_underflow();
		let consumed = match step {
			Step::Done { consumed } |
			Step::Underflow { consumed } => consumed,
			Step::Errored(error) => return Err(Error::transform(Some(error)))
		};
		if consumed > len {
			return Err(Error::transform(Some(
				format!("transform consumed {consumed} bytes of {len}").into()
			)))
		}

		source.consume(consumed);
		if consumed > 0 && full {
			self.pending_writable.set(true);
		}
		trace!(direction = %self.direction, consumed, emitted, "transformed");

		let progress = consumed > 0 || emitted > 0;
		if !underflow { return Ok(progress) }

		let can_defragment = source.can_defragment();
		if progress {
			if can_defragment { source.defragment()? }
			return Ok(true)
		}

		if wrapped {
			if !can_defragment {
				return Err(Error::underflow())
			}
			debug!(direction = %self.direction, used = source.used(), "defragmenting wrapped source");
			source.defragment()?;
			Ok(true)
		} else if full {
			Err(Error::underflow())
		} else {
			if can_defragment { source.defragment()? }
			Ok(false)
		}
	}

	fn store_from(&self, source: &mut (impl Source + ?Sized)) -> Result<Stored> {
		self.check_failure()?;
		let stored = self.source.borrow_mut().store_from(source)?;
		if stored.is_eos() {
			debug!(direction = %self.direction, "source reached end-of-stream");
		}

		self.run();
		self.check_failure()?;
		Ok(stored)
	}

	fn check_failure(&self) -> Result {
		match self.failure.get() {
			Some(kind) => Err(Error::new(OperationKind::Store, kind, None)),
			None => Ok(())
		}
	}

	fn switch_buffer(&self, buffer: SharedRing) -> Result<SharedRing> {
		let current = self.destination.borrow().clone();
		if current.used() != 0 {
			return Err(Error::rejected("the destination buffer is not empty"))
		}
		if current.capacity() != buffer.capacity() {
			return Err(Error::rejected("the buffer capacities differ"))
		}
		if current.region() != buffer.region() {
			return Err(Error::rejected("the buffer region kinds differ"))
		}

		current.remove_handler(&self.listener);
		*self.destination.borrow_mut() = buffer.clone();
		buffer.add_handler(self.listener.clone());
		debug!(
			direction = %self.direction,
			capacity = buffer.capacity(),
			queued = self.queue.borrow().byte_size(),
			"switched destination buffer"
		);

		self.run();
		Ok(current)
	}

	fn fail(&self, error: Error) {
		if !error.kind().is_terminal() {
			error!(direction = %self.direction, %error, "should not happen; run aborted");
			return
		}

		warn!(direction = %self.direction, %error, "stream failed");
		self.failure.set(Some(error.kind()));
		self.handlers.error(&error);
	}
}

impl<T: Transform + 'static> Drop for Engine<T> {
	fn drop(&mut self) {
		self.destination.get_mut().remove_handler(&self.listener);
	}
}
