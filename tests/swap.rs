// SPDX-License-Identifier: Apache-2.0

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use pretty_assertions::assert_eq;
use wrapring::{Direction, EdgeHandler, ErrorKind, Pipeline, PipelineOptions, SharedRing, Switch};
use wrapring::transform::Identity;

mod common;

fn pipeline(destination: &SharedRing) -> Pipeline<Identity> {
	Pipeline::with_options(
		Direction::Unwrap,
		destination.clone(),
		Identity::chunked(8),
		PipelineOptions::new().with_source_capacity(64)
	).unwrap()
}

#[test]
fn rejected_while_used() {
	let current = SharedRing::heap(16);
	let pipeline = pipeline(&current);
	pipeline.store_from(&mut &b"abc"[..]).unwrap();

	let next = SharedRing::heap(16);
	let error = pipeline.switch_buffer(next.clone()).unwrap_err();
	assert!(matches!(error.kind(), ErrorKind::Rejected(_)));
	assert_eq!(pipeline.destination(), current);
	assert_eq!(current.to_vec(), b"abc");
	assert_eq!(next.used(), 0);
	assert_eq!(current.handler_count(), 1);
	assert_eq!(next.handler_count(), 0);
}

#[test]
fn rejected_when_incompatible() {
	let current = SharedRing::heap(16);
	let mut pipeline = pipeline(&current);

	for next in [SharedRing::heap(32), SharedRing::fixed(16)] {
		let error = Switch::switch_buffer(&mut pipeline, next.clone()).unwrap_err();
		assert!(matches!(error.kind(), ErrorKind::Rejected(_)));
		assert_eq!(next.handler_count(), 0);
	}
	assert_eq!(pipeline.destination(), current);
}

#[test]
fn accepted_when_empty() {
	let data = common::pattern(40);
	let current = SharedRing::heap(16);
	let pipeline = pipeline(&current);
	let recorder = common::record(&pipeline);
	pipeline.store_from(&mut &data[..]).unwrap();
	assert_eq!(current.to_vec(), &data[..16]);
	assert_eq!(pipeline.queued_bytes(), 24);

	// Tearing down the old buffer's content fires no edge.
	let mut out = current.to_vec();
	current.clear();

	let next = SharedRing::heap(16);
	let previous = pipeline.switch_buffer(next.clone()).unwrap();
	assert_eq!(previous, current);
	assert_eq!(pipeline.destination(), next);
	assert_eq!(current.handler_count(), 0);
	assert_eq!(next.handler_count(), 1);

	// Queued data drained into the new buffer immediately.
	assert_eq!(next.to_vec(), &data[16..32]);
	assert_eq!(pipeline.queued_bytes(), 8);
	assert_eq!(recorder.readable.get(), 2);

	// The old buffer is no longer observed.
	current.store_slice(b"stale").unwrap();
	assert_eq!(recorder.readable.get(), 2);

	common::drain_all(&pipeline, &mut out);
	assert_eq!(out, data);
}

/// Empties the destination and switches it out the first time it becomes
/// readable.
struct SwitchOnReadable {
	pipeline: Weak<Pipeline<Identity>>,
	next: SharedRing,
	out: RefCell<Vec<u8>>,
}

impl EdgeHandler for SwitchOnReadable {
	fn readable_edge(&self) {
		let Some(pipeline) = self.pipeline.upgrade() else { return };
		let current = pipeline.destination();
		if current == self.next { return }

		current.write_to(&mut *self.out.borrow_mut(), usize::MAX).unwrap();
		pipeline.switch_buffer(self.next.clone()).unwrap();
	}

	fn writable_edge(&self) { }
}

#[test]
fn switched_while_draining() {
	let data = common::pattern(40);
	let current = SharedRing::heap(16);
	let pipeline = Rc::new(pipeline(&current));
	let next = SharedRing::heap(16);
	let handler = Rc::new(SwitchOnReadable {
		pipeline: Rc::downgrade(&pipeline),
		next: next.clone(),
		out: RefCell::default(),
	});
	pipeline.add_handler(handler.clone());

	pipeline.store_from(&mut &data[..]).unwrap();
	assert_eq!(pipeline.destination(), next);
	assert_eq!(current.used(), 0);
	assert_eq!(*handler.out.borrow(), &data[..8]);
	assert_eq!(next.to_vec(), &data[8..24]);
	assert_eq!(pipeline.queued_bytes(), 16);

	let mut out = handler.out.take();
	common::drain_all(&pipeline, &mut out);
	assert_eq!(out, data);
	assert_eq!(current.used(), 0);
}
