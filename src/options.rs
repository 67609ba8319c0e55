// SPDX-License-Identifier: Apache-2.0

use crate::{Error, Result};
use crate::error::OperationKind;
use crate::ring::Region;

/// The default intermediate ceiling, `1MiB`.
pub const DEFAULT_INTERMEDIATE_CEILING: usize = 1024 * 1024;

/// Options for tuning a [`Pipeline`](crate::Pipeline).
///
/// # Intermediate ceiling
///
/// The number of transformed bytes which may wait in the intermediate queue for
/// room in the destination buffer. Defaults to `1MiB`. Once reached, the transform
/// isn't called until the destination drains some of the queue, so input backs up
/// into the source buffer and from there into the connection. A single unit larger
/// than the ceiling may still be queued alone.
///
/// # Source capacity
///
/// The capacity of the source buffer the pipeline creates. Defaults to the capacity
/// of the destination buffer. It should be at least the largest unit the transform
/// decodes, or input wider than the buffer can never be assembled.
///
/// # Source region
///
/// The memory region kind of the source buffer, [`Heap`](Region::Heap) by default.
/// A [`Fixed`](Region::Fixed) source can't be defragmented, so a unit wrapping
/// around its end can't be assembled either.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct PipelineOptions {
	pub intermediate_ceiling: usize,
	pub source_capacity: Option<usize>,
	pub source_region: Region,
}

impl Default for PipelineOptions {
	fn default() -> Self { Self::new() }
}

impl PipelineOptions {
	/// Creates a new set of pipeline options.
	pub const fn new() -> Self {
		Self {
			intermediate_ceiling: DEFAULT_INTERMEDIATE_CEILING,
			source_capacity: None,
			source_region: Region::Heap,
		}
	}

	/// Returns the intermediate ceiling.
	#[inline]
	pub const fn intermediate_ceiling(&self) -> usize { self.intermediate_ceiling }

	/// Returns the source capacity, if set.
	#[inline]
	pub const fn source_capacity(&self) -> Option<usize> { self.source_capacity }

	/// Returns the source region kind.
	#[inline]
	pub const fn source_region(&self) -> Region { self.source_region }

	/// Sets the intermediate ceiling.
	#[inline]
	pub fn set_intermediate_ceiling(&mut self, value: usize) {
		self.intermediate_ceiling = value;
	}

	/// Sets the source capacity.
	#[inline]
	pub fn set_source_capacity(&mut self, value: usize) {
		self.source_capacity = Some(value);
	}

	/// Sets the source region kind.
	#[inline]
	pub fn set_source_region(&mut self, value: Region) {
		self.source_region = value;
	}

	/// Sets the intermediate ceiling.
	#[inline]
	pub const fn with_intermediate_ceiling(mut self, value: usize) -> Self {
		self.intermediate_ceiling = value;
		self
	}

	/// Sets the source capacity.
	#[inline]
	pub const fn with_source_capacity(mut self, value: usize) -> Self {
		self.source_capacity = Some(value);
		self
	}

	/// Sets the source region kind.
	#[inline]
	pub const fn with_source_region(mut self, value: Region) -> Self {
		self.source_region = value;
		self
	}

	/// Checks that all options are in range.
	pub fn validate(&self) -> Result {
		const OP: OperationKind = OperationKind::Other("validate pipeline options");
		if self.intermediate_ceiling == 0 {
			return Err(Error::other(OP, "intermediate ceiling must be non-zero", None))
		}
		if self.source_capacity == Some(0) {
			return Err(Error::other(OP, "source capacity must be non-zero", None))
		}
		Ok(())
	}
}
