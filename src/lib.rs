// Copyright 2023 Strixpyrr
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! ## How it works
//!
//! Bytes move through fixed-capacity *ring buffers*, filled from non-blocking
//! [`Source`](streams::Source)s and drained into non-blocking
//! [`Sink`](streams::Sink)s. Nothing here blocks or performs socket syscalls:
//! an event loop calls in when a socket is readable or writable, and the buffers
//! move whatever bytes are ready.
//!
//! A [`Pipeline`] connects two buffers with a [`Transform`](transform::Transform).
//! In the *unwrap* direction it converts wire-format bytes, such as
//! length-prefixed frames, into plain bytes for the application; in the *wrap*
//! direction it converts them back. Transformed chunks wait in a bounded
//! intermediate queue until the destination buffer has room.
//!
//! ### Edges
//!
//! Buffers notify their owners with *edges*, fired on transitions only: readable
//! when a buffer goes from empty to holding data, writable when it goes from full
//! to having free space. See [`EdgeHandler`].
//!
//! All types are single-threaded; a pipeline and its buffers belong to the thread
//! running their event loop.

mod edge;
mod error;
mod options;
mod pipeline;
mod queue;
mod ring;
mod std_io;
pub mod streams;
pub mod transform;

pub use edge::*;
pub use error::{Error, ErrorBox, ErrorKind, OperationKind, Result};
pub(crate) use error::ResultContext;
pub use options::*;
pub use pipeline::*;
pub use queue::*;
pub use ring::*;
pub use std_io::*;
