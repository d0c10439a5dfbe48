//! Streaming support for `ListRecords`.
//!
//! - [`emitter`] - drains a scan handle into bounded response batches.

pub mod emitter;
