//! gRPC service implementation.
//!
//! - [`handler`] - `quire.Records` entry point ([`handler::RecordService`]).

pub mod handler;
