//! Server-side components of the record service.
//!
//! - [`config`] - CLI/env configuration.
//! - [`lifecycle`] - startup, background accept loop and ordered shutdown.
//! - [`service`] - the `quire.Records` gRPC facade.
//! - [`streaming`] - batching of `ListRecords` responses.
//! - [`telemetry`] - logging, tracing and metrics setup.

pub mod config;
pub mod lifecycle;
pub mod service;
pub mod streaming;
pub mod telemetry;
