//! Definitions shared by the record server and its clients.
//!
//! - [`error`] - service error type and its mapping onto `tonic::Status`.
//! - [`convert`] - conversions between wire messages and domain records.
//! - [`proto`] - generated messages, client and server for `quire.Records`.

pub mod convert;
pub mod error;

pub use error::{Error, Result};

/// Generated from `proto/quire.proto`.
///
/// - [`proto::records_server::Records`] - the service trait the server
///   implements.
/// - [`proto::records_client::RecordsClient`] - the generated client.
/// - [`proto::FILE_DESCRIPTOR_SET`] - encoded descriptors for reflection.
pub mod proto {
    tonic::include_proto!("quire");
    pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("quire_descriptor");
}
