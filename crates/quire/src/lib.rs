//! # quire
//!
//! Domain layer for a small document-backed record store.
//!
//! - [`RecordId`] - the store-assigned 12-byte key and its lowercase hex text
//!   form.
//! - [`Record`] / [`NewRecord`] - a persisted record and the fields submitted
//!   to create or replace one.
//! - [`RecordStore`] / [`ScanCursor`] - the seam to the backing document
//!   store, implemented by [`MemoryStore`] and (with the `mongodb` feature)
//!   [`MongoStore`].
//! - [`RecordRepository`] - create, read, update, delete and full-scan
//!   operations over one collection.
//!
//! ## Features
//!
//! - `tracing`: log every repository failure through `tracing`.
//! - `serde`: (de)serialize [`RecordId`] as its hex text.
//! - `mongodb`: enable [`MongoStore`], backed by the official driver.

mod error;
mod id;
mod record;
mod repository;
#[cfg(feature = "serde")]
mod serde;
mod store;

pub use crate::error::*;
pub use crate::id::*;
pub use crate::record::*;
pub use crate::repository::*;
pub use crate::store::*;
