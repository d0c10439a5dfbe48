//! The seam between the repository and the backing document store.
//!
//! A store is an explicitly constructed connection value. The process owns
//! exactly one, shares it behind an `Arc` across every concurrent call, and
//! closes it last during shutdown. Stores provide only per-document
//! atomicity; nothing here spans more than one document.

mod memory;
#[cfg(feature = "mongodb")]
mod mongo;

pub use memory::*;
#[cfg(feature = "mongodb")]
pub use mongo::*;

use crate::{NewRecord, Record, RecordId, Result};
use core::future::Future;

/// A document collection holding [`Record`]s.
pub trait RecordStore: Send + Sync + 'static {
    /// Scan handle returned by [`RecordStore::scan`].
    type Cursor: ScanCursor;

    /// Inserts a new document and returns the key the store assigned.
    fn insert(&self, record: NewRecord) -> impl Future<Output = Result<RecordId>> + Send;

    /// Loads the document with the given key, if any.
    fn find(&self, id: RecordId) -> impl Future<Output = Result<Option<Record>>> + Send;

    /// Replaces every field of the document matching `record.id`.
    ///
    /// Matching no document is not an error.
    fn replace(&self, record: &Record) -> impl Future<Output = Result<()>> + Send;

    /// Removes the document with the given key. Removing a missing key is not
    /// an error.
    fn remove(&self, id: RecordId) -> impl Future<Output = Result<()>> + Send;

    /// Opens a forward-only scan over the whole collection.
    fn scan(&self) -> impl Future<Output = Result<Self::Cursor>> + Send;

    /// Releases the connection. Operations issued afterwards fail.
    fn close(&self) -> impl Future<Output = Result<()>> + Send;
}

/// A one-shot, forward-only iteration handle over a collection.
///
/// Handles are owned by a single call and never shared. Callers must finish
/// with [`ScanCursor::close`] on every path, including early failure.
pub trait ScanCursor: Send + 'static {
    /// Pulls and decodes the next record. `None` once the scan is exhausted.
    ///
    /// A `Some(Err(_))` ends the scan; later calls are unspecified.
    fn next(&mut self) -> impl Future<Output = Option<Result<Record>>> + Send;

    /// Releases the server-side resources held by the scan.
    fn close(self) -> impl Future<Output = ()> + Send;
}
