use crate::{Error, NewRecord, Record, RecordId, RecordStore, Result};
use std::sync::Arc;

/// Create, read, update, delete and full-scan operations over one collection.
///
/// The repository holds a shared handle to the process-wide store connection
/// and adds the identifier handling on top: text ids are decoded before the
/// store is contacted, and a malformed id never reaches it. Nothing is
/// retried; every failure is logged and returned as is.
pub struct RecordRepository<S> {
    store: Arc<S>,
}

impl<S> Clone for RecordRepository<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: RecordStore> RecordRepository<S> {
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// The store connection this repository operates on.
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Inserts a record and returns it as stored, with its assigned id.
    ///
    /// # Errors
    ///
    /// [`Error::Store`] if the insert or the follow-up load fails.
    pub async fn create(&self, record: NewRecord) -> Result<Record> {
        let id = self
            .store
            .insert(record)
            .await
            .inspect_err(|e| log_failure("create", e))?;
        self.load(id).await
    }

    /// Loads the record with the given text id.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedIdentifier`], [`Error::NotFound`] or [`Error::Store`].
    pub async fn read(&self, id: &str) -> Result<Record> {
        let id = decode(id, "read")?;
        self.load(id).await
    }

    /// Replaces every field of the record with the given text id and returns
    /// the record as stored afterwards. The id itself never changes.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedIdentifier`], [`Error::Store`], or
    /// [`Error::NotFound`] when no record has that id.
    pub async fn update(&self, id: &str, fields: NewRecord) -> Result<Record> {
        let id = decode(id, "update")?;
        self.store
            .replace(&Record::from_parts(id, fields))
            .await
            .inspect_err(|e| log_failure("update", e))?;
        self.load(id).await
    }

    /// Removes the record with the given text id and echoes the id back.
    ///
    /// Removing an id that matches nothing succeeds.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedIdentifier`] or [`Error::Store`].
    pub async fn delete(&self, id: &str) -> Result<RecordId> {
        let id = decode(id, "delete")?;
        self.store
            .remove(id)
            .await
            .inspect_err(|e| log_failure("delete", e))?;
        Ok(id)
    }

    /// Opens a scan over every record. Each call starts a fresh scan.
    ///
    /// # Errors
    ///
    /// [`Error::Store`] if the scan cannot be opened.
    pub async fn scan_all(&self) -> Result<S::Cursor> {
        self.store
            .scan()
            .await
            .inspect_err(|e| log_failure("scan", e))
    }

    async fn load(&self, id: RecordId) -> Result<Record> {
        match self.store.find(id).await {
            Ok(Some(record)) => Ok(record),
            Ok(None) => {
                let err = Error::NotFound { id };
                log_failure("load", &err);
                Err(err)
            }
            Err(e) => {
                log_failure("load", &e);
                Err(e)
            }
        }
    }
}

fn decode(id: &str, op: &'static str) -> Result<RecordId> {
    RecordId::decode(id).inspect_err(|e| log_failure(op, e))
}

#[allow(clippy::used_underscore_binding)]
fn log_failure(_op: &'static str, _err: &Error) {
    #[cfg(feature = "tracing")]
    match _err {
        Error::Store { .. } => tracing::error!("{_op} failed: {_err}"),
        _ => tracing::debug!("{_op} failed: {_err}"),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStore, ScanCursor};

    fn repo() -> RecordRepository<MemoryStore> {
        RecordRepository::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn create_then_read_round_trips() {
        let repo = repo();
        let created = repo
            .create(NewRecord::new("john", "blog0", "Content of John's blog."))
            .await
            .unwrap();

        let read = repo.read(&created.id.encode()).await.unwrap();
        assert_eq!(read, created);
        assert_eq!(read.author_id, "john");
        assert_eq!(read.title, "blog0");
        assert_eq!(read.content, "Content of John's blog.");
        assert_eq!(RecordId::decode(&read.id.encode()).unwrap().encode(), read.id.encode());
    }

    #[tokio::test]
    async fn empty_fields_are_accepted() {
        let repo = repo();
        let created = repo.create(NewRecord::default()).await.unwrap();
        assert_eq!(created.title, "");
        assert_eq!(repo.read(&created.id.encode()).await.unwrap(), created);
    }

    #[tokio::test]
    async fn update_preserves_identity() {
        let repo = repo();
        let created = repo.create(NewRecord::new("john", "t", "c")).await.unwrap();
        let id = created.id.encode();

        let updated = repo
            .update(&id, NewRecord::new("john", "t2", "c2"))
            .await
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.title, "t2");

        let read = repo.read(&id).await.unwrap();
        assert_eq!((read.title.as_str(), read.content.as_str()), ("t2", "c2"));
        assert_eq!(repo.store().len(), 1);
    }

    #[tokio::test]
    async fn update_of_unknown_id_is_not_found() {
        let repo = repo();
        let err = repo
            .update("000000000000000000000000", NewRecord::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(repo.store().is_empty());
    }

    #[tokio::test]
    async fn delete_then_read_fails() {
        let repo = repo();
        let created = repo.create(NewRecord::new("a", "b", "c")).await.unwrap();
        let id = created.id.encode();

        assert_eq!(repo.delete(&id).await.unwrap(), created.id);
        let err = repo.read(&id).await.unwrap_err();
        assert_eq!(err, Error::NotFound { id: created.id });
    }

    #[tokio::test]
    async fn delete_of_unknown_id_succeeds() {
        let repo = repo();
        let id = "0123456789abcdef01234567";
        assert_eq!(repo.delete(id).await.unwrap().encode(), id);
    }

    #[tokio::test]
    async fn malformed_ids_never_reach_the_store() {
        let repo = repo();
        // A closed store fails every call, so reaching it would yield a
        // store error instead of a malformed identifier.
        repo.store().close().await.unwrap();

        for res in [
            repo.read("not-a-valid-id").await.map(|_| ()),
            repo.update("not-a-valid-id", NewRecord::default())
                .await
                .map(|_| ()),
            repo.delete("not-a-valid-id").await.map(|_| ()),
        ] {
            assert!(matches!(res, Err(Error::MalformedIdentifier { .. })));
        }
    }

    #[tokio::test]
    async fn store_failures_surface_as_store_errors() {
        let repo = repo();
        repo.store().close().await.unwrap();

        assert!(matches!(
            repo.create(NewRecord::default()).await,
            Err(Error::Store { .. })
        ));
        assert!(matches!(
            repo.read("0123456789abcdef01234567").await,
            Err(Error::Store { .. })
        ));
        assert!(matches!(repo.scan_all().await, Err(Error::Store { .. })));
    }

    #[tokio::test]
    async fn scan_all_yields_records_in_creation_order() {
        let repo = repo();
        let mut created = Vec::new();
        for title in ["blog1", "blog2", "blog3"] {
            created.push(repo.create(NewRecord::new("john", title, "")).await.unwrap());
        }

        let mut cursor = repo.scan_all().await.unwrap();
        let mut scanned = Vec::new();
        while let Some(record) = cursor.next().await {
            scanned.push(record.unwrap());
        }
        cursor.close().await;
        assert_eq!(scanned, created);
    }
}
