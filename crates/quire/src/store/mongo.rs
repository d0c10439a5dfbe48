use crate::{Error, NewRecord, Record, RecordId, RecordStore, Result, ScanCursor};
use mongodb::{
    Client, Collection, Cursor,
    bson::{Document, doc, oid::ObjectId},
};
use serde::{Deserialize, Serialize};

/// Shape of a record inside the collection.
///
/// `_id` is omitted on insert and replace so the store keeps ownership of
/// the key.
#[derive(Debug, Serialize, Deserialize)]
struct RecordDocument {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    author_id: String,
    content: String,
    title: String,
}

impl RecordDocument {
    fn without_id(record: NewRecord) -> Self {
        Self {
            id: None,
            author_id: record.author_id,
            content: record.content,
            title: record.title,
        }
    }

    fn into_record(self) -> Result<Record> {
        let id = self
            .id
            .ok_or_else(|| Error::store("document is missing its _id"))?;
        Ok(Record {
            id: RecordId::from_bytes(id.bytes()),
            author_id: self.author_id,
            title: self.title,
            content: self.content,
        })
    }
}

fn by_key(id: RecordId) -> Document {
    doc! { "_id": ObjectId::from_bytes(id.to_bytes()) }
}

fn driver_error(op: &'static str) -> impl FnOnce(mongodb::error::Error) -> Error {
    move |e| Error::store(format!("{op}: {e}"))
}

/// [`RecordStore`] backed by a MongoDB collection.
///
/// The driver client is internally reference counted and safe to use from
/// many tasks at once; one `MongoStore` serves the whole process.
pub struct MongoStore {
    client: Client,
    collection: Collection<RecordDocument>,
}

impl MongoStore {
    /// Connects to the deployment at `uri` and binds to
    /// `database.collection`.
    ///
    /// The driver connects lazily, so this issues a `ping` to surface an
    /// unreachable or misconfigured deployment immediately.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] if the URI is invalid or the ping fails.
    pub async fn connect(uri: &str, database: &str, collection: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(driver_error("create client"))?;
        let db = client.database(database);
        db.run_command(doc! { "ping": 1 })
            .await
            .map_err(driver_error("ping"))?;

        #[cfg(feature = "tracing")]
        tracing::info!("Connected to {database}.{collection}");

        Ok(Self {
            collection: db.collection(collection),
            client,
        })
    }
}

impl RecordStore for MongoStore {
    type Cursor = MongoCursor;

    async fn insert(&self, record: NewRecord) -> Result<RecordId> {
        let res = self
            .collection
            .insert_one(RecordDocument::without_id(record))
            .await
            .map_err(driver_error("insert"))?;
        res.inserted_id
            .as_object_id()
            .map(|oid| RecordId::from_bytes(oid.bytes()))
            .ok_or_else(|| Error::store(format!("unexpected inserted id: {}", res.inserted_id)))
    }

    async fn find(&self, id: RecordId) -> Result<Option<Record>> {
        self.collection
            .find_one(by_key(id))
            .await
            .map_err(driver_error("find"))?
            .map(RecordDocument::into_record)
            .transpose()
    }

    async fn replace(&self, record: &Record) -> Result<()> {
        let replacement = RecordDocument::without_id(NewRecord::from(record.clone()));
        self.collection
            .replace_one(by_key(record.id), replacement)
            .await
            .map_err(driver_error("replace"))?;
        Ok(())
    }

    async fn remove(&self, id: RecordId) -> Result<()> {
        self.collection
            .delete_one(by_key(id))
            .await
            .map_err(driver_error("delete"))?;
        Ok(())
    }

    async fn scan(&self) -> Result<MongoCursor> {
        let inner = self
            .collection
            .find(doc! {})
            .await
            .map_err(driver_error("open scan"))?;
        Ok(MongoCursor { inner })
    }

    async fn close(&self) -> Result<()> {
        self.client.clone().shutdown().await;
        Ok(())
    }
}

/// Server-side cursor over a MongoDB collection. Documents are decoded one
/// at a time as they are pulled.
pub struct MongoCursor {
    inner: Cursor<RecordDocument>,
}

impl ScanCursor for MongoCursor {
    async fn next(&mut self) -> Option<Result<Record>> {
        match self.inner.advance().await {
            Ok(true) => Some(
                self.inner
                    .deserialize_current()
                    .map_err(driver_error("decode"))
                    .and_then(RecordDocument::into_record),
            ),
            Ok(false) => None,
            Err(e) => Some(Err(driver_error("advance")(e))),
        }
    }

    async fn close(self) {
        // Dropping the driver cursor issues `killCursors` in the background.
        drop(self.inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_round_trips_through_bson() {
        let oid = ObjectId::parse_str("65f1c2a9e4b0a1b2c3d4e5f6").unwrap();
        let doc = RecordDocument {
            id: Some(oid),
            author_id: "john".into(),
            content: "body".into(),
            title: "t".into(),
        };
        let raw = mongodb::bson::to_document(&doc).unwrap();
        assert_eq!(raw.get_object_id("_id").unwrap(), oid);
        assert_eq!(raw.get_str("author_id").unwrap(), "john");

        let back: RecordDocument = mongodb::bson::from_document(raw).unwrap();
        let record = back.into_record().unwrap();
        assert_eq!(record.id.encode(), "65f1c2a9e4b0a1b2c3d4e5f6");
        assert_eq!(record.title, "t");
    }

    #[test]
    fn new_documents_leave_the_key_to_the_store() {
        let doc = RecordDocument::without_id(NewRecord::new("a", "b", "c"));
        let raw = mongodb::bson::to_document(&doc).unwrap();
        assert!(!raw.contains_key("_id"));
        assert_eq!(raw.len(), 3);
    }

    #[test]
    fn missing_key_is_a_store_error() {
        let doc = RecordDocument::without_id(NewRecord::default());
        assert!(matches!(doc.into_record(), Err(Error::Store { .. })));
    }
}
