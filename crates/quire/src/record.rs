use crate::RecordId;

/// A persisted record as loaded from the store.
///
/// A `Record` always carries the key the store assigned to it; records that
/// have not been inserted yet are [`NewRecord`]s.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub id: RecordId,
    pub author_id: String,
    pub title: String,
    pub content: String,
}

impl Record {
    /// Attaches a key to a set of fields.
    pub fn from_parts(id: RecordId, fields: NewRecord) -> Self {
        Self {
            id,
            author_id: fields.author_id,
            title: fields.title,
            content: fields.content,
        }
    }
}

/// The caller-controlled fields of a record.
///
/// Used both for insertion (the store assigns the key) and for full
/// replacement of an existing record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewRecord {
    pub author_id: String,
    pub title: String,
    pub content: String,
}

impl NewRecord {
    pub fn new(
        author_id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            author_id: author_id.into(),
            title: title.into(),
            content: content.into(),
        }
    }
}

impl From<Record> for NewRecord {
    fn from(record: Record) -> Self {
        Self {
            author_id: record.author_id,
            title: record.title,
            content: record.content,
        }
    }
}
