//! Conversions between `quire.proto` messages and [`quire`] domain types.
//!
//! Outbound conversions are infallible: a domain [`Record`] always has an id,
//! which is rendered as lowercase hex. Inbound records keep their id as text;
//! the repository decodes it so a malformed id is reported with the
//! operation that received it.

use crate::proto;
use quire::{NewRecord, Record};

impl From<Record> for proto::Record {
    fn from(record: Record) -> Self {
        Self {
            id: record.id.encode(),
            author_id: record.author_id,
            title: record.title,
            content: record.content,
        }
    }
}

impl From<proto::CreateRecordRequest> for NewRecord {
    fn from(req: proto::CreateRecordRequest) -> Self {
        Self {
            author_id: req.author_id,
            title: req.title,
            content: req.content,
        }
    }
}

impl proto::Record {
    /// Splits a wire record into its text id and the fields to store.
    pub fn into_parts(self) -> (String, NewRecord) {
        let fields = NewRecord {
            author_id: self.author_id,
            title: self.title,
            content: self.content,
        };
        (self.id, fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire::RecordId;

    #[test]
    fn outbound_records_render_hex_ids() {
        let id = RecordId::decode("65f1c2a9e4b0a1b2c3d4e5f6").unwrap();
        let wire = proto::Record::from(Record::from_parts(id, NewRecord::new("a", "t", "c")));
        assert_eq!(wire.id, "65f1c2a9e4b0a1b2c3d4e5f6");
        assert_eq!(wire.author_id, "a");
        assert_eq!(wire.title, "t");
        assert_eq!(wire.content, "c");
    }

    #[test]
    fn inbound_records_split_into_id_and_fields() {
        let wire = proto::Record {
            id: "whatever".into(),
            author_id: "a".into(),
            title: "t".into(),
            content: "c".into(),
        };
        let (id, fields) = wire.into_parts();
        assert_eq!(id, "whatever");
        assert_eq!(fields, NewRecord::new("a", "t", "c"));
    }
}
