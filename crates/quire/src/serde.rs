use crate::RecordId;
use core::fmt;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

impl Serialize for RecordId {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct HexVisitor;

        impl de::Visitor<'_> for HexVisitor {
            type Value = RecordId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a 24 character lowercase hex record id")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                RecordId::decode(v).map_err(E::custom)
            }
        }

        d.deserialize_str(HexVisitor)
    }
}

#[cfg(test)]
mod tests {
    use crate::RecordId;

    #[test]
    fn serializes_as_hex_text() {
        let id = RecordId::decode("0123456789abcdef01234567").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"0123456789abcdef01234567\"");

        let back: RecordId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn rejects_malformed_text() {
        let res = serde_json::from_str::<RecordId>("\"nope\"");
        assert!(res.is_err());
    }
}
