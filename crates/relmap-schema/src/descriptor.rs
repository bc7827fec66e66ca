//! JSON descriptors: the serialized form of a schema model.
//!
//! A descriptor captures every declared fact of a [`DatabaseModel`], so a
//! model survives a serialize/parse round trip unchanged. Applications store
//! the descriptor alongside the data and compare it against the model they
//! compiled with to detect drift.

use relmap_core::{Error, Result};

use crate::model::DatabaseModel;

impl DatabaseModel {
    /// Serialize the model as a pretty-printed JSON descriptor.
    pub fn to_descriptor(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Descriptor(e.to_string()))
    }

    /// Parse a model back out of a JSON descriptor.
    pub fn from_descriptor(descriptor: &str) -> Result<Self> {
        serde_json::from_str(descriptor).map_err(|e| Error::Descriptor(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use relmap_core::SqlType;

    use crate::model::{FieldModel, RelationModel, TableModel};

    use super::*;

    fn model() -> DatabaseModel {
        DatabaseModel::new("weblog", "1.2")
            .table(
                TableModel::new("post")
                    .field(FieldModel::new("id", SqlType::BigInt).primary_key())
                    .field(FieldModel::new("title", SqlType::Text))
                    .field(FieldModel::new("created", SqlType::Timestamp).nullable())
                    .relation(RelationModel::to_many("comments", "comment", "post_id")),
            )
            .table(
                TableModel::new("comment")
                    .field(FieldModel::new("id", SqlType::BigInt).primary_key())
                    .field(FieldModel::new("message", SqlType::Text))
                    .field(FieldModel::new("post_id", SqlType::BigInt)),
            )
    }

    #[test]
    fn test_descriptor_round_trip_is_lossless() {
        let original = model();
        let descriptor = original.to_descriptor().unwrap();
        let parsed = DatabaseModel::from_descriptor(&descriptor).unwrap();
        assert_eq!(original, parsed);
        assert_eq!(parsed.version, "1.2");
        assert!(
            parsed
                .find_table("post")
                .unwrap()
                .find_relation("comments")
                .is_some()
        );
    }

    #[test]
    fn test_malformed_descriptor_is_an_error() {
        assert!(matches!(
            DatabaseModel::from_descriptor("{not json"),
            Err(Error::Descriptor(_))
        ));
    }
}
