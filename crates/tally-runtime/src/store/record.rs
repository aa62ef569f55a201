//! Records and collection materialization.

use super::SubscriptionError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tally_types::{CollectionName, RecordId};

/// Field name that carries the record identifier in materialized output.
pub const ID_FIELD: &str = "id";

/// One document of a collection: its identifier plus arbitrary fields.
///
/// Serializes flat, with the identifier under `"id"`:
///
/// ```
/// use serde_json::json;
/// use tally_runtime::store::Record;
/// use tally_types::RecordId;
///
/// let record = Record::new(
///     RecordId::parse("e1").unwrap(),
///     json!({"name": "Ali"}).as_object().unwrap().clone(),
/// );
/// assert_eq!(serde_json::to_value(&record).unwrap(), json!({"id": "e1", "name": "Ali"}));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Datastore-assigned identifier.
    pub id: RecordId,

    /// Stored fields (never contains `id`).
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Creates a record. Any `id` entry in `fields` is dropped.
    #[must_use]
    pub fn new(id: RecordId, mut fields: Map<String, Value>) -> Self {
        fields.remove(ID_FIELD);
        Self { id, fields }
    }

    /// Returns a field value.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

/// Turns a collection subtree into records, in identifier order.
///
/// A missing subtree is an empty collection.
///
/// # Errors
///
/// Returns [`SubscriptionError::Malformed`] if the subtree is not an object
/// or one of its children is not a record object.
pub(crate) fn materialize(
    collection: &CollectionName,
    subtree: &Value,
) -> Result<Vec<Record>, SubscriptionError> {
    let malformed = |key: &str| SubscriptionError::Malformed {
        collection: collection.to_string(),
        key: key.to_string(),
    };

    let children = match subtree {
        Value::Null => return Ok(Vec::new()),
        Value::Object(children) => children,
        _ => return Err(malformed(collection.as_str())),
    };

    children
        .iter()
        .map(|(key, value)| {
            let id = RecordId::parse(key.as_str()).map_err(|_| malformed(key))?;
            let fields = value.as_object().ok_or_else(|| malformed(key))?;
            Ok(Record::new(id, fields.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn employees() -> CollectionName {
        CollectionName::parse("employees").expect("valid name")
    }

    #[test]
    fn materialize_attaches_ids() {
        let records = materialize(
            &employees(),
            &json!({"e2": {"name": "Sara"}, "e1": {"name": "Ali", "id": "stale"}}),
        )
        .expect("valid collection");

        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["e1", "e2"]);
        assert_eq!(records[0].get("name"), Some(&json!("Ali")));
        assert!(records[0].get(ID_FIELD).is_none());
    }

    #[test]
    fn materialize_null_is_empty() {
        assert!(materialize(&employees(), &Value::Null)
            .expect("empty")
            .is_empty());
    }

    #[test]
    fn materialize_rejects_scalars() {
        assert!(matches!(
            materialize(&employees(), &json!(42)),
            Err(SubscriptionError::Malformed { .. })
        ));
        assert!(matches!(
            materialize(&employees(), &json!({"e1": "Ali"})),
            Err(SubscriptionError::Malformed { key, .. }) if key == "e1"
        ));
    }

    #[test]
    fn record_deserializes_flat() {
        let record: Record =
            serde_json::from_value(json!({"id": "e1", "name": "Ali"})).expect("valid record");
        assert_eq!(record.id.as_str(), "e1");
        assert_eq!(record.fields.len(), 1);
    }
}
