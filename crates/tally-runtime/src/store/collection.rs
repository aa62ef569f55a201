//! Collection store: reactive CRUD over named collections.

use super::record::{materialize, ID_FIELD};
use super::{CollectionSubscription, Datastore, Record, StoreError, SubscriptionError};
use crate::counter::{AllocationError, CounterAllocator, DEFAULT_MAX_ATTEMPTS};
use serde_json::{Map, Value};
use tally_types::{CollectionName, CounterName, DataPath, RecordId};

/// How many fresh keys `create` tries before giving up.
const CREATE_KEY_ATTEMPTS: u32 = 8;

/// Reactive binding to the collections of a datastore.
///
/// Writes go straight to the datastore; subscribers see them through the
/// datastore's change feed, never through a local optimistic copy.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use tally_runtime::store::{CollectionStore, MemoryDatastore};
/// use tally_types::CollectionName;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = CollectionStore::new(MemoryDatastore::new());
/// let employees = CollectionName::parse("employees")?;
///
/// let mut live = store.subscribe(&employees).await?;
/// assert!(live.next().await.unwrap()?.is_empty());
///
/// let id = store.create(&employees, json!({"name": "Ali"})).await?;
/// let snapshot = live.next().await.unwrap()?;
/// assert_eq!(snapshot.len(), 1);
/// assert_eq!(snapshot[0].id, id);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CollectionStore<D> {
    datastore: D,
    counters: CounterAllocator<D>,
}

impl<D: Datastore + Clone> CollectionStore<D> {
    /// Creates a store over `datastore` with default counter settings.
    pub fn new(datastore: D) -> Self {
        Self::with_counter_attempts(datastore, DEFAULT_MAX_ATTEMPTS)
    }

    /// Creates a store whose counter allocation retries at most
    /// `max_attempts` times.
    pub fn with_counter_attempts(datastore: D, max_attempts: u32) -> Self {
        Self {
            counters: CounterAllocator::new(datastore.clone()).with_max_attempts(max_attempts),
            datastore,
        }
    }
}

impl<D: Datastore> CollectionStore<D> {
    /// Returns the underlying datastore.
    pub fn datastore(&self) -> &D {
        &self.datastore
    }

    /// Returns the counter allocator sharing this store's datastore.
    pub fn counters(&self) -> &CounterAllocator<D> {
        &self.counters
    }

    /// Opens a live subscription to `collection`.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionError::Watch`] if the datastore refuses the watch.
    pub async fn subscribe(
        &self,
        collection: &CollectionName,
    ) -> Result<CollectionSubscription, SubscriptionError> {
        let watch = self
            .datastore
            .watch(&DataPath::collection(collection))
            .await
            .map_err(|source| SubscriptionError::Watch {
                collection: collection.to_string(),
                source,
            })?;
        tracing::debug!(collection = %collection, "subscribed");
        Ok(CollectionSubscription::new(collection.clone(), watch))
    }

    /// Adds a record and returns its assigned identifier.
    ///
    /// `record` must be a JSON object. An `id` field in it is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the payload is invalid or the write fails.
    /// Nothing is written on failure.
    pub async fn create(
        &self,
        collection: &CollectionName,
        record: Value,
    ) -> Result<RecordId, StoreError> {
        let mut fields = into_fields(record)?;
        fields.remove(ID_FIELD);
        let value = Value::Object(fields);

        for _ in 0..CREATE_KEY_ATTEMPTS {
            let id = self.datastore.generate_key();
            let path = DataPath::record(collection, &id);
            if self
                .datastore
                .compare_and_set(&path, None, value.clone())
                .await?
            {
                tracing::debug!(collection = %collection, id = %id, "record created");
                return Ok(id);
            }
        }
        Err(StoreError::KeyCollision {
            path: collection.to_string(),
            attempts: CREATE_KEY_ATTEMPTS,
        })
    }

    /// Merges `fields` into the existing record `id`.
    ///
    /// An `id` key in `fields` is stripped; the record keeps its identifier.
    /// `null` values delete the field.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidKey`] if `id` is empty or invalid,
    /// [`StoreError::NotFound`] if the record does not exist.
    pub async fn update(
        &self,
        collection: &CollectionName,
        id: &str,
        fields: Value,
    ) -> Result<(), StoreError> {
        let id = RecordId::parse(id)?;
        let mut fields = into_fields(fields)?;
        fields.remove(ID_FIELD);

        self.datastore
            .update(&DataPath::record(collection, &id), fields)
            .await?;
        tracing::debug!(collection = %collection, id = %id, "record updated");
        Ok(())
    }

    /// Deletes record `id` if present.
    ///
    /// A missing or empty `id` is a no-op: no datastore call, no error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if `id` is not a valid key or the write fails.
    pub async fn remove<'a>(
        &self,
        collection: &CollectionName,
        id: impl Into<Option<&'a str>>,
    ) -> Result<(), StoreError> {
        let Some(id) = id.into().filter(|id| !id.is_empty()) else {
            tracing::debug!(collection = %collection, "remove without id ignored");
            return Ok(());
        };
        let id = RecordId::parse(id)?;
        self.datastore
            .remove(&DataPath::record(collection, &id))
            .await?;
        tracing::debug!(collection = %collection, id = %id, "record removed");
        Ok(())
    }

    /// Reads one record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if `id` is invalid, the read fails, or the
    /// stored node is not a record object.
    pub async fn get(
        &self,
        collection: &CollectionName,
        id: &str,
    ) -> Result<Option<Record>, StoreError> {
        let id = RecordId::parse(id)?;
        let path = DataPath::record(collection, &id);
        match self.datastore.get(&path).await? {
            None => Ok(None),
            Some(Value::Object(fields)) => Ok(Some(Record::new(id, fields))),
            Some(_) => Err(StoreError::not_an_object(path)),
        }
    }

    /// Reads the current membership of `collection`, in identifier order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the read fails or the collection holds a
    /// malformed record.
    pub async fn list(&self, collection: &CollectionName) -> Result<Vec<Record>, StoreError> {
        let path = DataPath::collection(collection);
        let subtree = self.datastore.get(&path).await?.unwrap_or(Value::Null);
        materialize(collection, &subtree).map_err(|e| match e {
            SubscriptionError::Malformed { collection, key } => {
                StoreError::not_an_object(format!("{collection}/{key}"))
            }
            _ => StoreError::not_an_object(path),
        })
    }

    /// Allocates the next value of `counter`, starting at `start_from` when unset.
    ///
    /// # Errors
    ///
    /// See [`CounterAllocator::next_value`].
    pub async fn next_counter_value(
        &self,
        counter: &CounterName,
        start_from: i64,
    ) -> Result<i64, AllocationError> {
        self.counters.next_value(counter, start_from).await
    }
}

fn into_fields(value: Value) -> Result<Map<String, Value>, StoreError> {
    match value {
        Value::Object(fields) => Ok(fields),
        other => Err(StoreError::InvalidPayload {
            found: json_kind(&other),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
