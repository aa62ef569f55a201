//! Counter allocation.
//!
//! Counters live at `counters/<name>` as plain JSON integers. Allocation is
//! an optimistic loop over [`Datastore::compare_and_set`]:
//!
//! ```text
//! read ──► compute (unset → start_from, n → n + 1) ──► CAS(read, next)
//!   ▲                                                    │ conflict
//!   └────────────────────────────────────────────────────┘
//! ```
//!
//! The datastore's CAS is the only synchronization point, so values are
//! unique across tasks, processes sharing the datastore, and retries.

use crate::store::{Datastore, StoreError};
use serde_json::Value;
use std::fmt;
use tally_types::{CounterName, DataPath, ErrorCode};
use thiserror::Error;

/// First value of a counter that does not exist yet.
pub const DEFAULT_START_FROM: i64 = 1000;

/// Default bound on compare-and-set attempts per allocation.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 64;

/// Counter allocation failed. No value was consumed.
#[derive(Debug, Error)]
pub enum AllocationError {
    /// Every attempt lost the race to a concurrent writer.
    #[error("counter '{counter}' still contended after {attempts} attempts")]
    Exhausted { counter: String, attempts: u32 },

    /// The stored value is not an integer.
    #[error("counter '{counter}' holds a non-integer value: {found}")]
    NotAnInteger { counter: String, found: String },

    /// The next value does not fit in an `i64`.
    #[error("counter '{counter}' overflowed")]
    Overflow { counter: String },

    /// The datastore failed.
    #[error("counter '{counter}': {source}")]
    Store {
        counter: String,
        #[source]
        source: StoreError,
    },
}

impl ErrorCode for AllocationError {
    fn code(&self) -> &'static str {
        match self {
            Self::Exhausted { .. } => "COUNTER_EXHAUSTED",
            Self::NotAnInteger { .. } => "COUNTER_NOT_AN_INTEGER",
            Self::Overflow { .. } => "COUNTER_OVERFLOW",
            Self::Store { .. } => "COUNTER_STORE",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Exhausted { .. } => true,
            Self::Store { source, .. } => source.is_recoverable(),
            Self::NotAnInteger { .. } | Self::Overflow { .. } => false,
        }
    }
}

/// Allocates strictly increasing, never-repeated counter values.
///
/// # Example
///
/// ```
/// use tally_runtime::counter::CounterAllocator;
/// use tally_runtime::store::MemoryDatastore;
/// use tally_types::CounterName;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let counters = CounterAllocator::new(MemoryDatastore::new());
/// let invoice = CounterName::parse("invoice")?;
///
/// assert_eq!(counters.next_value(&invoice, 1000).await?, 1000);
/// assert_eq!(counters.next_value(&invoice, 1000).await?, 1001);
///
/// let receipt = counters
///     .next_document_number(&CounterName::parse("receipt")?, 1, "RCPT")
///     .await?;
/// assert_eq!(receipt.to_string(), "RCPT-1");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CounterAllocator<D> {
    datastore: D,
    max_attempts: u32,
}

impl<D: Datastore> CounterAllocator<D> {
    /// Creates an allocator with [`DEFAULT_MAX_ATTEMPTS`].
    pub fn new(datastore: D) -> Self {
        Self {
            datastore,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Sets the attempt bound. Zero is treated as one.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Returns the attempt bound.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Allocates the next value of `counter`.
    ///
    /// Returns `start_from` if the counter is unset, otherwise the stored
    /// value plus one. The stored value is advanced atomically.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError`] if the attempts run out, the stored
    /// value is not an integer, or the datastore fails.
    pub async fn next_value(
        &self,
        counter: &CounterName,
        start_from: i64,
    ) -> Result<i64, AllocationError> {
        let path = DataPath::counter(counter);
        let store_err = |source| AllocationError::Store {
            counter: counter.to_string(),
            source,
        };

        for attempt in 1..=self.max_attempts {
            let current = self.datastore.get(&path).await.map_err(store_err)?;
            let next = next_after(counter, current.as_ref(), start_from)?;

            if self
                .datastore
                .compare_and_set(&path, current.as_ref(), Value::from(next))
                .await
                .map_err(store_err)?
            {
                tracing::debug!(counter = %counter, value = next, attempt, "allocated");
                return Ok(next);
            }
            tracing::debug!(counter = %counter, attempt, "counter contended, retrying");
        }

        tracing::warn!(
            counter = %counter,
            attempts = self.max_attempts,
            "counter allocation exhausted"
        );
        Err(AllocationError::Exhausted {
            counter: counter.to_string(),
            attempts: self.max_attempts,
        })
    }

    /// Allocates the next value and formats it as `<prefix>-<value>`.
    ///
    /// # Errors
    ///
    /// See [`next_value`](Self::next_value).
    pub async fn next_document_number(
        &self,
        counter: &CounterName,
        start_from: i64,
        prefix: &str,
    ) -> Result<DocumentNumber, AllocationError> {
        let value = self.next_value(counter, start_from).await?;
        Ok(DocumentNumber::new(prefix, value))
    }
}

fn next_after(
    counter: &CounterName,
    current: Option<&Value>,
    start_from: i64,
) -> Result<i64, AllocationError> {
    let Some(current) = current else {
        return Ok(start_from);
    };
    let n = current
        .as_i64()
        .ok_or_else(|| AllocationError::NotAnInteger {
            counter: counter.to_string(),
            found: current.to_string(),
        })?;
    n.checked_add(1).ok_or_else(|| AllocationError::Overflow {
        counter: counter.to_string(),
    })
}

/// A human-facing document number such as `RCPT-1000`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentNumber {
    prefix: String,
    value: i64,
}

impl DocumentNumber {
    /// Creates a document number. An empty prefix formats as the bare value.
    #[must_use]
    pub fn new(prefix: impl Into<String>, value: i64) -> Self {
        Self {
            prefix: prefix.into(),
            value,
        }
    }

    /// Returns the prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the allocated value.
    #[must_use]
    pub fn value(&self) -> i64 {
        self.value
    }
}

impl fmt::Display for DocumentNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix.is_empty() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{}-{}", self.prefix, self.value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDatastore;
    use serde_json::json;
    use tally_types::assert_error_codes;

    fn counter(name: &str) -> CounterName {
        CounterName::parse(name).expect("valid counter")
    }

    #[tokio::test]
    async fn unset_counter_starts_at_floor() {
        let counters = CounterAllocator::new(MemoryDatastore::new());
        assert_eq!(counters.next_value(&counter("x"), 7).await.unwrap(), 7);
        assert_eq!(counters.next_value(&counter("x"), 7).await.unwrap(), 8);
        // The floor only applies to unset counters.
        assert_eq!(counters.next_value(&counter("x"), 500).await.unwrap(), 9);
    }

    #[tokio::test]
    async fn non_integer_value_fails() {
        let datastore = MemoryDatastore::from_value(json!({"counters": {"x": "ten"}}));
        let counters = CounterAllocator::new(datastore.clone());

        let err = counters.next_value(&counter("x"), 1000).await.unwrap_err();
        assert!(matches!(err, AllocationError::NotAnInteger { .. }));
        assert_eq!(
            datastore.snapshot()["counters"]["x"],
            json!("ten"),
            "failed allocation must not write"
        );
    }

    #[tokio::test]
    async fn overflow_fails() {
        let datastore = MemoryDatastore::from_value(json!({"counters": {"x": i64::MAX}}));
        let err = CounterAllocator::new(datastore)
            .next_value(&counter("x"), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, AllocationError::Overflow { .. }));
    }

    #[tokio::test]
    async fn closed_datastore_is_store_error() {
        let datastore = MemoryDatastore::new();
        datastore.close();
        let err = CounterAllocator::new(datastore)
            .next_value(&counter("x"), 0)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AllocationError::Store {
                source: StoreError::Closed,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn scoped_counters_are_independent() {
        let counters = CounterAllocator::new(MemoryDatastore::new());
        let day_a = CounterName::scoped("pos", &["20240101", "u1"]).unwrap();
        let day_b = CounterName::scoped("pos", &["20240102", "u1"]).unwrap();

        assert_eq!(counters.next_value(&day_a, 1).await.unwrap(), 1);
        assert_eq!(counters.next_value(&day_a, 1).await.unwrap(), 2);
        assert_eq!(counters.next_value(&day_b, 1).await.unwrap(), 1);
    }

    #[test]
    fn zero_attempts_means_one() {
        let counters = CounterAllocator::new(MemoryDatastore::new()).with_max_attempts(0);
        assert_eq!(counters.max_attempts(), 1);
    }

    #[test]
    fn document_number_display() {
        assert_eq!(DocumentNumber::new("RCPT", 1000).to_string(), "RCPT-1000");
        assert_eq!(DocumentNumber::new("", 42).to_string(), "42");
    }

    #[test]
    fn error_codes() {
        let errors = vec![
            AllocationError::Exhausted {
                counter: "x".into(),
                attempts: 3,
            },
            AllocationError::NotAnInteger {
                counter: "x".into(),
                found: "\"ten\"".into(),
            },
            AllocationError::Overflow { counter: "x".into() },
            AllocationError::Store {
                counter: "x".into(),
                source: StoreError::Closed,
            },
        ];
        assert_error_codes(&errors, "COUNTER_");
        assert!(errors[0].is_recoverable());
        assert!(!errors[1].is_recoverable());
    }
}
