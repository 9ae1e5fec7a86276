//! Latest-value store with change notification.
//!
//! The [`StateStore`] keeps the last decoded value of every variable and calls
//! its observers only when a value actually changes (or a name is seen for
//! the first time).
//!
//! # Example
//!
//! ```
//! use ht3_driver::store::{StateStore, Value};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let store = StateStore::new();
//! let changes = Arc::new(AtomicUsize::new(0));
//! let counter = changes.clone();
//!
//! let _subscription = store.subscribe(move |_name, _value| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! store.update("ch_burner_power", Value::Integer(50));
//! store.update("ch_burner_power", Value::Integer(50));
//! assert_eq!(changes.load(Ordering::SeqCst), 1);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::Serialize;

/// Decoded variable value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Raw counter or code.
    Integer(u32),
    /// Scaled measurement (temperatures in °C).
    Decimal(f64),
    /// Single status bit.
    #[serde(serialize_with = "serialize_flag")]
    Flag(bool),
    /// Formatted `YYYY-MM-DD HH:MM:SS` timestamp.
    Timestamp(String),
}

impl Value {
    /// Numeric view of the value, `None` for timestamps.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(f64::from(*v)),
            Value::Decimal(v) => Some(*v),
            Value::Flag(v) => Some(if *v { 1.0 } else { 0.0 }),
            Value::Timestamp(_) => None,
        }
    }

    /// Flag view of the value (non-zero numbers count as set).
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Value::Flag(v) => Some(*v),
            Value::Integer(v) => Some(*v != 0),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::Decimal(v) => write!(f, "{:.1}", v),
            Value::Flag(v) => write!(f, "{}", u8::from(*v)),
            Value::Timestamp(v) => f.write_str(v),
        }
    }
}

fn serialize_flag<S: serde::Serializer>(flag: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*flag))
}

/// Observer callback, called with the variable name and its new value.
pub type Callback = Arc<dyn Fn(&str, &Value) + Send + Sync>;

/// Id reserved for the callback installed via [`StateStore::set_callback`].
const PRIMARY_CALLBACK_ID: u64 = 0;

struct Inner {
    values: HashMap<String, Value>,
    callbacks: HashMap<u64, Callback>,
    next_id: u64,
}

/// Thread-safe latest-value map with observers.
///
/// Cloning is cheap and shares the same underlying map.
#[derive(Clone)]
pub struct StateStore {
    inner: Arc<Mutex<Inner>>,
}

impl StateStore {
    /// Create an empty store without observers.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                values: HashMap::new(),
                callbacks: HashMap::new(),
                next_id: PRIMARY_CALLBACK_ID + 1,
            })),
        }
    }

    /// Store `value` under `name` and notify observers if it changed.
    ///
    /// Returns `true` if the value was new or different.
    pub fn update(&self, name: &str, value: Value) -> bool {
        let callbacks: Vec<Callback> = {
            let mut inner = self.inner.lock();
            if inner.values.get(name) == Some(&value) {
                return false;
            }
            inner.values.insert(name.to_string(), value.clone());
            inner.callbacks.values().cloned().collect()
        };

        // Lock released: observers may read the store.
        for callback in callbacks {
            callback(name, &value);
        }
        true
    }

    /// Install (or replace) the primary change callback.
    pub fn set_callback<F>(&self, callback: F)
    where
        F: Fn(&str, &Value) + Send + Sync + 'static,
    {
        self.inner
            .lock()
            .callbacks
            .insert(PRIMARY_CALLBACK_ID, Arc::new(callback));
    }

    /// Add an observer. It stays registered until the returned
    /// [`Subscription`] is dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&str, &Value) + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.callbacks.insert(id, Arc::new(callback));

        Subscription {
            id,
            store: Arc::downgrade(&self.inner),
        }
    }

    /// Last known value of `name`.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.inner.lock().values.get(name).cloned()
    }

    /// Copy of all known values.
    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.inner.lock().values.clone()
    }

    /// Number of known variables.
    pub fn len(&self) -> usize {
        self.inner.lock().values.len()
    }

    /// Check if no variable has been decoded yet.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().values.is_empty()
    }

    /// Number of registered observers (primary callback included).
    pub fn observer_count(&self) -> usize {
        self.inner.lock().callbacks.len()
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("StateStore")
            .field("values", &inner.values)
            .field("observers", &inner.callbacks.len())
            .finish()
    }
}

/// Handle of an observer added with [`StateStore::subscribe`].
///
/// Dropping it removes the observer.
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    store: Weak<Mutex<Inner>>,
}

impl Subscription {
    /// Remove the observer now.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.store.upgrade() {
            inner.lock().callbacks.remove(&self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording_store() -> (StateStore, Arc<Mutex<Vec<(String, Value)>>>) {
        let store = StateStore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        store.set_callback(move |name, value| {
            sink.lock().push((name.to_string(), value.clone()));
        });
        (store, seen)
    }

    #[test]
    fn test_repeated_value_notifies_once() {
        let (store, seen) = recording_store();

        assert!(store.update("x", Value::Integer(5)));
        assert!(!store.update("x", Value::Integer(5)));

        assert_eq!(seen.lock().as_slice(), &[("x".to_string(), Value::Integer(5))]);
    }

    #[test]
    fn test_changed_value_notifies_in_order() {
        let (store, seen) = recording_store();

        store.update("x", Value::Integer(5));
        store.update("x", Value::Integer(6));

        assert_eq!(
            seen.lock().as_slice(),
            &[
                ("x".to_string(), Value::Integer(5)),
                ("x".to_string(), Value::Integer(6)),
            ]
        );
        assert_eq!(store.get("x"), Some(Value::Integer(6)));
    }

    #[test]
    fn test_update_without_callback_is_silent() {
        let store = StateStore::new();

        assert!(store.update("hc_mode", Value::Integer(3)));
        assert_eq!(store.get("hc_mode"), Some(Value::Integer(3)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_set_callback_replaces_primary() {
        let (store, first) = recording_store();
        let second = Arc::new(Mutex::new(0usize));
        let counter = second.clone();
        store.set_callback(move |_, _| *counter.lock() += 1);

        store.update("x", Value::Flag(true));

        assert!(first.lock().is_empty());
        assert_eq!(*second.lock(), 1);
        assert_eq!(store.observer_count(), 1);
    }

    #[test]
    fn test_subscription_drop_unsubscribes() {
        let store = StateStore::new();
        let count = Arc::new(Mutex::new(0usize));
        let counter = count.clone();

        let subscription = store.subscribe(move |_, _| *counter.lock() += 1);
        store.update("a", Value::Integer(1));
        assert_eq!(store.observer_count(), 1);

        drop(subscription);
        store.update("a", Value::Integer(2));

        assert_eq!(*count.lock(), 1);
        assert_eq!(store.observer_count(), 0);
    }

    #[test]
    fn test_callback_may_read_store() {
        let store = StateStore::new();
        let reader = store.clone();
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();

        let _subscription = store.subscribe(move |name, _| {
            *sink.lock() = reader.get(name);
        });
        store.update("dhw_Tmeasured", Value::Decimal(48.5));

        assert_eq!(*seen.lock(), Some(Value::Decimal(48.5)));
    }

    #[test]
    fn test_type_change_counts_as_change() {
        let store = StateStore::new();
        store.update("x", Value::Integer(1));
        assert!(store.update("x", Value::Flag(true)));
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Integer(50).to_string(), "50");
        assert_eq!(Value::Decimal(21.5).to_string(), "21.5");
        assert_eq!(Value::Flag(true).to_string(), "1");
        assert_eq!(Value::Flag(false).to_string(), "0");
        assert_eq!(
            Value::Timestamp("2023-05-03 10:30:00".into()).to_string(),
            "2023-05-03 10:30:00"
        );
    }

    #[test]
    fn test_value_json() {
        assert_eq!(serde_json::to_string(&Value::Flag(true)).unwrap(), "1");
        assert_eq!(serde_json::to_string(&Value::Decimal(48.5)).unwrap(), "48.5");
        assert_eq!(serde_json::to_string(&Value::Integer(7)).unwrap(), "7");
    }
}
