//! Key/value store
//!
//! A fixed-bucket, string-keyed map of [`Value`]s. It is both the
//! intermediate representation between the object-text format and entity
//! readers/writers, and a general property bag.
//!
//! Iteration walks buckets in order and entries in insertion order within a
//! bucket, so the order depends only on the key set and insertion history.

use log::warn;

use super::value::{coerce, FromValue, Value, ValueError};

/// Number of hash buckets
pub const NUM_BUCKETS: usize = 10;

/// Longest key kept, in bytes
pub const MAX_KEY_LEN: usize = 128;

/// Errors from typed store access
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Key not present
    #[error("key '{0}' not found")]
    MissingKey(String),

    /// Value present but not convertible
    #[error("key '{key}': {source}")]
    Value {
        /// Key that was read
        key: String,
        /// Conversion failure
        #[source]
        source: ValueError,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct StoreEntry {
    key: String,
    value: Value,
}

/// String-keyed map of tagged values
#[derive(Debug, Clone, PartialEq)]
pub struct KeyValueStore {
    buckets: Vec<Vec<StoreEntry>>,
    len: usize,
}

impl KeyValueStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            buckets: vec![Vec::new(); NUM_BUCKETS],
            len: 0,
        }
    }

    fn bucket_index(key: &str) -> usize {
        let hash = key
            .bytes()
            .fold(0_u32, |hash, byte| hash.wrapping_mul(51).wrapping_add(u32::from(byte)));
        hash as usize % NUM_BUCKETS
    }

    fn clamp_key(key: &str) -> &str {
        if key.len() <= MAX_KEY_LEN {
            return key;
        }
        let mut end = MAX_KEY_LEN;
        while !key.is_char_boundary(end) {
            end -= 1;
        }
        warn!("Key '{}...' exceeds {} bytes and was truncated", &key[..end], MAX_KEY_LEN);
        &key[..end]
    }

    fn entry(&self, key: &str) -> Option<&StoreEntry> {
        let key = Self::clamp_key(key);
        self.buckets[Self::bucket_index(key)]
            .iter()
            .find(|entry| entry.key == key)
    }

    /// Insert or overwrite a value
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        let key = Self::clamp_key(key);
        let value = value.into();
        let bucket = &mut self.buckets[Self::bucket_index(key)];

        if let Some(entry) = bucket.iter_mut().find(|entry| entry.key == key) {
            entry.value = value;
        } else {
            bucket.push(StoreEntry { key: key.to_string(), value });
            self.len += 1;
        }
    }

    /// Stored value for `key`, exactly as it was set
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entry(key).map(|entry| &entry.value)
    }

    /// Whether `key` is present
    pub fn exists(&self, key: &str) -> bool {
        self.entry(key).is_some()
    }

    /// Remove `key`, returning its value
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let key = Self::clamp_key(key);
        let bucket = &mut self.buckets[Self::bucket_index(key)];
        let position = bucket.iter().position(|entry| entry.key == key)?;
        self.len -= 1;
        Some(bucket.remove(position).value)
    }

    /// Typed read, coercing the stored value when needed
    pub fn get_as<T: FromValue>(&self, key: &str) -> Result<T, StoreError> {
        let value = self
            .get(key)
            .ok_or_else(|| StoreError::MissingKey(key.to_string()))?;

        coerce(value.clone(), T::KIND)
            .map(T::from_value)
            .map_err(|source| StoreError::Value { key: key.to_string(), source })?
            .ok_or_else(|| StoreError::Value {
                key: key.to_string(),
                source: ValueError::IncompatibleKinds { from: value.kind(), to: T::KIND },
            })
    }

    /// Overwrite `target` with the value stored under `key`
    ///
    /// Missing keys leave `target` untouched. Values that fail to convert are
    /// reported and also leave it untouched. Returns whether `target` changed.
    pub fn read_into<T: FromValue>(&self, key: &str, target: &mut T) -> bool {
        match self.get_as::<T>(key) {
            Ok(value) => {
                *target = value;
                true
            }
            Err(StoreError::MissingKey(_)) => false,
            Err(err) => {
                warn!("Ignoring unreadable value: {err}");
                false
            }
        }
    }

    /// Warn about every key not listed in `known`
    ///
    /// Returns the number of unknown keys.
    pub fn warn_unknown_keys(&self, known: &[&str], context: &str) -> usize {
        let mut unknown = 0;
        for (key, _) in self.iter() {
            if !known.contains(&key) {
                warn!("Unknown key '{key}' in {context}, value ignored");
                unknown += 1;
            }
        }
        unknown
    }

    /// Entries in serialization order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.buckets
            .iter()
            .flatten()
            .map(|entry| (entry.key.as_str(), &entry.value))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the store has no entries
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.buckets.iter_mut().for_each(Vec::clear);
        self.len = 0;
    }
}

impl Default for KeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;

    #[test]
    fn test_set_get_exists_remove() {
        let mut store = KeyValueStore::new();
        store.set("name", "Crate");
        store.set("health", 30_i32);

        assert!(store.exists("name"));
        assert_eq!(store.get("health"), Some(&Value::Int(30)));
        assert_eq!(store.len(), 2);

        assert_eq!(store.remove("name"), Some(Value::from("Crate")));
        assert!(!store.exists("name"));
        assert_eq!(store.remove("name"), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_overwrite_keeps_single_entry_and_position() {
        let mut store = KeyValueStore::new();
        store.set("a", 1_i32);
        store.set("b", 2_i32);
        let order_before: Vec<_> = store.iter().map(|(k, _)| k.to_string()).collect();

        store.set("a", 10_i32);
        let order_after: Vec<_> = store.iter().map(|(k, _)| k.to_string()).collect();

        assert_eq!(store.len(), 2);
        assert_eq!(order_before, order_after);
        assert_eq!(store.get("a"), Some(&Value::Int(10)));
    }

    #[test]
    fn test_iteration_order_is_independent_of_store_instance() {
        let keys = ["position", "rotation", "scale", "name", "type", "parent"];
        let mut first = KeyValueStore::new();
        let mut second = KeyValueStore::new();
        for key in keys {
            first.set(key, 0_i32);
            second.set(key, 1_i32);
        }

        let first_keys: Vec<_> = first.iter().map(|(k, _)| k).collect();
        let second_keys: Vec<_> = second.iter().map(|(k, _)| k).collect();
        assert_eq!(first_keys, second_keys);
    }

    #[test]
    fn test_typed_read_coerces_text() {
        let mut store = KeyValueStore::new();
        store.set("position", "1 2 3");
        store.set("fov", "60.0");

        assert_eq!(store.get_as::<Vec3>("position"), Ok(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(store.get_as::<f32>("fov"), Ok(60.0));
        // Stored value is still text
        assert_eq!(store.get("fov").map(Value::kind), Some(crate::serialization::ValueKind::Str));
    }

    #[test]
    fn test_typed_read_errors() {
        let mut store = KeyValueStore::new();
        store.set("loop", "maybe");

        assert_eq!(
            store.get_as::<bool>("volume"),
            Err(StoreError::MissingKey("volume".to_string()))
        );
        assert!(matches!(store.get_as::<bool>("loop"), Err(StoreError::Value { .. })));
    }

    #[test]
    fn test_read_into_leaves_target_on_failure() {
        let mut store = KeyValueStore::new();
        store.set("volume", "loud");
        store.set("loop", "true");

        let mut volume = 0.5_f32;
        let mut looping = false;
        assert!(!store.read_into("volume", &mut volume));
        assert!(!store.read_into("missing", &mut volume));
        assert!(store.read_into("loop", &mut looping));
        assert!((volume - 0.5).abs() < f32::EPSILON);
        assert!(looping);
    }

    #[test]
    fn test_unknown_keys_counted() {
        let mut store = KeyValueStore::new();
        store.set("name", "a");
        store.set("colour", "1 1 1");
        assert_eq!(store.warn_unknown_keys(&["name"], "test"), 1);
    }

    #[test]
    fn test_long_keys_truncated() {
        let mut store = KeyValueStore::new();
        let long_key = "k".repeat(MAX_KEY_LEN + 10);
        store.set(&long_key, true);
        assert!(store.exists(&"k".repeat(MAX_KEY_LEN)));
        assert!(store.exists(&long_key));
    }

    #[test]
    fn test_clear() {
        let mut store = KeyValueStore::new();
        store.set("x", 1.0_f32);
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.iter().count(), 0);
    }
}
