//! Serialization
//!
//! Tagged values, the key/value store and the object-text file format.

pub mod parser;
pub mod store;
pub mod value;

pub use parser::{
    load_objects, read_objects, save_objects, write_objects, ObjectKind, ParseError, ParsedObject,
};
pub use store::{KeyValueStore, StoreError};
pub use value::{coerce, FromValue, Value, ValueError, ValueKind};
