//! JSON codec used for request bodies, structured query values and responses.

use crate::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Serialize a value to JSON text
pub fn serialize<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| Error::Serialization(e.to_string()))
}

/// Deserialize JSON text into `T`
pub fn deserialize<T: DeserializeOwned>(text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|e| Error::Deserialization(e.to_string()))
}

/// Deserialize JSON bytes into `T`
pub fn deserialize_slice<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| Error::Deserialization(e.to_string()))
}
