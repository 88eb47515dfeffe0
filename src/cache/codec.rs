//! Payload Codec
//!
//! Serialization boundary between typed result containers and the opaque
//! bytes held by the Cache Store. JSON keeps payloads inspectable.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{CacheError, Result};

/// Encodes a value into a cache payload.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value)
        .map_err(|e| CacheError::Serialization(format!("Failed to encode payload: {}", e)))
}

/// Decodes a cache payload into a fresh value.
pub fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
    serde_json::from_slice(payload)
        .map_err(|e| CacheError::Serialization(format!("Failed to decode payload: {}", e)))
}
