//! Marshal/unmarshal abstraction shared by the pub/sub and memo drivers.
//! Topic/key bytes are opaque to the framework; the serializer in effect
//! determines their interpretation on the wire.

use std::fmt;

use serde::{de::DeserializeOwned, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("failed to marshal value: {0}")]
    Marshal(String),
    #[error("failed to unmarshal bytes: {0}")]
    Unmarshal(String),
}

/// A swappable wire-format codec. Drivers default to [`JsonSerializer`] and
/// may be switched per-instance via `set_serializer`.
///
/// The trait itself stays object-safe — both required methods trade in
/// already-JSON-encoded bytes, a common intermediate every format here can
/// reach from or produce. The generic, type-aware convenience wrappers
/// ([`marshal`]/[`unmarshal`]) live as free functions below, since a method
/// generic over `T` can't be called through `Arc<dyn Serializer>`.
///
/// [`marshal`]: marshal
/// [`unmarshal`]: unmarshal
pub trait Serializer: Send + Sync + fmt::Debug {
    /// Re-encodes `json_bytes` (valid JSON) into this serializer's wire
    /// format.
    fn marshal_bytes(&self, json_bytes: Vec<u8>) -> Result<Vec<u8>, SerializeError>;
    /// Decodes `bytes` from this serializer's wire format back into JSON
    /// bytes.
    fn unmarshal_bytes(&self, bytes: &[u8]) -> Result<Vec<u8>, SerializeError>;
}

/// Marshals `value` through `serializer`, routing via JSON bytes so the
/// trait itself never needs a generic, non-object-safe method.
pub fn marshal<T: Serialize>(serializer: &dyn Serializer, value: &T) -> Result<Vec<u8>, SerializeError> {
    let json_bytes = serde_json::to_vec(value).map_err(|e| SerializeError::Marshal(e.to_string()))?;
    serializer.marshal_bytes(json_bytes)
}

/// Unmarshals `bytes` through `serializer` into `T`.
pub fn unmarshal<T: DeserializeOwned>(serializer: &dyn Serializer, bytes: &[u8]) -> Result<T, SerializeError> {
    let json_bytes = serializer.unmarshal_bytes(bytes)?;
    serde_json::from_slice(&json_bytes).map_err(|e| SerializeError::Unmarshal(e.to_string()))
}

/// Default serializer: the wire format already is JSON, so both directions
/// are a pass-through.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn marshal_bytes(&self, json_bytes: Vec<u8>) -> Result<Vec<u8>, SerializeError> {
        Ok(json_bytes)
    }

    fn unmarshal_bytes(&self, bytes: &[u8]) -> Result<Vec<u8>, SerializeError> {
        Ok(bytes.to_vec())
    }
}

/// Binary serializer, backed by `bincode`. Re-parses the JSON intermediate
/// into a `serde_json::Value` so the conversion stays generic-free at the
/// trait boundary.
#[derive(Debug, Default, Clone, Copy)]
pub struct BinarySerializer;

impl Serializer for BinarySerializer {
    fn marshal_bytes(&self, json_bytes: Vec<u8>) -> Result<Vec<u8>, SerializeError> {
        let value: serde_json::Value =
            serde_json::from_slice(&json_bytes).map_err(|e| SerializeError::Marshal(e.to_string()))?;
        bincode::serialize(&value).map_err(|e| SerializeError::Marshal(e.to_string()))
    }

    fn unmarshal_bytes(&self, bytes: &[u8]) -> Result<Vec<u8>, SerializeError> {
        let value: serde_json::Value =
            bincode::deserialize(bytes).map_err(|e| SerializeError::Unmarshal(e.to_string()))?;
        serde_json::to_vec(&value).map_err(|e| SerializeError::Unmarshal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn json_round_trips() {
        let s = JsonSerializer;
        let bytes = marshal(&s, &Point { x: 1, y: 2 }).unwrap();
        let back: Point = unmarshal(&s, &bytes).unwrap();
        assert_eq!(back, Point { x: 1, y: 2 });
    }

    #[test]
    fn binary_round_trips() {
        let s = BinarySerializer;
        let bytes = marshal(&s, &Point { x: 3, y: 4 }).unwrap();
        let back: Point = unmarshal(&s, &bytes).unwrap();
        assert_eq!(back, Point { x: 3, y: 4 });
    }
}
