//! Defines the canonical, deterministic binary codec for all consensus-critical state.
//!
//! This module provides thin wrappers around MsgPack (`rmp-serde`), the wire
//! format used for every entity persisted to the state tree and the index
//! database. By centralizing the codec logic here in the base `types` crate,
//! we ensure that all components use the exact same serialization format,
//! preventing consensus failures due to different binary representations of
//! the same data. Entities keep their mappings in `BTreeMap`s so the encoded
//! bytes are deterministic.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encodes a value into its canonical MsgPack byte representation.
///
/// This function must be used for all data that is written to
/// consensus-critical state or included in a hash.
pub fn to_bytes_canonical<T: Serialize>(v: &T) -> Result<Vec<u8>, String> {
    rmp_serde::to_vec(v).map_err(|e| format!("canonical encode failed: {}", e))
}

/// Decodes a value from its canonical MsgPack byte representation.
///
/// Fails fast on any decoding error; malformed persisted bytes indicate
/// corruption and must never be silently accepted in a consensus context.
pub fn from_bytes_canonical<T: DeserializeOwned>(b: &[u8]) -> Result<T, String> {
    rmp_serde::from_slice(b).map_err(|e| format!("canonical decode failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
    struct TestStruct {
        id: u32,
        name: String,
        tags: Vec<u8>,
    }

    #[test]
    fn canonical_codec_roundtrip() {
        let original = TestStruct {
            id: 42,
            name: "test-data".to_string(),
            tags: vec![1, 2, 3],
        };

        let encoded = to_bytes_canonical(&original).unwrap();
        assert!(!encoded.is_empty());

        let decoded = from_bytes_canonical::<TestStruct>(&encoded).unwrap();
        assert_eq!(original, decoded);

        let mut map = BTreeMap::new();
        map.insert("a".to_string(), 1u64);
        map.insert("b".to_string(), 2u64);
        let encoded_map = to_bytes_canonical(&map).unwrap();
        let decoded_map = from_bytes_canonical::<BTreeMap<String, u64>>(&encoded_map).unwrap();
        assert_eq!(map, decoded_map);
    }

    #[test]
    fn canonical_decode_failure() {
        let original = TestStruct {
            id: 99,
            name: "another-test".to_string(),
            tags: vec![10, 20, 30],
        };

        let mut encoded = to_bytes_canonical(&original).unwrap();
        encoded.pop();
        encoded.pop();

        let result = from_bytes_canonical::<TestStruct>(&encoded);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("canonical decode failed"));
    }

    #[test]
    fn encoding_is_deterministic() {
        let a = TestStruct {
            id: 7,
            name: "same".into(),
            tags: vec![9, 9],
        };
        let b = TestStruct {
            id: 7,
            name: "same".into(),
            tags: vec![9, 9],
        };
        assert_eq!(
            to_bytes_canonical(&a).unwrap(),
            to_bytes_canonical(&b).unwrap()
        );
    }
}
