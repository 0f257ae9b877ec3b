//! Value encoding shared by every layer that writes to a `RecordStore`.
//!
//! Records, index sets and seed markers are stored as JSON so that a store
//! dump stays readable with ordinary tools.

use super::{Result, StoreError};
use serde::{Serialize, de::DeserializeOwned};

pub fn encode<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|err| StoreError::codec(key, err))
}

pub fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|err| StoreError::codec(key, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn decode_reports_offending_key() {
        let err = decode::<BTreeSet<String>>("users", b"{not json").unwrap_err();
        match err {
            StoreError::Codec(key, _) => assert_eq!(key, "users"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn sets_encode_as_sorted_arrays() {
        let ids: BTreeSet<String> = ["b", "a", "c"].iter().map(|s| s.to_string()).collect();
        let bytes = encode("ids", &ids).unwrap();
        assert_eq!(bytes, br#"["a","b","c"]"#.to_vec());
    }
}
