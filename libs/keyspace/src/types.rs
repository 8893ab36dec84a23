//! Typed ID definitions for cluster resources.

use crate::define_id;

define_id!(StoreId, "store");
define_id!(RegionId, "region");
define_id!(PeerId, "peer");

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn test_store_id_roundtrip() {
        let id = StoreId::new(42);
        let parsed: StoreId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_store_id_empty() {
        let result: Result<StoreId, _> = "".parse();
        assert!(matches!(result.unwrap_err(), crate::IdError::Empty));
    }

    #[test]
    fn test_store_id_rejects_negative_and_garbage() {
        for input in ["-1", "abc", "1.5", " 7"] {
            let err = StoreId::parse(input).unwrap_err();
            assert!(
                matches!(err, crate::IdError::InvalidNumber { kind: "store", .. }),
                "{input}: {err:?}"
            );
        }
    }

    #[test]
    fn test_id_serializes_as_number() {
        let json = serde_json::to_string(&RegionId::new(9)).unwrap();
        assert_eq!(json, "9");
        let parsed: RegionId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.get(), 9);
    }

    #[test]
    fn test_id_as_map_key_is_quoted() {
        let mut map = BTreeMap::new();
        map.insert(StoreId::new(5), "a");
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"5":"a"}"#);

        let parsed: BTreeMap<StoreId, String> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[&StoreId::new(5)], "a");
    }

    #[test]
    fn test_id_kinds_unique() {
        let kinds = [StoreId::KIND, RegionId::KIND, PeerId::KIND];
        let unique: std::collections::HashSet<_> = kinds.iter().collect();
        assert_eq!(kinds.len(), unique.len());
    }
}
