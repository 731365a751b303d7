//! Collection types for Tessera.
//!
//! Re-exports of hash collections using AHash. Texture name lookups and the
//! backend resource caches sit on the hot submission path, so the faster hasher
//! is used everywhere.

pub use ahash::{AHashMap as HashMap, AHashSet as HashSet, RandomState};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashmap_ahash() {
        let mut map = HashMap::new();
        map.insert("grass.png", 3u32);
        assert_eq!(map.get("grass.png"), Some(&3));
    }

    #[test]
    fn test_hashset_ahash() {
        let mut set = HashSet::new();
        set.insert("grass.png");
        assert!(set.contains("grass.png"));
        assert!(!set.insert("grass.png"));
    }
}
