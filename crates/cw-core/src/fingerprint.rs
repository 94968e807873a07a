//! SHA-256 fingerprints used to synthesise stable per-entity defaults.
//!
//! Conformed attributes that the sources do not carry (access numbers,
//! gender, admission dates) are derived from a hash of the entity's natural
//! key so that re-running the pipeline over the same snapshot yields the same
//! warehouse.

use sha2::{Digest, Sha256};

/// Derive a stable 64-bit seed from a key and a purpose label.
///
/// The label keeps independent attributes of one entity uncorrelated.
pub fn stable_seed(key: &str, label: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(label.as_bytes());
    hasher.update([0u8]);
    hasher.update(key.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

/// Pick a value in `0..bound` from the seed of `key`/`label`.
pub fn stable_pick(key: &str, label: &str, bound: u64) -> u64 {
    if bound == 0 {
        return 0;
    }
    stable_seed(key, label) % bound
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_is_stable() {
        assert_eq!(
            stable_seed("STU000001", "gender"),
            stable_seed("STU000001", "gender")
        );
    }

    #[test]
    fn test_labels_separate_attributes() {
        assert_ne!(
            stable_seed("STU000001", "gender"),
            stable_seed("STU000001", "admission")
        );
    }

    #[test]
    fn test_pick_respects_bound() {
        for key in ["a", "b", "c", "d"] {
            assert!(stable_pick(key, "x", 7) < 7);
        }
        assert_eq!(stable_pick("a", "x", 0), 0);
    }
}
