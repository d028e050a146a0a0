use serde::Serialize;
use sha2::{Digest, Sha256};

/// SHA-256 hex digest of the JSON form of `input`.
///
/// Maps are `BTreeMap`s throughout, so equal inputs always serialize to the
/// same bytes and the digest can key a result cache.
pub fn input_fingerprint<T: Serialize>(input: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(input)?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::counts;

    #[test]
    fn equal_inputs_share_a_fingerprint() {
        let first = input_fingerprint(&counts(&[("A", 10), ("B", 12)])).unwrap();
        let second = input_fingerprint(&counts(&[("B", 12), ("A", 10)])).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn different_inputs_differ() {
        let first = input_fingerprint(&counts(&[("A", 10)])).unwrap();
        let second = input_fingerprint(&counts(&[("A", 11)])).unwrap();
        assert_ne!(first, second);
    }
}
