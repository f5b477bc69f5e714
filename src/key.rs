//! Physical key derivation.
//!
//! The store rejects keys longer than [`MAX_KEY_LENGTH`] bytes. Logical keys past that limit
//! are replaced by the lowercase hex SHA-256 digest of the whole key, so callers never see a
//! key-length error. Prefixing happens first: the digest always covers the fully qualified key.

use std::borrow::Cow;

use sha2::{Digest, Sha256};

/// Maximum key length, in UTF-8 bytes, accepted by the store.
pub const MAX_KEY_LENGTH: usize = 250;

/// Lowercase hexadecimal SHA-256 digest of `input`.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Returns `key` unchanged if it fits the store, its digest otherwise.
pub fn prepare_key(key: &str) -> Cow<'_, str> {
    if key.len() > MAX_KEY_LENGTH {
        Cow::Owned(sha256_hex(key))
    } else {
        Cow::Borrowed(key)
    }
}

/// `{prefix}_{key}`
pub fn prefixed_key(prefix: &str, key: &str) -> String {
    format!("{}_{}", prefix, key)
}

/// Key of the member document holding `identifier` within the set stored at `set_key`.
pub fn member_key(set_key: &str, identifier: &str) -> String {
    format!("{}_{}", set_key, identifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_non_ascii_input() {
        assert_eq!(
            sha256_hex("zażółć gęślą jaźń"),
            "ab4e973a71cf9dd8a6d0d9b8030029b219b6e162d1dbdf0ad0ebf0dd698d6057"
        );
    }

    #[test]
    fn short_keys_pass_through() {
        let key = "k".repeat(MAX_KEY_LENGTH);
        assert!(matches!(prepare_key(&key), Cow::Borrowed(_)));
        assert_eq!(prepare_key(&key), key.as_str());
    }

    #[test]
    fn long_keys_are_replaced_by_digest() {
        let key = "id".repeat(250);
        let prepared = prepare_key(&key);
        assert_eq!(prepared.len(), 64);
        assert_eq!(prepared, sha256_hex(&key));
    }

    #[test]
    fn length_is_measured_in_bytes() {
        // 250 characters, 274 bytes
        let key = "long key with custom letters which makes utf8 byte array longer than string zazółć gęślą jaźń "
            .repeat(2)
            + "long key with custom letters which makes utf zazółć gęślą jaźń";
        assert_eq!(key.chars().count(), 250);
        assert_eq!(
            prepare_key(&key),
            "cbaaf74e5a2019cda82fb505f1ecb8ead6144a16a07817f4c09eb32c56b05bcb"
        );
    }

    #[test]
    fn prefix_is_joined_with_underscore() {
        assert_eq!(prefixed_key("offers", "k1"), "offers_k1");
        assert_eq!(member_key("set", "m1"), "set_m1");
    }
}
