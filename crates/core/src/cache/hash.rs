//! Request-identity cache key generation.

use sha2::{Digest, Sha256};

/// Compute the cache key for a request identity.
///
/// The method is uppercased so `get` and `GET` address the same entry.
pub fn compute_entry_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_stability() {
        let hash1 = compute_entry_key("GET", "https://example.com/");
        let hash2 = compute_entry_key("GET", "https://example.com/");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_method_case_insensitive() {
        assert_eq!(
            compute_entry_key("get", "https://example.com/a.css"),
            compute_entry_key("GET", "https://example.com/a.css")
        );
    }

    #[test]
    fn test_hash_different_method() {
        let get = compute_entry_key("GET", "https://example.com/");
        let head = compute_entry_key("HEAD", "https://example.com/");
        assert_ne!(get, head);
    }

    #[test]
    fn test_hash_different_url() {
        let a = compute_entry_key("GET", "https://example.com/a");
        let b = compute_entry_key("GET", "https://example.com/b");
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_format() {
        let hash = compute_entry_key("GET", "https://example.com/");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
