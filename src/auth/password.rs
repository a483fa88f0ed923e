use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 digest, the form stored in the credential table
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Compare a plaintext password against a stored digest (hex case ignored)
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let stored = stored_hash.trim();
    !stored.is_empty() && hash_password(password).eq_ignore_ascii_case(stored)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            hash_password("secret"),
            "2bb80d537b1da3e38bd30361aa855686bde0eacd7162fef6a25fe97bf527a25b"
        );
    }

    #[test]
    fn test_verify() {
        let stored = hash_password("secret");
        assert!(verify_password("secret", &stored));
        assert!(verify_password("secret", &stored.to_uppercase()));
        assert!(!verify_password("Secret", &stored));
        assert!(!verify_password("", ""));
    }
}
