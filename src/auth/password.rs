//! Password hashing via bcrypt.

/// bcrypt cost factor.
const COST: u32 = 10;

/// Hash a password with a random salt. Two calls with the same input
/// produce different strings; compare with [`verify`], never by equality.
pub fn hash(plaintext: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(plaintext, COST)
}

/// Whether the plaintext matches the stored hash. A malformed hash fails
/// verification instead of surfacing an error.
pub fn verify(plaintext: &str, hash: &str) -> bool {
    bcrypt::verify(plaintext, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_original_password() {
        let hash = hash("1234567890").unwrap();
        assert!(verify("1234567890", &hash));
    }

    #[test]
    fn wrong_password_does_not_verify() {
        let hash = hash("correct horse").unwrap();
        assert!(!verify("battery staple", &hash));
    }

    #[test]
    fn salting_makes_hashes_differ() {
        let first = hash("same-password").unwrap();
        let second = hash("same-password").unwrap();
        assert_ne!(first, second);
        assert!(verify("same-password", &first));
        assert!(verify("same-password", &second));
    }

    #[test]
    fn hash_is_cost_prefixed() {
        let hash = hash("whatever").unwrap();
        assert!(hash.starts_with("$2"), "unexpected hash format: {}", hash);
    }

    #[test]
    fn malformed_hash_fails_verification() {
        assert!(!verify("password", "not-a-bcrypt-hash"));
        assert!(!verify("password", ""));
    }
}
