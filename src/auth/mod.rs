//! Authentication module: password hashing and session verification.

mod extractor;

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;

pub use extractor::SessionAuth;

use crate::models::UserRole;

/// PBKDF2-HMAC-SHA256 iteration count for newly hashed passwords.
const PBKDF2_ITERATIONS: u32 = 600_000;

/// Salt length in bytes.
const SALT_LENGTH: usize = 16;

/// Derived key length in bytes.
const HASH_LENGTH: usize = 32;

/// Identifier stored in the encoded hash string.
const ALGORITHM: &str = "pbkdf2_sha256";

/// The authenticated user resolved from a session cookie.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: uuid::Uuid,
    pub username: String,
    pub role: UserRole,
}

/// Well-formed hash of no real password. Verified against when a login
/// names an unknown user, so both paths cost one PBKDF2 derivation.
pub const DUMMY_HASH: &str = "pbkdf2_sha256$600000$633f3a36cb9b5b3c8f2d1e0a47965d21$8b1a9953c4611296a827abf8c47804d7f6b5c1e0d9e8a7b6c5d4e3f2a1b0c9d8";

/// Hash a password for storage.
///
/// Encoded as `pbkdf2_sha256$<iterations>$<salt-hex>$<hash-hex>` so the
/// iteration count can be raised later without invalidating old hashes.
pub fn hash_password(password: &str) -> String {
    let salt: [u8; SALT_LENGTH] = rand::random();
    let mut derived = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, PBKDF2_ITERATIONS, &mut derived);

    format!(
        "{}${}${}${}",
        ALGORITHM,
        PBKDF2_ITERATIONS,
        hex::encode(salt),
        hex::encode(derived)
    )
}

/// Verify a password against a stored encoded hash.
///
/// Uses `subtle::ConstantTimeEq` for the final comparison so a mismatch
/// position cannot be observed through timing.
pub fn verify_password(password: &str, encoded: &str) -> bool {
    let mut parts = encoded.split('$');

    let algorithm = parts.next();
    let iterations = parts.next().and_then(|s| s.parse::<u32>().ok());
    let salt = parts.next().and_then(|s| hex::decode(s).ok());
    let expected = parts.next().and_then(|s| hex::decode(s).ok());

    let (Some(ALGORITHM), Some(iterations), Some(salt), Some(expected)) =
        (algorithm, iterations, salt, expected)
    else {
        return false;
    };

    if iterations == 0 || expected.is_empty() {
        return false;
    }

    let mut derived = vec![0u8; expected.len()];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut derived);

    derived.ct_eq(&expected).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_round_trip() {
        let encoded = hash_password("correct horse battery staple");
        assert!(encoded.starts_with("pbkdf2_sha256$"));
        assert!(verify_password("correct horse battery staple", &encoded));
        assert!(!verify_password("wrong password", &encoded));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same password");
        let b = hash_password("same password");
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(!verify_password("anything", ""));
        assert!(!verify_password("anything", "not-a-hash"));
        assert!(!verify_password("anything", "md5$1$00$00"));
        assert!(!verify_password("anything", "pbkdf2_sha256$notanumber$00$00"));
    }
}
