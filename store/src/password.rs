//! Salted password hashing for stored user records.
//!
//! A stored hash looks like `<hex digest>.<hex salt>`. The digest is SHA-256
//! iterated [`ROUNDS`] times over `salt || password`.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Separates digest and salt.
///
/// Any input containing it is taken to be hashed already and stored as is.
/// A plaintext password with a `.` in it (`my.pass`) therefore ends up stored
/// in the clear and can never pass [`verify_password`]; callers that accept
/// new passwords should reject the delimiter up front.
pub const DELIMITER: char = '.';

const ROUNDS: u32 = 10_000;

/// True if `value` already has the `<digest>.<salt>` shape.
pub fn is_hashed(value: &str) -> bool {
    value.contains(DELIMITER)
}

pub fn hash_password(password: &str) -> String {
    let salt = uuid::Uuid::new_v4().simple().to_string();
    format!("{}{}{}", digest_hex(password, &salt), DELIMITER, salt)
}

/// Hash `password` unless it is already in stored form.
pub fn ensure_hashed(password: String) -> String {
    if is_hashed(&password) {
        password
    } else {
        hash_password(&password)
    }
}

/// Check a candidate password against a stored `<digest>.<salt>` value.
pub fn verify_password(candidate: &str, stored: &str) -> bool {
    let Some((expected, salt)) = stored.split_once(DELIMITER) else {
        return false;
    };
    let actual = digest_hex(candidate, salt);
    actual.as_bytes().ct_eq(expected.as_bytes()).into()
}

fn digest_hex(password: &str, salt: &str) -> String {
    let mut digest = Sha256::new()
        .chain_update(salt.as_bytes())
        .chain_update(password.as_bytes())
        .finalize();
    for _ in 1..ROUNDS {
        digest = Sha256::digest(digest);
    }
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
