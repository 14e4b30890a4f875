//! Password hashes written by the previous Flask deployment.
//!
//! werkzeug stores `method$salt$hex`, where `method` is
//! `scrypt:<n>:<r>:<p>` or `pbkdf2:<sha256|sha512>[:<iterations>]`. The salt
//! is used as its UTF-8 bytes. A successful check means the caller should
//! replace the stored value with an Argon2 hash.

use sha2::{Sha256, Sha512};

/// werkzeug's default when the iteration count is omitted.
const DEFAULT_PBKDF2_ITERATIONS: u32 = 600_000;

/// scrypt output length used by werkzeug.
const SCRYPT_KEY_LEN: usize = 64;

/// Whether `stored` looks like a werkzeug hash rather than a PHC string.
#[must_use]
pub fn is_werkzeug_hash(stored: &str) -> bool {
    stored.starts_with("scrypt:") || stored.starts_with("pbkdf2:")
}

/// Check `password` against a werkzeug hash.
///
/// Unknown methods and malformed parameters never verify.
#[must_use]
pub fn verify_werkzeug_hash(password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    let (Some(method), Some(salt), Some(expected)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    let derived = match method.split(':').collect::<Vec<_>>().as_slice() {
        ["scrypt", n, r, p] => scrypt_key(password, salt, n, r, p),
        ["pbkdf2", digest] => pbkdf2_key(password, salt, digest, DEFAULT_PBKDF2_ITERATIONS),
        ["pbkdf2", digest, iterations] => iterations
            .parse()
            .ok()
            .and_then(|rounds| pbkdf2_key(password, salt, digest, rounds)),
        _ => None,
    };

    derived.is_some_and(|key| constant_time_compare(&hex::encode(key), expected))
}

fn scrypt_key(password: &str, salt: &str, n: &str, r: &str, p: &str) -> Option<Vec<u8>> {
    let n: u64 = n.parse().ok()?;
    if !n.is_power_of_two() || n < 2 {
        return None;
    }
    let log_n = u8::try_from(n.trailing_zeros()).ok()?;
    let params = scrypt::Params::new(log_n, r.parse().ok()?, p.parse().ok()?, SCRYPT_KEY_LEN).ok()?;

    let mut key = vec![0u8; SCRYPT_KEY_LEN];
    scrypt::scrypt(password.as_bytes(), salt.as_bytes(), &params, &mut key).ok()?;
    Some(key)
}

fn pbkdf2_key(password: &str, salt: &str, digest: &str, rounds: u32) -> Option<Vec<u8>> {
    if rounds == 0 {
        return None;
    }

    match digest {
        "sha256" => {
            let mut key = vec![0u8; 32];
            pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), rounds, &mut key);
            Some(key)
        }
        "sha512" => {
            let mut key = vec![0u8; 64];
            pbkdf2::pbkdf2_hmac::<Sha512>(password.as_bytes(), salt.as_bytes(), rounds, &mut key);
            Some(key)
        }
        _ => None,
    }
}

/// Constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}
