//! Argon2id password hashing.
//!
//! The encoded output carries variant, version, cost parameters and salt, so a
//! stored hash can be verified without any out-of-band configuration.

use argon2::{Config, Variant, Version};
use rand::{rngs::OsRng, RngCore};

use crate::types::HashedPassword;

const SALT_LEN: usize = 16;
const HASH_LEN: u32 = 32;
const MEMORY_COST_KIB: u32 = 19 * 1024;
const TIME_COST: u32 = 2;
const LANES: u32 = 1;

fn config() -> Config<'static> {
    Config {
        variant: Variant::Argon2id,
        version: Version::Version13,
        mem_cost: MEMORY_COST_KIB,
        time_cost: TIME_COST,
        lanes: LANES,
        hash_length: HASH_LEN,
        ..Config::default()
    }
}

/// Hash `password` with a fresh salt drawn from the OS random source.
pub fn hash_password(password: &str) -> Result<HashedPassword, argon2::Error> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    argon2::hash_encoded(password.as_bytes(), &salt, &config()).map(HashedPassword)
}

/// Re-derive the digest with the parameters embedded in `hash` and compare in constant time.
///
/// A hash that fails to parse never verifies.
pub fn verify_password(password: &str, hash: &HashedPassword) -> bool {
    argon2::verify_encoded(&hash.0, password.as_bytes()).unwrap_or(false)
}

/// A hash of random bytes nobody knows the preimage of. Checked against when
/// a sign-in names an unknown user so both failure paths cost the same.
pub(crate) fn decoy_hash() -> Result<HashedPassword, argon2::Error> {
    let mut secret = [0u8; 32];
    OsRng.fill_bytes(&mut secret);

    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    argon2::hash_encoded(&secret, &salt, &config()).map(HashedPassword)
}
