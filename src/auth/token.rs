//! Hashing of personal access tokens.

use sha2::{Digest, Sha256};

/// Hash a personal access token for storage and lookup.
///
/// Only the hash of a token is ever written to the database.
pub fn hash_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}
