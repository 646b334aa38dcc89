//! Random tokens and identifiers.
//!
//! Used to mint workspace access tokens and the random suffix that makes
//! workspace names unique.

use rand::prelude::*;
use sha2::{Digest, Sha256};

const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ\
                              abcdefghijklmnopqrstuvwxyz\
                              0123456789";

const LOWER_ALPHANUMERIC: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

fn random_string(charset: &[u8], length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..charset.len());
            charset[idx] as char
        })
        .collect()
}

/// Generate a random token of mixed-case alphanumerics.
pub fn generate_token(length: usize) -> String {
    random_string(ALPHANUMERIC, length)
}

/// Generate a random suffix usable inside DNS labels and Kubernetes names.
pub fn generate_name_suffix(length: usize) -> String {
    random_string(LOWER_ALPHANUMERIC, length)
}

/// Hex-encoded SHA-256 digest of a token, the only form a token is stored in.
pub fn digest_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{:x}", digest)
}
