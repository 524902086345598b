// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Secure random identifiers and tokens.

use crate::error::AppError;
use ring::rand::{SecureRandom, SystemRandom};

/// Bytes of entropy in verification and reset tokens (256 bits).
pub const TOKEN_BYTES: usize = 32;
/// Bytes in a document id (same size as a Mongo ObjectId).
pub const ID_BYTES: usize = 12;

/// Fill `buf` from the system CSPRNG.
pub fn fill(buf: &mut [u8]) -> Result<(), AppError> {
    SystemRandom::new()
        .fill(buf)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))
}

/// `len` random bytes, hex encoded.
pub fn random_hex(len: usize) -> Result<String, AppError> {
    let mut bytes = vec![0u8; len];
    fill(&mut bytes)?;
    Ok(hex::encode(bytes))
}

/// New opaque token for an email link.
pub fn new_token() -> Result<String, AppError> {
    random_hex(TOKEN_BYTES)
}

/// New document id.
pub fn new_id() -> Result<String, AppError> {
    random_hex(ID_BYTES)
}
