// crates/chitfund-core/src/crypto.rs
//
// Password hashing (argon2id, PHC strings) and session token signing
// (HMAC-SHA256 over the session UUID).
//
// Token wire format: `{session_uuid}.{hex(hmac)}`. The MAC lets the server
// reject forged or tampered tokens before touching the session table.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use uuid::Uuid;

use crate::error::ChitError;

type HmacSha256 = Hmac<Sha256>;

/// Length of a session signing secret in bytes.
pub const SECRET_LEN: usize = 32;

/// Hash a password into an argon2id PHC string.
pub fn hash_password(password: &str) -> Result<String, ChitError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ChitError::Crypto(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a stored PHC string.
///
/// Returns `Ok(false)` on mismatch; `Err` only if the stored hash is malformed.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, ChitError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| ChitError::Crypto(format!("Stored password hash is invalid: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Generate a random signing secret.
pub fn generate_secret() -> [u8; SECRET_LEN] {
    let mut secret = [0u8; SECRET_LEN];
    OsRng.fill_bytes(&mut secret);
    secret
}

/// Decode a hex-encoded signing secret.
pub fn decode_secret(hex_str: &str) -> Result<[u8; SECRET_LEN], ChitError> {
    let bytes = hex::decode(hex_str.trim())
        .map_err(|e| ChitError::Crypto(format!("Invalid secret hex: {}", e)))?;
    bytes
        .try_into()
        .map_err(|_| ChitError::Crypto(format!("Secret must be exactly {} bytes", SECRET_LEN)))
}

fn session_mac(secret: &[u8; SECRET_LEN], session_id: &Uuid) -> Result<HmacSha256, ChitError> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| ChitError::Crypto(format!("Invalid HMAC key: {}", e)))?;
    mac.update(session_id.as_bytes());
    Ok(mac)
}

/// Produce the client-facing token for a session id.
pub fn sign_session_token(secret: &[u8; SECRET_LEN], session_id: &Uuid) -> Result<String, ChitError> {
    let tag = session_mac(secret, session_id)?.finalize().into_bytes();
    Ok(format!("{}.{}", session_id, hex::encode(tag)))
}

/// Check a client token's MAC and return the embedded session id.
///
/// # Errors
/// `ChitError::Unauthorized` if the token is malformed or the MAC does not match.
pub fn verify_session_token(secret: &[u8; SECRET_LEN], token: &str) -> Result<Uuid, ChitError> {
    let (id_part, tag_part) = token
        .trim()
        .split_once('.')
        .ok_or_else(|| ChitError::Unauthorized("Malformed session token".to_string()))?;

    let session_id = Uuid::parse_str(id_part)
        .map_err(|_| ChitError::Unauthorized("Malformed session token".to_string()))?;
    let tag = hex::decode(tag_part)
        .map_err(|_| ChitError::Unauthorized("Malformed session token".to_string()))?;

    session_mac(secret, &session_id)?
        .verify_slice(&tag)
        .map_err(|_| ChitError::Unauthorized("Session token signature mismatch".to_string()))?;

    Ok(session_id)
}
