//! API Key model for authentication.
//!
//! Every staff user authenticates with their own API key. Keys are stored in
//! the database as SHA-256 hashes and shown to the user only once.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::user::Role;

/// Represents an API key record from the database.
///
/// # Database Table
///
/// Maps to the `api_keys` table with columns:
/// - `id`: Unique identifier (UUID)
/// - `user_id`: The user this key authenticates
/// - `key_hash`: SHA-256 hash of the actual API key
/// - `created_at`: When the key was created
/// - `is_active`: Whether the key is currently valid
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApiKey {
    pub id: Uuid,
    pub user_id: Uuid,

    /// SHA-256 hash of the actual API key (64 hex characters)
    pub key_hash: String,

    pub created_at: DateTime<Utc>,

    /// Inactive keys are rejected during authentication.
    pub is_active: bool,
}

/// An active key joined with the user that owns it.
///
/// This is what the auth middleware loads for every request.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApiKeyOwner {
    pub api_key_id: Uuid,
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub full_name: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
}

/// Response carrying a freshly generated key.
///
/// The plain key is never stored and cannot be retrieved again.
#[derive(Debug, Serialize)]
pub struct IssuedApiKeyResponse {
    pub api_key_id: Uuid,
    pub user_id: Uuid,
    pub api_key: String,
}

/// Generate a new random API key (32 bytes, hex encoded).
pub fn generate_api_key() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

/// SHA-256 hex digest of an API key, as stored in `api_keys.key_hash`.
pub fn hash_api_key(api_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    hex::encode(hasher.finalize())
}
