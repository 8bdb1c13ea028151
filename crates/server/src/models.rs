//! Domain records and the on-disk snapshot shape.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A short text post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chirp {
    pub id: u64,
    pub body: String,
    pub author_id: u64,
}

/// Identity record as stored in the snapshot file.
///
/// `pss_hash` is the bcrypt digest; it is persisted but must never appear in
/// an API response, which is why handlers answer with [`UserResponse`] /
/// [`LoginResponse`] instead. An empty `refresh_token` means no active
/// session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub pss_hash: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub is_chirpy_red: bool,
}

/// The whole datastore: two id-keyed collections, loaded and rewritten in
/// full on every mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbSnapshot {
    pub chirps: HashMap<u64, Chirp>,
    pub users: HashMap<u64, User>,
}

/// Listing order for chirps. Ascending is id order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    /// Parses the `sort` query parameter. Unknown values are rejected.
    pub fn from_param(raw: &str) -> Option<Self> {
        match raw {
            "asc" => Some(Self::Ascending),
            "desc" => Some(Self::Descending),
            _ => None,
        }
    }
}

/// Public view of a user.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: u64,
    pub email: String,
    pub is_chirpy_red: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            is_chirpy_red: user.is_chirpy_red,
        }
    }
}

/// Login answer: public user fields plus both credentials.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub id: u64,
    pub email: String,
    pub is_chirpy_red: bool,
    pub token: String,
    pub refresh_token: String,
}

/// Answer to a refresh request.
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub token: String,
}
