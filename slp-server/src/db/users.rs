//! User accounts

use serde::Serialize;
use slp_common::auth::{generate_salt, hash_password, verify_password};
use slp_common::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Public view of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: String,
    pub username: String,
}

/// Whether a username is already registered (case-insensitive)
pub async fn username_exists(db: &SqlitePool, username: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = ?)")
        .bind(username)
        .fetch_one(db)
        .await?;
    Ok(exists)
}

/// Create a user with a freshly salted password hash
///
/// `None` when the username is already registered (case-insensitive),
/// including when a concurrent signup claimed it first.
pub async fn create_user(db: &SqlitePool, username: &str, password: &str) -> Result<Option<User>> {
    let guid = Uuid::new_v4().to_string();
    let salt = generate_salt();
    let hash = hash_password(password, &salt);

    let inserted = sqlx::query(
        "INSERT INTO users (guid, username, password_hash, password_salt) VALUES (?, ?, ?, ?)",
    )
    .bind(&guid)
    .bind(username)
    .bind(&hash)
    .bind(&salt)
    .execute(db)
    .await;

    match inserted {
        Ok(_) => Ok(Some(User {
            id: guid,
            username: username.to_string(),
        })),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Look up a user and check the password
///
/// `None` for an unknown username or a wrong password alike.
pub async fn authenticate(db: &SqlitePool, username: &str, password: &str) -> Result<Option<User>> {
    let row: Option<(String, String, String, String)> = sqlx::query_as(
        "SELECT guid, username, password_hash, password_salt FROM users WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(db)
    .await?;

    Ok(row.and_then(|(guid, username, hash, salt)| {
        verify_password(password, &salt, &hash).then_some(User { id: guid, username })
    }))
}
