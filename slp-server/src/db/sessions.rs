//! Login sessions

use slp_common::auth::new_session_token;
use slp_common::time::{expires_after, from_db_string, now, to_db_string};
use slp_common::Result;
use sqlx::SqlitePool;
use tracing::debug;

use super::users::User;

/// Start a session for a user; returns the session token
pub async fn create_session(db: &SqlitePool, user_guid: &str, timeout_seconds: i64) -> Result<String> {
    let token = new_session_token();
    let created = now();

    sqlx::query("INSERT INTO sessions (token, user_guid, created_at, expires_at) VALUES (?, ?, ?, ?)")
        .bind(&token)
        .bind(user_guid)
        .bind(to_db_string(&created))
        .bind(to_db_string(&expires_after(created, timeout_seconds)))
        .execute(db)
        .await?;

    Ok(token)
}

/// User owning an unexpired session
///
/// An expired session is deleted on sight.
pub async fn session_user(db: &SqlitePool, token: &str) -> Result<Option<User>> {
    let row: Option<(String, String, String)> = sqlx::query_as(
        r#"
        SELECT u.guid, u.username, s.expires_at
        FROM sessions s
        JOIN users u ON u.guid = s.user_guid
        WHERE s.token = ?
        "#,
    )
    .bind(token)
    .fetch_optional(db)
    .await?;

    let Some((guid, username, expires_at)) = row else {
        return Ok(None);
    };

    if from_db_string(&expires_at)? <= now() {
        debug!("Session for '{}' expired", username);
        delete_session(db, token).await?;
        return Ok(None);
    }

    Ok(Some(User { id: guid, username }))
}

pub async fn delete_session(db: &SqlitePool, token: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(db)
        .await?;
    Ok(())
}
