use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,                     // unique user ID
    pub name: String,                 // display name
    pub email: String,                // normalized email
    #[serde(skip_serializing)]
    pub password_hash: String,        // Argon2 PHC string, never rendered
    pub created_at: OffsetDateTime,   // creation timestamp
}

/// Server-side session row. Only the SHA-256 of the cookie token is stored.
#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub token_hash: Vec<u8>,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}
