use sqlx::SqliteConnection;

use crate::{db_types::User, traits::OrderDbError};

/// Inserts or refreshes a user record. The account service is the owner of user records; this exists so that the
/// gateway can be seeded with owner details (tests, data imports).
pub async fn upsert_user(user: &User, conn: &mut SqliteConnection) -> Result<(), OrderDbError> {
    sqlx::query(
        r#"
            INSERT INTO users (id, name, email, role) VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET name = excluded.name, email = excluded.email, role = excluded.role;
        "#,
    )
    .bind(&user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.role)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn fetch_user(user_id: &str, conn: &mut SqliteConnection) -> Result<Option<User>, OrderDbError> {
    let user = sqlx::query_as("SELECT id, name, email, role FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(user)
}
