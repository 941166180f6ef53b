use anyhow::Context;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

/// User record in the database. The password hash never leaves the server.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone_number: i64,
    pub password_hash: String,
    pub roles: serde_json::Value,
    pub created_at: OffsetDateTime,
}

/// Identity document attached to a user, stored as raw bytes.
#[derive(Debug, Clone, FromRow)]
pub struct Document {
    pub id: i64,
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
    pub user_id: i64,
}

const USER_COLUMNS: &str = "id, name, email, phone_number, password_hash, roles, created_at";

impl User {
    pub async fn find_by_id(db: &PgPool, id: i64) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_phone(db: &PgPool, phone_number: i64) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE phone_number = $1"
        ))
        .bind(phone_number)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a user and its identity document atomically. Either both rows
    /// are committed or neither is.
    pub async fn create_with_document(
        db: &PgPool,
        name: &str,
        email: &str,
        phone_number: i64,
        password_hash: &str,
        document: NewDocument<'_>,
    ) -> anyhow::Result<User> {
        let mut tx = db.begin().await.context("begin tx")?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, phone_number, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(email)
        .bind(phone_number)
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await
        .context("insert user")?;

        sqlx::query(
            r#"
            INSERT INTO documents (name, mime_type, data, user_id)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(document.name)
        .bind(document.mime_type)
        .bind(document.data)
        .bind(user.id)
        .execute(&mut *tx)
        .await
        .context("insert document")?;

        tx.commit().await.context("commit tx")?;
        Ok(user)
    }
}

pub struct NewDocument<'a> {
    pub name: &'a str,
    pub mime_type: &'a str,
    pub data: &'a [u8],
}

impl Document {
    pub async fn find_by_user(db: &PgPool, user_id: i64) -> anyhow::Result<Option<Document>> {
        let doc = sqlx::query_as::<_, Document>(
            r#"
            SELECT id, name, mime_type, data, user_id
            FROM documents
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(doc)
    }
}
