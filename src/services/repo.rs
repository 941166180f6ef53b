use anyhow::Context;
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;

use crate::users::repo::User;

/// Service listing priced in Chronos units.
#[derive(Debug, Clone, FromRow)]
pub struct Service {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub time_chronos: i32,
    pub image: Vec<u8>,
    pub user_id: i64,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// A service joined with its owner and categories, ready for serialization.
#[derive(Debug)]
pub struct ServiceDetails {
    pub service: Service,
    pub owner: User,
    pub categories: Vec<Category>,
}

const SERVICE_COLUMNS: &str = "id, title, description, time_chronos, image, user_id, created_at";

impl Service {
    /// Insert a service, resolve its categories get-or-create, and link them,
    /// all in one transaction.
    pub async fn create(
        db: &PgPool,
        user_id: i64,
        title: &str,
        description: &str,
        time_chronos: i32,
        image: &[u8],
        category_names: &[String],
    ) -> anyhow::Result<(Service, Vec<Category>)> {
        let mut tx = db.begin().await.context("begin tx")?;

        let service = sqlx::query_as::<_, Service>(&format!(
            r#"
            INSERT INTO services (title, description, time_chronos, image, user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SERVICE_COLUMNS}
            "#
        ))
        .bind(title)
        .bind(description)
        .bind(time_chronos)
        .bind(image)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await
        .context("insert service")?;

        let mut categories = Vec::with_capacity(category_names.len());
        for name in category_names {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let category = Category::get_or_create_tx(&mut tx, name).await?;
            sqlx::query(
                r#"
                INSERT INTO service_categories (service_id, category_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(service.id)
            .bind(category.id)
            .execute(&mut *tx)
            .await
            .context("link category")?;
            categories.push(category);
        }

        tx.commit().await.context("commit tx")?;
        Ok((service, categories))
    }

    pub async fn find_by_id(db: &PgPool, id: i64) -> anyhow::Result<Option<ServiceDetails>> {
        let service = sqlx::query_as::<_, Service>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM services WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;

        match service {
            Some(service) => Ok(Some(Self::load_details(db, service).await?)),
            None => Ok(None),
        }
    }

    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<ServiceDetails>> {
        let services = sqlx::query_as::<_, Service>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM services ORDER BY id"
        ))
        .fetch_all(db)
        .await?;

        let mut out = Vec::with_capacity(services.len());
        for service in services {
            out.push(Self::load_details(db, service).await?);
        }
        Ok(out)
    }

    async fn load_details(db: &PgPool, service: Service) -> anyhow::Result<ServiceDetails> {
        let owner = User::find_by_id(db, service.user_id)
            .await?
            .context("service owner missing")?;
        let categories = Category::list_for_service(db, service.id).await?;
        Ok(ServiceDetails {
            service,
            owner,
            categories,
        })
    }
}

impl Category {
    /// Case-insensitive get-or-create. The unique index on `lower(name)`
    /// makes the insert race-safe: a concurrent insert of the same name hits
    /// the conflict clause and the follow-up select sees the winner's row.
    pub async fn get_or_create_tx(
        tx: &mut Transaction<'_, Postgres>,
        name: &str,
    ) -> anyhow::Result<Category> {
        let inserted = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name)
            VALUES ($1)
            ON CONFLICT ((lower(name))) DO NOTHING
            RETURNING id, name
            "#,
        )
        .bind(name)
        .fetch_optional(&mut **tx)
        .await
        .context("insert category")?;

        if let Some(category) = inserted {
            return Ok(category);
        }

        let existing = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name
            FROM categories
            WHERE lower(name) = lower($1)
            "#,
        )
        .bind(name)
        .fetch_one(&mut **tx)
        .await
        .context("fetch existing category")?;
        Ok(existing)
    }

    pub async fn list_for_service(db: &PgPool, service_id: i64) -> anyhow::Result<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>(
            r#"
            SELECT c.id, c.name
            FROM categories c
            JOIN service_categories sc ON sc.category_id = c.id
            WHERE sc.service_id = $1
            ORDER BY c.id
            "#,
        )
        .bind(service_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}
