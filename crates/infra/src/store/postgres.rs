//! Postgres-backed store implementation.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (other) | any other | `Backend` |
//! | RowNotFound | N/A | `NotFound` |
//! | Other | N/A | `Backend` |
//!
//! Monetary columns hold kopecks as `BIGINT`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;

use storefront_auth::Role;
use storefront_catalog::{
    CustomerLevel, Discount, Feedback, FeedbackAuthor, Image, Money, NewFeedback, Product,
    ProductSubtype, ProductType,
};
use storefront_core::{FeedbackId, ProductId, UserId};

use super::{
    CatalogStore, CredentialStore, FeedbackStore, ImageKind, NewUser, StoreError, StoreResult,
    UserRecord,
};

/// Tables used by the store. Idempotent.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS customer_levels (
    name VARCHAR(50) PRIMARY KEY,
    discount_amount_in_percent SMALLINT NOT NULL,
    lower_threshold BIGINT NOT NULL,
    level_number SMALLINT NOT NULL UNIQUE
);

INSERT INTO customer_levels (name, discount_amount_in_percent, lower_threshold, level_number)
VALUES ('Новичок', 1, 0, 1)
ON CONFLICT (name) DO NOTHING;

CREATE TABLE IF NOT EXISTS users (
    id BIGSERIAL PRIMARY KEY,
    first_name VARCHAR(30) NOT NULL DEFAULT 'Новый',
    last_name VARCHAR(50) NOT NULL DEFAULT 'Пользователь',
    phone_number VARCHAR(12) UNIQUE,
    email VARCHAR(50) UNIQUE,
    login VARCHAR(32) UNIQUE,
    hashed_password TEXT,
    role VARCHAR(15) NOT NULL DEFAULT 'user',
    total_amount_of_purchases BIGINT NOT NULL DEFAULT 0,
    date_of_registration TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    date_of_update TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS bonus_cards (
    id BIGSERIAL PRIMARY KEY,
    user_id BIGINT NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
    customer_level_name VARCHAR(50) NOT NULL REFERENCES customer_levels(name),
    date_of_registration TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    date_of_update TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS product_types (
    name VARCHAR(100) PRIMARY KEY,
    image_link TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS product_subtypes (
    name VARCHAR(100) PRIMARY KEY,
    image_link TEXT NOT NULL,
    type_name VARCHAR(100) NOT NULL REFERENCES product_types(name)
);

CREATE TABLE IF NOT EXISTS products (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    price BIGINT NOT NULL,
    description TEXT NOT NULL,
    image_link TEXT NOT NULL,
    quantity_in_stock INTEGER,
    product_subtype_name VARCHAR(100) NOT NULL REFERENCES product_subtypes(name),
    additional_information TEXT NOT NULL DEFAULT '',
    rating DOUBLE PRECISION NOT NULL DEFAULT 0,
    number_of_sales BIGINT
);

CREATE TABLE IF NOT EXISTS product_feedbacks (
    id BIGSERIAL PRIMARY KEY,
    author_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    product_id BIGINT NOT NULL REFERENCES products(id) ON DELETE CASCADE,
    liked_text TEXT NOT NULL,
    disliked_text TEXT NOT NULL,
    admin_comment TEXT,
    date_of_registration TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    date_of_update TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS main_info_images (name VARCHAR(50) PRIMARY KEY, image_link TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS promotion_images (name VARCHAR(50) PRIMARY KEY, image_link TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS service_images (name VARCHAR(50) PRIMARY KEY, image_link TEXT NOT NULL);
"#;

const USER_SELECT: &str = r#"
    SELECT
        u.id,
        u.login,
        u.hashed_password,
        u.role,
        u.first_name,
        u.last_name,
        u.phone_number,
        u.email,
        u.total_amount_of_purchases,
        l.name AS level_name,
        l.discount_amount_in_percent,
        l.lower_threshold,
        l.level_number
    FROM users u
    JOIN bonus_cards b ON b.user_id = u.id
    JOIN customer_levels l ON l.name = b.customer_level_name
"#;

const FEEDBACK_SELECT: &str = r#"
    SELECT
        f.id,
        f.product_id,
        f.author_id,
        f.liked_text,
        f.disliked_text,
        f.admin_comment,
        f.date_of_update,
        u.first_name,
        u.last_name
    FROM product_feedbacks f
    JOIN users u ON u.id = f.author_id
"#;

const PRODUCT_SELECT: &str = r#"
    SELECT
        p.id,
        p.name,
        p.price,
        p.description,
        p.image_link,
        p.quantity_in_stock,
        p.product_subtype_name,
        s.type_name,
        p.additional_information,
        p.rating,
        p.number_of_sales
    FROM products p
    JOIN product_subtypes s ON s.name = p.product_subtype_name
"#;

/// Postgres store sharing one connection pool; each call checks out its own
/// connection and returns it on every exit path.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect and make sure the schema exists.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        sqlx::raw_sql(SCHEMA)
            .execute(&pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(Self::new(pool))
    }

    async fn fetch_feedback(&self, id: FeedbackId) -> StoreResult<Feedback> {
        let row = sqlx::query(&format!("{FEEDBACK_SELECT} WHERE f.id = $1"))
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_feedback", e))?
            .ok_or(StoreError::NotFound)?;
        feedback_from_row(&row)
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {operation}: {}", db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::RowNotFound => StoreError::NotFound,
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}

fn decode_err(e: sqlx::Error) -> StoreError {
    StoreError::Backend(format!("failed to decode row: {e}"))
}

fn level_from_row(row: &PgRow, name_column: &str) -> StoreResult<CustomerLevel> {
    let pct: i16 = row.try_get("discount_amount_in_percent").map_err(decode_err)?;
    Ok(CustomerLevel {
        name: row.try_get(name_column).map_err(decode_err)?,
        discount: Discount::new(u8::try_from(pct.clamp(0, 100)).unwrap_or(0)),
        lower_threshold: Money::from_kopecks(row.try_get("lower_threshold").map_err(decode_err)?),
        level_number: row.try_get("level_number").map_err(decode_err)?,
    })
}

fn user_from_row(row: &PgRow) -> StoreResult<UserRecord> {
    let role: String = row.try_get("role").map_err(decode_err)?;
    let role = role
        .parse::<Role>()
        .map_err(|e| StoreError::Backend(format!("users.role: {e}")))?;
    Ok(UserRecord {
        id: UserId::new(row.try_get("id").map_err(decode_err)?),
        login: row
            .try_get::<Option<String>, _>("login")
            .map_err(decode_err)?
            .unwrap_or_default(),
        password_hash: row
            .try_get::<Option<String>, _>("hashed_password")
            .map_err(decode_err)?
            .unwrap_or_default(),
        role,
        first_name: row.try_get("first_name").map_err(decode_err)?,
        last_name: row.try_get("last_name").map_err(decode_err)?,
        phone_number: row.try_get("phone_number").map_err(decode_err)?,
        email: row.try_get("email").map_err(decode_err)?,
        total_purchases: Money::from_kopecks(
            row.try_get("total_amount_of_purchases").map_err(decode_err)?,
        ),
        level: level_from_row(row, "level_name")?,
    })
}

fn feedback_from_row(row: &PgRow) -> StoreResult<Feedback> {
    let updated_at: DateTime<Utc> = row.try_get("date_of_update").map_err(decode_err)?;
    Ok(Feedback {
        id: FeedbackId::new(row.try_get("id").map_err(decode_err)?),
        product_id: ProductId::new(row.try_get("product_id").map_err(decode_err)?),
        author_id: UserId::new(row.try_get("author_id").map_err(decode_err)?),
        author: FeedbackAuthor {
            first_name: row.try_get("first_name").map_err(decode_err)?,
            last_name: row.try_get("last_name").map_err(decode_err)?,
        },
        liked_text: row.try_get("liked_text").map_err(decode_err)?,
        disliked_text: row.try_get("disliked_text").map_err(decode_err)?,
        admin_comment: row.try_get("admin_comment").map_err(decode_err)?,
        updated_at,
    })
}

fn product_from_row(row: &PgRow) -> StoreResult<Product> {
    Ok(Product {
        id: ProductId::new(row.try_get("id").map_err(decode_err)?),
        name: row.try_get("name").map_err(decode_err)?,
        price: Money::from_kopecks(row.try_get("price").map_err(decode_err)?),
        description: row.try_get("description").map_err(decode_err)?,
        image_link: row.try_get("image_link").map_err(decode_err)?,
        quantity_in_stock: row.try_get("quantity_in_stock").map_err(decode_err)?,
        type_name: row.try_get("type_name").map_err(decode_err)?,
        subtype_name: row.try_get("product_subtype_name").map_err(decode_err)?,
        additional_information: row.try_get("additional_information").map_err(decode_err)?,
        rating: row.try_get("rating").map_err(decode_err)?,
        number_of_sales: row.try_get("number_of_sales").map_err(decode_err)?,
    })
}

#[async_trait]
impl CredentialStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn find_by_login(&self, login: &str) -> StoreResult<Option<UserRecord>> {
        let row = sqlx::query(&format!("{USER_SELECT} WHERE u.login = $1"))
            .bind(login)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_login", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<UserRecord>> {
        let row = sqlx::query(&format!("{USER_SELECT} WHERE u.id = $1"))
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_id", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self, new_user), fields(login = %new_user.login), err)]
    async fn create_user(&self, new_user: NewUser) -> StoreResult<UserRecord> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("create_user", e))?;

        let id: i64 = sqlx::query(
            r#"
            INSERT INTO users (login, hashed_password)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(&new_user.login)
        .bind(&new_user.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_user", e))?
        .try_get("id")
        .map_err(decode_err)?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO bonus_cards (user_id, customer_level_name)
            SELECT $1, name FROM customer_levels
            ORDER BY level_number ASC
            LIMIT 1
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_bonus_card", e))?;
        if inserted.rows_affected() == 0 {
            return Err(StoreError::Backend("no customer levels configured".into()));
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("create_user", e))?;

        self.find_by_id(UserId::new(id))
            .await?
            .ok_or(StoreError::NotFound)
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn update_personal_data(
        &self,
        id: UserId,
        first_name: &str,
        last_name: &str,
    ) -> StoreResult<UserRecord> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET first_name = $2, last_name = $3, date_of_update = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.get())
        .bind(first_name)
        .bind(last_name)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_personal_data", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        self.find_by_id(id).await?.ok_or(StoreError::NotFound)
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn delete_user(&self, id: UserId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn next_level(&self, current: &CustomerLevel) -> StoreResult<Option<CustomerLevel>> {
        let row = sqlx::query(
            r#"
            SELECT name, discount_amount_in_percent, lower_threshold, level_number
            FROM customer_levels
            WHERE level_number = $1
            "#,
        )
        .bind(current.level_number + 1)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("next_level", e))?;
        row.as_ref().map(|r| level_from_row(r, "name")).transpose()
    }
}

#[async_trait]
impl FeedbackStore for PostgresStore {
    #[instrument(skip(self, new_feedback), fields(product_id = %new_feedback.product_id), err)]
    async fn create_feedback(&self, new_feedback: NewFeedback) -> StoreResult<Feedback> {
        let id: i64 = sqlx::query(
            r#"
            INSERT INTO product_feedbacks (author_id, product_id, liked_text, disliked_text)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(new_feedback.author_id.get())
        .bind(new_feedback.product_id.get())
        .bind(&new_feedback.liked_text)
        .bind(&new_feedback.disliked_text)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_feedback", e))?
        .try_get("id")
        .map_err(decode_err)?;
        self.fetch_feedback(FeedbackId::new(id)).await
    }

    async fn list_for_product(&self, product_id: ProductId) -> StoreResult<Vec<Feedback>> {
        let rows = sqlx::query(&format!(
            "{FEEDBACK_SELECT} WHERE f.product_id = $1 ORDER BY f.id ASC"
        ))
        .bind(product_id.get())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_for_product", e))?;
        rows.iter().map(feedback_from_row).collect()
    }

    #[instrument(skip(self, comment), err)]
    async fn set_admin_comment(
        &self,
        product_id: ProductId,
        feedback_id: FeedbackId,
        comment: &str,
    ) -> StoreResult<Feedback> {
        let result = sqlx::query(
            r#"
            UPDATE product_feedbacks
            SET admin_comment = $3, date_of_update = NOW()
            WHERE id = $1 AND product_id = $2
            "#,
        )
        .bind(feedback_id.get())
        .bind(product_id.get())
        .bind(comment)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_admin_comment", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        self.fetch_feedback(feedback_id).await
    }

    #[instrument(skip(self), err)]
    async fn delete_feedback(&self, product_id: ProductId, feedback_id: FeedbackId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM product_feedbacks WHERE id = $1 AND product_id = $2")
            .bind(feedback_id.get())
            .bind(product_id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_feedback", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for PostgresStore {
    async fn product_types(&self) -> StoreResult<Vec<ProductType>> {
        let rows = sqlx::query(
            r#"
            SELECT
                t.name AS type_name,
                t.image_link AS type_image_link,
                s.name AS subtype_name,
                s.image_link AS subtype_image_link
            FROM product_types t
            LEFT JOIN product_subtypes s ON s.type_name = t.name
            ORDER BY t.name ASC, s.name ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("product_types", e))?;

        let mut types: Vec<ProductType> = Vec::new();
        for row in &rows {
            let type_name: String = row.try_get("type_name").map_err(decode_err)?;
            if types.last().map(|t| t.name != type_name).unwrap_or(true) {
                types.push(ProductType {
                    name: type_name,
                    image_link: row.try_get("type_image_link").map_err(decode_err)?,
                    subtypes: Vec::new(),
                });
            }
            let subtype_name: Option<String> = row.try_get("subtype_name").map_err(decode_err)?;
            if let (Some(name), Some(current)) = (subtype_name, types.last_mut()) {
                current.subtypes.push(ProductSubtype {
                    name,
                    image_link: row
                        .try_get::<Option<String>, _>("subtype_image_link")
                        .map_err(decode_err)?
                        .unwrap_or_default(),
                });
            }
        }
        Ok(types)
    }

    async fn products_in_subtype(
        &self,
        type_name: &str,
        subtype_name: &str,
    ) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "{PRODUCT_SELECT} WHERE s.type_name = $1 AND s.name = $2 ORDER BY p.id ASC"
        ))
        .bind(type_name)
        .bind(subtype_name)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("products_in_subtype", e))?;
        rows.iter().map(product_from_row).collect()
    }

    async fn product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        let row = sqlx::query(&format!("{PRODUCT_SELECT} WHERE p.id = $1"))
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("product", e))?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn top_sellers(&self, limit: usize) -> StoreResult<Vec<Product>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(&format!(
            "{PRODUCT_SELECT} ORDER BY p.number_of_sales DESC NULLS LAST LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("top_sellers", e))?;
        rows.iter().map(product_from_row).collect()
    }

    async fn images(&self, kind: ImageKind) -> StoreResult<Vec<Image>> {
        let table = match kind {
            ImageKind::MainInfo => "main_info_images",
            ImageKind::Promotion => "promotion_images",
            ImageKind::Service => "service_images",
        };
        let rows = sqlx::query(&format!("SELECT name, image_link FROM {table} ORDER BY name ASC"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("images", e))?;
        rows.iter()
            .map(|row| {
                Ok(Image {
                    name: row.try_get("name").map_err(decode_err)?,
                    image_link: row.try_get("image_link").map_err(decode_err)?,
                })
            })
            .collect()
    }
}
