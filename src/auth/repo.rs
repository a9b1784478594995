use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};

use crate::auth::dto::UpdateProfileRequest;

/// Guest record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Guest {
    pub guest_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: Option<Date>,
    pub gender: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

const GUEST_COLUMNS: &str = "guest_id, first_name, last_name, email, phone, \
                             birth_date, gender, password_hash, created_at";

impl Guest {
    /// Find a guest by email. Email uniqueness is an identity-layer policy,
    /// not a database constraint, so this takes the oldest row on a tie.
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<Guest>, sqlx::Error> {
        sqlx::query_as::<_, Guest>(&format!(
            "SELECT {GUEST_COLUMNS} FROM guests WHERE email = $1 ORDER BY guest_id LIMIT 1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, guest_id: i32) -> Result<Option<Guest>, sqlx::Error> {
        sqlx::query_as::<_, Guest>(&format!(
            "SELECT {GUEST_COLUMNS} FROM guests WHERE guest_id = $1"
        ))
        .bind(guest_id)
        .fetch_optional(db)
        .await
    }

    pub async fn create(
        db: &PgPool,
        email: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
        phone: &str,
    ) -> Result<Guest, sqlx::Error> {
        sqlx::query_as::<_, Guest>(&format!(
            "INSERT INTO guests (email, password_hash, first_name, last_name, phone) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {GUEST_COLUMNS}"
        ))
        .bind(email)
        .bind(password_hash)
        .bind(first_name)
        .bind(last_name)
        .bind(phone)
        .fetch_one(db)
        .await
    }

    /// Apply a partial profile update. Email and password are never touched
    /// here; login never mutates contact info either.
    pub async fn update_profile(
        db: &PgPool,
        guest_id: i32,
        update: &UpdateProfileRequest,
    ) -> Result<Option<Guest>, sqlx::Error> {
        sqlx::query_as::<_, Guest>(&format!(
            "UPDATE guests SET \
                 first_name = COALESCE($2, first_name), \
                 last_name  = COALESCE($3, last_name), \
                 phone      = COALESCE($4, phone), \
                 birth_date = COALESCE($5, birth_date), \
                 gender     = COALESCE($6, gender) \
             WHERE guest_id = $1 \
             RETURNING {GUEST_COLUMNS}"
        ))
        .bind(guest_id)
        .bind(update.first_name.as_deref())
        .bind(update.last_name.as_deref())
        .bind(update.phone.as_deref())
        .bind(update.birth_date)
        .bind(update.gender.as_deref())
        .fetch_optional(db)
        .await
    }
}
