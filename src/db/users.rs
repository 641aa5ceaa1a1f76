use chrono::NaiveDateTime;
use sqlx::{Row, SqlitePool};

use crate::error::AppError;
use crate::session::{Stats, User};

/// A user as persisted. The live `session::User` is derived from this at
/// login time, together with connection-supplied fields like timezone.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub banned: bool,
    pub country_code: i64,
    pub created_at: NaiveDateTime,
}

impl UserRow {
    pub fn to_session_user(&self, timezone: i8) -> User {
        User {
            id: self.id as i32,
            username: self.username.clone(),
            banned: self.banned,
            country_code: self.country_code as u8,
            timezone,
            longitude: 0.0,
            latitude: 0.0,
        }
    }
}

fn row_to_user(row: sqlx::sqlite::SqliteRow) -> UserRow {
    UserRow {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        banned: row.get("banned"),
        country_code: row.get("country_code"),
        created_at: row.get("created_at"),
    }
}

const SELECT_USERS: &str =
    "SELECT id, username, password_hash, banned, country_code, created_at FROM users";

/// Lookup by display name. `None` is an ordinary outcome here; the caller
/// decides whether a miss is an error.
pub async fn get_by_name(pool: &SqlitePool, username: &str) -> Result<Option<UserRow>, AppError> {
    let row = sqlx::query(&format!("{SELECT_USERS} WHERE username = ?"))
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(row_to_user))
}

pub async fn get_by_id(pool: &SqlitePool, user_id: i64) -> Result<Option<UserRow>, AppError> {
    let row = sqlx::query(&format!("{SELECT_USERS} WHERE id = ?"))
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(row_to_user))
}

pub async fn create(
    pool: &SqlitePool,
    username: &str,
    password_hash: &str,
    country_code: i64,
) -> Result<i64, AppError> {
    let result = sqlx::query(
        "INSERT INTO users (username, password_hash, country_code) VALUES (?, ?, ?)",
    )
    .bind(username)
    .bind(password_hash)
    .bind(country_code)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn set_banned(pool: &SqlitePool, user_id: i64, banned: bool) -> Result<(), AppError> {
    sqlx::query("UPDATE users SET banned = ? WHERE id = ?")
        .bind(banned)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Per-mode gameplay statistics, if the user has any recorded.
pub async fn stats_for(
    pool: &SqlitePool,
    user_id: i64,
    mode: u8,
) -> Result<Option<Stats>, AppError> {
    let row = sqlx::query(
        "SELECT ranked_score, total_score, accuracy, playcount, rank, performance \
         FROM user_stats WHERE user_id = ? AND mode = ?",
    )
    .bind(user_id)
    .bind(i64::from(mode))
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| Stats {
        ranked_score: r.get("ranked_score"),
        total_score: r.get("total_score"),
        accuracy: r.get::<f64, _>("accuracy") as f32,
        playcount: r.get::<i64, _>("playcount") as i32,
        rank: r.get::<i64, _>("rank") as i32,
        performance: r.get::<i64, _>("performance") as i16,
    }))
}
