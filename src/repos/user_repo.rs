/*
 * Responsibility
 * - users テーブル向け SQLx 操作
 * - PgPool を受け取り、登録・検索・refresh token 保存を提供
 * - DB エラーは RepoError に変換しやすい形で返す
 *
 * Schema:
 *   uid BIGSERIAL PRIMARY KEY, username TEXT UNIQUE, user_pw TEXT,
 *   email TEXT UNIQUE, nickname TEXT UNIQUE, role TEXT, phone TEXT,
 *   token TEXT  -- last issued refresh token, opaque to the repo
 */
use sqlx::{FromRow, PgPool};

use crate::repos::error::RepoError;

/// Role stored on a user row. Surfaced to the token layer as a
/// `ROLE_`-prefixed authority string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

#[derive(Debug, FromRow)]
pub struct UserRow {
    pub uid: i64,
    pub username: String,
    pub user_pw: String,
    pub email: String,
    pub nickname: String,
    pub role: String,
    pub phone: Option<String>,
    pub token: Option<String>,
}

impl UserRow {
    /// Authority string attached to tokens issued for this user.
    pub fn authority(&self) -> String {
        format!("ROLE_{}", self.role)
    }
}

pub async fn find_by_username(db: &PgPool, username: &str) -> Result<Option<UserRow>, RepoError> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT uid, username, user_pw, email, nickname, role, phone, token
        FROM users
        WHERE username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

pub async fn exists_by_username(db: &PgPool, username: &str) -> Result<bool, RepoError> {
    let exists = sqlx::query_scalar::<_, bool>(
        r#"SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)"#,
    )
    .bind(username)
    .fetch_one(db)
    .await?;

    Ok(exists)
}

pub async fn exists_by_email(db: &PgPool, email: &str) -> Result<bool, RepoError> {
    let exists =
        sqlx::query_scalar::<_, bool>(r#"SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)"#)
            .bind(email)
            .fetch_one(db)
            .await?;

    Ok(exists)
}

pub async fn exists_by_nickname(db: &PgPool, nickname: &str) -> Result<bool, RepoError> {
    let exists = sqlx::query_scalar::<_, bool>(
        r#"SELECT EXISTS (SELECT 1 FROM users WHERE nickname = $1)"#,
    )
    .bind(nickname)
    .fetch_one(db)
    .await?;

    Ok(exists)
}

pub async fn create(
    db: &PgPool,
    username: &str,
    password_hash: &str,
    email: &str,
    nickname: &str,
    role: Role,
    phone: Option<&str>,
) -> Result<UserRow, RepoError> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (username, user_pw, email, nickname, role, phone)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING uid, username, user_pw, email, nickname, role, phone, token
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .bind(email)
    .bind(nickname)
    .bind(role.as_str())
    .bind(phone)
    .fetch_one(db)
    .await
    .map_err(RepoError::from_sqlx)?;

    Ok(row)
}

/// Persist the most recently issued refresh token against the user row.
///
/// The token string is opaque here; nothing in this repo ever decodes it.
pub async fn save_refresh_token(db: &PgPool, uid: i64, token: &str) -> Result<(), RepoError> {
    sqlx::query(
        r#"
        UPDATE users
        SET token = $2
        WHERE uid = $1
        "#,
    )
    .bind(uid)
    .bind(token)
    .execute(db)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_the_row_text() {
        assert_eq!(Role::User.as_str(), "USER");
        assert_eq!(Role::Admin.as_str(), "ADMIN");
    }

    #[test]
    fn authority_is_the_role_prefixed() {
        let row = UserRow {
            uid: 1,
            username: "alice".to_string(),
            user_pw: "hash".to_string(),
            email: "alice@example.com".to_string(),
            nickname: "al".to_string(),
            role: Role::User.as_str().to_string(),
            phone: None,
            token: None,
        };
        assert_eq!(row.authority(), "ROLE_USER");
    }
}
