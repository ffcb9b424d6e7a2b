/*
 * Responsibility
 * - User 系の request/response DTO
 * - validation (形式チェック) 用の validate() を持たせる
 */
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub id: String,
    pub pw: String,
    pub email: String,
    pub nickname: String,
    pub phone: Option<String>,
}

impl SignUpRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.id.trim().is_empty() {
            return Err("id is required");
        }
        if self.pw.len() < 8 {
            return Err("pw must be at least 8 chars");
        }
        if self.email.trim().is_empty() || !self.email.contains('@') {
            return Err("email must be a valid address");
        }
        if self.nickname.trim().is_empty() {
            return Err("nickname is required");
        }
        if let Some(phone) = &self.phone
            && phone.len() > 32
        {
            return Err("phone must be <= 32 chars");
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub pw: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.username.trim().is_empty() {
            return Err("username is required");
        }
        if self.pw.is_empty() {
            return Err("pw is required");
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub uid: i64,
    pub username: String,
    pub email: String,
    pub nickname: String,
    pub role: String,
    pub phone: Option<String>,
}
