use std::time::{SystemTime, UNIX_EPOCH};

use axum::{Json, http::{HeaderMap, StatusCode}, response::Response};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::{doc, oid::ObjectId, DateTime, Document};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::AppError;

pub type ApiResult<T = Response> = Result<T, AppError>;

pub fn error_response(status: StatusCode, code: &str, message: &str) -> (StatusCode, Json<Document>){
    (status, Json(doc! { "message": message, "code": code }))
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub exp: usize,
}

pub fn now_datetime() -> DateTime{
    DateTime::now()
}

pub fn sign_token(secret: &str, user_id: &str, email: &str, role: &str, ttl_hours: u64) -> Result<String, jsonwebtoken::errors::Error>{
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role: role.to_string(),
        exp: now + (ttl_hours as usize * 60 * 60),
    };
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes()))
}

pub fn decode_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error>{
    let validation = Validation::new(Algorithm::HS256);
    jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
}

pub fn bearer_token(headers: &HeaderMap) -> Option<String>{
    let header = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.split_once(' ')?;
    scheme.eq_ignore_ascii_case("bearer").then(|| token.trim().to_string())
}

/// Admin access: an `admin` role claim, or an email listed in `ADMIN_EMAILS`.
pub fn require_admin(headers: &HeaderMap, config: &Config) -> Result<Claims, AppError>{
    let token = bearer_token(headers).ok_or(AppError::Unauthorized)?;
    let claims = decode_token(&config.jwt_secret, &token).map_err(|_| AppError::Unauthorized)?;
    if claims.role.eq_ignore_ascii_case("admin") || config.is_admin_email(&claims.email) {
        Ok(claims)
    } else {
        Err(AppError::Forbidden)
    }
}

pub fn parse_object_id(raw: &str, field: &str) -> Result<ObjectId, AppError>{
    ObjectId::parse_str(raw.trim()).map_err(|_| AppError::validation(format!("{field} is not a valid id")))
}

/// Reference fields sent by the admin forms: absent leaves the field alone,
/// an empty string clears it, anything else must be an id.
pub fn parse_reference(raw: Option<&str>, field: &str) -> Result<Option<Option<ObjectId>>, AppError>{
    match raw.map(str::trim) {
        None => Ok(None),
        Some("") => Ok(Some(None)),
        Some(id) => parse_object_id(id, field).map(|oid| Some(Some(oid))),
    }
}
