use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AuthError;

/// JWT session claims. Roles and status are resolved from the database on
/// every request, so the token carries identity only.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

pub fn issue_token(secret: &[u8], user_id: &Uuid, ttl_secs: i64) -> Result<String, AuthError> {
    let exp = (Utc::now() + Duration::seconds(ttl_secs)).timestamp() as usize;
    let claims = Claims { sub: user_id.to_string(), exp };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret))
        .map_err(|e| AuthError::Token(e.to_string()))
}

/// Decode and validate a bearer token, returning the subject id.
pub fn decode_token(secret: &[u8], token: &str) -> Result<Uuid, AuthError> {
    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret), &Validation::default())
        .map_err(|_| AuthError::InvalidToken)?;
    Uuid::parse_str(&data.claims.sub).map_err(|_| AuthError::InvalidToken)
}
