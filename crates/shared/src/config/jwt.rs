use crate::{abstract_trait::JwtServiceTrait, errors::ServiceError, model::UserRole};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind as JwtErrorKind,
};
use serde::{Deserialize, Serialize};

pub const ACCESS_TOKEN: &str = "access";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub email: String,
    pub role: UserRole,
    pub exp: usize,
    pub iat: usize,
    pub token_type: String,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub jwt_secret: String,
}

impl JwtConfig {
    pub fn new(jwt_secret: &str) -> Self {
        JwtConfig {
            jwt_secret: jwt_secret.to_string(),
        }
    }
}

impl JwtServiceTrait for JwtConfig {
    fn generate_token(
        &self,
        user_id: i64,
        email: &str,
        role: UserRole,
        token_type: &str,
    ) -> Result<String, ServiceError> {
        let now = Utc::now();
        let iat = now.timestamp() as usize;
        let exp = match token_type {
            ACCESS_TOKEN => (now + Duration::minutes(60)).timestamp() as usize,
            _ => return Err(ServiceError::InvalidTokenType),
        };

        let claims = Claims {
            user_id,
            email: email.to_string(),
            role,
            exp,
            iat,
            token_type: token_type.to_string(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )
        .map_err(ServiceError::Jwt)
    }

    fn verify_token(&self, token: &str, expected_type: &str) -> Result<Claims, ServiceError> {
        let decoding_key = DecodingKey::from_secret(self.jwt_secret.as_ref());
        let token_data = decode::<Claims>(token, &decoding_key, &Validation::new(Algorithm::HS256))
            .map_err(|e| match e.kind() {
                JwtErrorKind::ExpiredSignature => ServiceError::TokenExpired,
                _ => ServiceError::Jwt(e),
            })?;

        if token_data.claims.token_type != expected_type {
            return Err(ServiceError::InvalidTokenType);
        }

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_token_carries_identity() {
        let jwt = JwtConfig::new("test-secret");
        let token = jwt
            .generate_token(42, "dist@example.com", UserRole::Distributor, ACCESS_TOKEN)
            .unwrap();

        let claims = jwt.verify_token(&token, ACCESS_TOKEN).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.email, "dist@example.com");
        assert_eq!(claims.role, UserRole::Distributor);
        assert_eq!(claims.exp - claims.iat, 60 * 60);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = JwtConfig::new("one")
            .generate_token(1, "a@b.c", UserRole::Customer, ACCESS_TOKEN)
            .unwrap();

        let result = JwtConfig::new("two").verify_token(&token, ACCESS_TOKEN);
        assert!(matches!(result, Err(ServiceError::Jwt(_))));
    }

    #[test]
    fn unknown_token_type_is_refused() {
        let result =
            JwtConfig::new("s").generate_token(1, "a@b.c", UserRole::Admin, "refresh");
        assert!(matches!(result, Err(ServiceError::InvalidTokenType)));
    }
}
