use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use crate::claims::{JwtClaims, TokenValidationError, validate_claims};

/// Bearer token verification seam used by the HTTP middleware.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError>;
}

/// Shared-secret HS256 tokens.
///
/// Expiry lives in our own `expires_at` claim (RFC 3339), so the library's
/// numeric `exp` handling is switched off and [`validate_claims`] decides.
pub struct Hs256JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256JwtValidator {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            key: DecodingKey::from_secret(secret.as_ref()),
            validation,
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError> {
        let data = decode::<JwtClaims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
            TokenValidationError::Malformed(e.to_string())
        })?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use sitecart_core::TenantId;

    use crate::{PrincipalId, Role};

    fn mint(secret: &str, expires_in: Duration) -> (String, JwtClaims) {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: PrincipalId::new(),
            tenant_id: TenantId::new(),
            roles: vec![Role::DRIVER],
            employee_id: Some("DRV-001".into()),
            employee_name: Some("Dan".into()),
            issued_at: now - Duration::seconds(1),
            expires_at: now + expires_in,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();
        (token, claims)
    }

    #[test]
    fn accepts_tokens_signed_with_the_shared_secret() {
        let (token, claims) = mint("s3cret", Duration::minutes(5));
        let validator = Hs256JwtValidator::new("s3cret");
        assert_eq!(validator.validate(&token, Utc::now()).unwrap(), claims);
    }

    #[test]
    fn rejects_wrong_secret_and_expired_tokens() {
        let (token, _) = mint("s3cret", Duration::minutes(5));
        let err = Hs256JwtValidator::new("other")
            .validate(&token, Utc::now())
            .unwrap_err();
        assert!(matches!(err, TokenValidationError::Malformed(_)));

        let err = Hs256JwtValidator::new("s3cret")
            .validate(&token, Utc::now() + Duration::minutes(10))
            .unwrap_err();
        assert_eq!(err, TokenValidationError::Expired);
    }
}
