//! JWT authentication middleware

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::{fs, sync::Arc};

use super::token::{extract_token, Claims, TokenValidator};
use crate::handlers::{ProblemDetails, RequestContext};
use crate::{config::JwtConfig, error::Error};

/// JWT authentication middleware state
#[derive(Clone)]
pub struct JwtAuth {
    decoding_key: Arc<DecodingKey>,
    validation: Validation,
}

impl JwtAuth {
    /// Create a new JWT authenticator from configuration
    ///
    /// HMAC algorithms take the `signing_key` (or the raw contents of
    /// `public_key_path`); RSA and EC algorithms read a PEM public key.
    pub fn new(config: &JwtConfig) -> Result<Self, Error> {
        let algorithm = match config.algorithm.to_uppercase().as_str() {
            "RS256" => Algorithm::RS256,
            "RS384" => Algorithm::RS384,
            "RS512" => Algorithm::RS512,
            "ES256" => Algorithm::ES256,
            "ES384" => Algorithm::ES384,
            "HS256" => Algorithm::HS256,
            "HS384" => Algorithm::HS384,
            "HS512" => Algorithm::HS512,
            alg => return Err(config_error(format!("Unsupported JWT algorithm: {}", alg))),
        };

        let decoding_key = match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => match &config.signing_key {
                Some(secret) => DecodingKey::from_secret(secret.as_bytes()),
                None => DecodingKey::from_secret(&read_key_file(config)?),
            },
            Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512 => {
                DecodingKey::from_rsa_pem(&read_key_file(config)?)?
            }
            _ => DecodingKey::from_ec_pem(&read_key_file(config)?)?,
        };

        let mut validation = Validation::new(algorithm);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        if let Some(audience) = &config.audience {
            validation.set_audience(&[audience]);
        }

        Ok(Self {
            decoding_key: Arc::new(decoding_key),
            validation,
        })
    }

    /// Middleware function to validate a bearer token and inject claims
    ///
    /// Requests without an Authorization header pass through untouched;
    /// route extractors decide whether they need an identity. A present but
    /// invalid token is rejected with 401.
    pub async fn middleware(
        State(auth): State<Self>,
        mut request: Request<Body>,
        next: Next,
    ) -> Response {
        let claims = extract_token(request.headers())
            .and_then(|token| token.map(|t| auth.validate_token(&t)).transpose());

        match claims {
            Ok(Some(claims)) => {
                tracing::debug!(sub = %claims.sub, tier = %claims.tier(), "bearer token accepted");
                request.extensions_mut().insert(claims);
            }
            Ok(None) => {}
            Err(e) => {
                let ctx = RequestContext::from_request_head(request.headers(), request.uri());
                return ProblemDetails::from_error(&e, &ctx).into_response();
            }
        }

        next.run(request).await
    }
}

impl TokenValidator for JwtAuth {
    fn validate_token(&self, token: &str) -> Result<Claims, Error> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }
}

fn read_key_file(config: &JwtConfig) -> Result<Vec<u8>, Error> {
    let path = config
        .public_key_path
        .as_ref()
        .ok_or_else(|| config_error(format!(
            "JWT algorithm {} needs a key: set jwt.signing_key or jwt.public_key_path",
            config.algorithm
        )))?;

    fs::read(path).map_err(|e| {
        config_error(format!(
            "Failed to read JWT key from path '{}': {}",
            path.display(),
            e
        ))
    })
}

fn config_error(message: String) -> Error {
    Error::Config(Box::new(figment::Error::from(message)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::io::Write;

    fn hs256(secret: Option<&str>) -> JwtConfig {
        JwtConfig {
            signing_key: secret.map(String::from),
            public_key_path: None,
            algorithm: "HS256".to_string(),
            issuer: None,
            audience: None,
        }
    }

    fn token(secret: &str, claims: &Claims) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims(exp_offset: i64) -> Claims {
        Claims {
            sub: "player1".into(),
            roles: vec!["Moderator".into()],
            exp: chrono::Utc::now().timestamp() + exp_offset,
            iat: None,
            iss: None,
            aud: None,
        }
    }

    #[test]
    fn test_validates_hs256_token() {
        let auth = JwtAuth::new(&hs256(Some("test-secret"))).unwrap();
        let decoded = auth
            .validate_token(&token("test-secret", &claims(3600)))
            .unwrap();
        assert_eq!(decoded.sub, "player1");
        assert_eq!(decoded.roles, vec!["Moderator"]);
    }

    #[test]
    fn test_rejects_wrong_secret_and_expired_tokens() {
        let auth = JwtAuth::new(&hs256(Some("test-secret"))).unwrap();
        assert!(matches!(
            auth.validate_token(&token("other-secret", &claims(3600))),
            Err(Error::Jwt(_))
        ));
        assert!(auth
            .validate_token(&token("test-secret", &claims(-3600)))
            .is_err());
    }

    #[test]
    fn test_issuer_is_enforced_when_configured() {
        let mut config = hs256(Some("test-secret"));
        config.issuer = Some("bglist".into());
        let auth = JwtAuth::new(&config).unwrap();

        assert!(auth.validate_token(&token("test-secret", &claims(3600))).is_err());

        let mut issued = claims(3600);
        issued.iss = Some("bglist".into());
        assert!(auth.validate_token(&token("test-secret", &issued)).is_ok());
    }

    #[test]
    fn test_secret_can_come_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"file-secret").unwrap();

        let mut config = hs256(None);
        config.public_key_path = Some(file.path().to_path_buf());
        let auth = JwtAuth::new(&config).unwrap();
        assert!(auth.validate_token(&token("file-secret", &claims(3600))).is_ok());
    }

    #[test]
    fn test_missing_key_and_unknown_algorithm_are_config_errors() {
        assert!(matches!(JwtAuth::new(&hs256(None)), Err(Error::Config(_))));

        let mut config = hs256(Some("s"));
        config.algorithm = "none".into();
        assert!(matches!(JwtAuth::new(&config), Err(Error::Config(_))));
    }
}
