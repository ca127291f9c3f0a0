use std::time::Duration;

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    error::AuthError,
    role::{Identity, Role},
};

/// Claims embedded in every bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

/// Issues and verifies HS256 bearer tokens valid for a fixed window.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn issue(&self, identity: &Identity) -> Result<IssuedToken, AuthError> {
        let issued_at = OffsetDateTime::now_utc();
        let expires_at = issued_at + self.ttl;
        let claims = Claims {
            sub: identity.id.clone(),
            role: identity.role,
            iat: issued_at.unix_timestamp(),
            exp: expires_at.unix_timestamp(),
        };
        Ok(IssuedToken {
            token: self.encode_claims(&claims)?,
            expires_at,
        })
    }

    /// Verify signature and expiry, returning the embedded identity.
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidCredential,
            }
        })?;
        Ok(Identity {
            id: data.claims.sub,
            role: data.claims.role,
        })
    }

    fn encode_claims(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|err| AuthError::Signing(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    fn member() -> Identity {
        Identity {
            id: "0192f0c4-member".to_string(),
            role: Role::Member,
        }
    }

    #[test]
    fn issued_token_round_trips_identity() {
        let codec = TokenCodec::new("secret", HOUR);
        let issued = codec.issue(&member()).unwrap();
        assert_eq!(codec.verify(&issued.token).unwrap(), member());
    }

    #[test]
    fn token_expires_after_the_window() {
        let codec = TokenCodec::new("secret", HOUR);
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let stale = codec
            .encode_claims(&Claims {
                sub: "u1".to_string(),
                role: Role::Librarian,
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap();
        assert_eq!(codec.verify(&stale), Err(AuthError::Expired));
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let ours = TokenCodec::new("secret", HOUR);
        let theirs = TokenCodec::new("other-secret", HOUR);
        let token = theirs.issue(&member()).unwrap().token;
        assert_eq!(ours.verify(&token), Err(AuthError::InvalidCredential));
        assert_eq!(ours.verify("not.a.jwt"), Err(AuthError::InvalidCredential));
    }

    #[test]
    fn expiry_is_one_window_after_issue() {
        let codec = TokenCodec::new("secret", HOUR);
        let before = OffsetDateTime::now_utc();
        let issued = codec.issue(&member()).unwrap();
        let window = issued.expires_at - before;
        assert!(window <= time::Duration::seconds(3601));
        assert!(window >= time::Duration::seconds(3599));
    }
}
