use std::sync::Arc;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::models::users::Role;
use crate::settings;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenUse {
    Access,
    Refresh,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Claims {
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub tv: i32,
    pub typ: TokenUse,
    pub iat: i64,
    pub exp: i64,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

/// Issues and checks the signed bearer tokens the authentication gate
/// consumes. The signing key is process-wide configuration, loaded once.
#[derive(Clone)]
pub struct TokenService {
    keys: Arc<Keys>,
}

impl TokenService {
    pub fn new(jwt: &settings::Jwt) -> Self {
        TokenService {
            keys: Arc::new(Keys {
                encoding: EncodingKey::from_secret(jwt.secret.as_bytes()),
                decoding: DecodingKey::from_secret(jwt.secret.as_bytes()),
                access_ttl_secs: jwt.access_ttl_secs,
                refresh_ttl_secs: jwt.refresh_ttl_secs,
            }),
        }
    }

    pub fn access_ttl_secs(&self) -> i64 {
        self.keys.access_ttl_secs
    }

    pub fn issue_access_token(
        &self,
        user_id: &str,
        role: Role,
        token_version: i32,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue(user_id, Some(role), token_version, TokenUse::Access)
    }

    pub fn issue_refresh_token(
        &self,
        user_id: &str,
        token_version: i32,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue(user_id, None, token_version, TokenUse::Refresh)
    }

    fn issue(
        &self,
        user_id: &str,
        role: Option<Role>,
        token_version: i32,
        typ: TokenUse,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let ttl = match typ {
            TokenUse::Access => self.keys.access_ttl_secs,
            TokenUse::Refresh => self.keys.refresh_ttl_secs,
        };
        let iat = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            tv: token_version,
            typ,
            iat,
            exp: iat + ttl,
        };

        encode(&Header::default(), &claims, &self.keys.encoding)
    }

    /// Signature and expiry check. Returns false for any malformed, tampered
    /// or expired token, it never errors.
    pub fn validate(&self, token: &str) -> bool {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(token, &self.keys.decoding, &validation).is_ok()
    }

    /// Decodes claims without re-verifying signature or expiry. Callers must
    /// run `validate` first.
    pub fn decode(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;

        decode::<Claims>(token, &self.keys.decoding, &validation).map(|data| data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(access_ttl_secs: i64) -> TokenService {
        TokenService::new(&settings::Jwt {
            secret: "unit-test-secret".to_string(),
            access_ttl_secs,
            refresh_ttl_secs: 86400,
        })
    }

    #[test]
    fn issued_access_token_validates_and_carries_claims() {
        let tokens = service(900);
        let token = tokens
            .issue_access_token("user-1", Role::User, 3)
            .unwrap();

        assert!(tokens.validate(&token));

        let claims = tokens.decode(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.role, Some(Role::User));
        assert_eq!(claims.tv, 3);
        assert_eq!(claims.typ, TokenUse::Access);
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn refresh_token_has_no_role_claim() {
        let tokens = service(900);
        let token = tokens.issue_refresh_token("user-1", 0).unwrap();

        let claims = tokens.decode(&token).unwrap();
        assert_eq!(claims.role, None);
        assert_eq!(claims.typ, TokenUse::Refresh);
    }

    #[test]
    fn expired_token_fails_validation_but_still_decodes() {
        let tokens = service(-60);
        let token = tokens.issue_access_token("user-1", Role::User, 0).unwrap();

        assert!(!tokens.validate(&token));
        assert_eq!(tokens.decode(&token).unwrap().sub, "user-1");
    }

    #[test]
    fn tampered_token_fails_validation() {
        let tokens = service(900);
        let token = tokens.issue_access_token("user-1", Role::User, 0).unwrap();
        let mut tampered = token.clone();
        tampered.pop();

        assert!(!tokens.validate(&tampered));
    }

    #[test]
    fn token_signed_with_other_key_fails_validation() {
        let tokens = service(900);
        let other = TokenService::new(&settings::Jwt {
            secret: "some-other-secret".to_string(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 86400,
        });
        let token = other.issue_access_token("user-1", Role::User, 0).unwrap();

        assert!(!tokens.validate(&token));
    }

    #[test]
    fn garbage_is_not_a_token() {
        let tokens = service(900);

        assert!(!tokens.validate("not-a-jwt"));
        assert!(tokens.decode("not-a-jwt").is_err());
    }
}
