use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::AppState;
use crate::models::users::{Role, User};
use crate::services::tokens::{Claims, TokenUse};
use crate::services::ServiceError;

/// Paths that must never wait on a bearer token: login and the OAuth
/// redirect/callback endpoints.
const OPEN_PATHS: &[&str] = &["/api/auth/login"];
const OPEN_PREFIXES: &[&str] = &["/oauth2/", "/login/oauth2/"];

/// Authenticated caller for the rest of the request. Lives in the request
/// extensions only, so it is dropped with the request on every exit path.
#[derive(Clone, Debug, PartialEq)]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
}

#[derive(Debug, PartialEq)]
pub enum Verdict {
    Authenticated(Identity),
    Anonymous,
    Rejected(&'static str),
}

/// Per-request authentication filter. Runs before every handler; on success
/// it attaches an [`Identity`] to the request, on failure it answers 401
/// itself. Token-processing errors never escape as 500s.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    if is_open_path(req.uri().path()) {
        return next.run(req).await;
    }

    // No bearer header: continue unauthenticated, protected handlers reject
    // later through the CurrentUser extractor.
    let token = match req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
    {
        Some(token) => token.to_string(),
        None => return next.run(req).await,
    };

    if !state.tokens.validate(&token) {
        return ServiceError::unauthorized("Invalid or expired token").into_response();
    }

    match resolve(&state, &token).await {
        Ok(Verdict::Authenticated(identity)) => {
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        // Disabled account: deliberately softer than rejection, the request
        // continues exactly like an unauthenticated one.
        Ok(Verdict::Anonymous) => next.run(req).await,
        Ok(Verdict::Rejected(message)) => ServiceError::unauthorized(message).into_response(),
        Err(e) => {
            log::debug!("Token processing failed: {}", e);
            ServiceError::unauthorized("Invalid or expired token").into_response()
        }
    }
}

async fn resolve(state: &AppState, token: &str) -> Result<Verdict, anyhow::Error> {
    let claims = state.tokens.decode(token)?;
    let user = state.users.get_user_by_id(&claims.sub).await?;

    Ok(verdict(&claims, user.as_ref()))
}

/// The accept/reject decision, separated from IO. Note the asymmetry: an
/// unknown user id is a hard 401 while a disabled account degrades to an
/// anonymous request.
pub fn verdict(claims: &Claims, user: Option<&User>) -> Verdict {
    if claims.typ != TokenUse::Access {
        return Verdict::Rejected("Invalid or expired token");
    }

    let Some(user) = user else {
        return Verdict::Rejected("Invalid token or user no longer exists");
    };

    if !user.enabled {
        return Verdict::Anonymous;
    }

    if claims.tv != user.token_version {
        return Verdict::Rejected("Token has been invalidated");
    }

    Verdict::Authenticated(Identity {
        user_id: user.id.clone(),
        role: claims.role.unwrap_or(user.role),
    })
}

pub fn is_open_path(path: &str) -> bool {
    OPEN_PATHS.contains(&path) || OPEN_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Extractor for handlers that require an authenticated caller.
pub struct CurrentUser(pub Identity);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| ServiceError::unauthorized("Authentication required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(enabled: bool, token_version: i32) -> User {
        let now = chrono::Utc::now().naive_utc();
        User {
            id: "user-1".to_string(),
            email: "user@example.com".to_string(),
            password_hash: "hash".to_string(),
            full_name: "Test User".to_string(),
            role: Role::User,
            enabled,
            token_version,
            totp_secret: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn claims(typ: TokenUse, tv: i32) -> Claims {
        Claims {
            sub: "user-1".to_string(),
            role: Some(Role::User),
            tv,
            typ,
            iat: 0,
            exp: i64::MAX,
        }
    }

    #[test]
    fn matching_version_authenticates() {
        let user = user(true, 2);

        assert_eq!(
            verdict(&claims(TokenUse::Access, 2), Some(&user)),
            Verdict::Authenticated(Identity {
                user_id: "user-1".to_string(),
                role: Role::User,
            })
        );
    }

    #[test]
    fn unknown_user_is_a_hard_rejection() {
        assert_eq!(
            verdict(&claims(TokenUse::Access, 0), None),
            Verdict::Rejected("Invalid token or user no longer exists")
        );
    }

    #[test]
    fn disabled_user_degrades_to_anonymous() {
        // Softer than the unknown-user case on purpose: a disabled account
        // must not produce distinguishing error detail.
        let user = user(false, 0);

        assert_eq!(verdict(&claims(TokenUse::Access, 0), Some(&user)), Verdict::Anonymous);
    }

    #[test]
    fn stale_token_version_is_rejected() {
        // The token was issued before a logout-all bumped the counter.
        let user = user(true, 3);

        assert_eq!(
            verdict(&claims(TokenUse::Access, 2), Some(&user)),
            Verdict::Rejected("Token has been invalidated")
        );
    }

    #[test]
    fn refresh_tokens_never_authenticate_requests() {
        let user = user(true, 0);

        assert_eq!(
            verdict(&claims(TokenUse::Refresh, 0), Some(&user)),
            Verdict::Rejected("Invalid or expired token")
        );
    }

    #[test]
    fn open_paths_bypass_the_gate() {
        assert!(is_open_path("/api/auth/login"));
        assert!(is_open_path("/oauth2/authorization/google"));
        assert!(is_open_path("/login/oauth2/code/google"));
        assert!(!is_open_path("/api/auth/logout-all"));
        assert!(!is_open_path("/api/wallets"));
    }
}
