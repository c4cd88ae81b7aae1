use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use sqlx::PgPool;

use super::email::Mailer;
use super::tokens::{TokenService, TokenUse};
use super::totp::TotpService;
use super::ServiceError;
use crate::models::categories::CategoryKind;
use crate::models::users::{AuthTokens, LoginRequest, RegisterRequest, TotpSetup, User};
use crate::models::wallets::WalletKind;
use crate::repositories::achievements::AchievementRepository;
use crate::repositories::categories::CategoryRepository;
use crate::repositories::users::UserRepository;
use crate::repositories::wallets::WalletRepository;
use crate::settings::Settings;

/// One message for unknown email and wrong password, so login responses
/// cannot be used to enumerate accounts.
const INVALID_CREDENTIALS: &str = "Invalid email or password";
const INVALID_TOTP: &str = "Invalid two-factor code";

const DEFAULT_WALLET_NAME: &str = "Cash";
const DEFAULT_CATEGORIES: &[(&str, CategoryKind)] = &[
    ("Salary", CategoryKind::Income),
    ("Other Income", CategoryKind::Income),
    ("Food & Drink", CategoryKind::Expense),
    ("Transport", CategoryKind::Expense),
    ("Shopping", CategoryKind::Expense),
    ("Bills", CategoryKind::Expense),
    ("Entertainment", CategoryKind::Expense),
];

#[derive(Clone)]
pub struct AccountService {
    users: UserRepository,
    wallets: WalletRepository,
    categories: CategoryRepository,
    achievements: AchievementRepository,
    tokens: TokenService,
    totp: TotpService,
    mailer: Mailer,
    default_currency: String,
}

impl AccountService {
    pub fn new(
        sql_conn: PgPool,
        tokens: TokenService,
        totp: TotpService,
        mailer: Mailer,
        settings: &Settings,
    ) -> Self {
        AccountService {
            users: UserRepository::new(sql_conn.clone()),
            wallets: WalletRepository::new(sql_conn.clone()),
            categories: CategoryRepository::new(sql_conn.clone()),
            achievements: AchievementRepository::new(sql_conn),
            tokens,
            totp,
            mailer,
            default_currency: settings.defaults.currency.clone(),
        }
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<AuthTokens, ServiceError> {
        if !req.email.contains('@') {
            return Err(ServiceError::validation("A valid email address is required"));
        }
        if req.password.len() < 8 {
            return Err(ServiceError::validation(
                "Password must be at least 8 characters",
            ));
        }
        if req.full_name.trim().is_empty() {
            return Err(ServiceError::validation("Full name must not be empty"));
        }

        if self.users.email_exists(&req.email).await? {
            return Err(ServiceError::bad_request("Email is already registered"));
        }

        let password_hash = hash_password(&req.password)?;
        let user = self
            .users
            .insert_user(&req.email, &password_hash, req.full_name.trim())
            .await?;

        self.bootstrap_defaults(&user.id).await?;
        self.achievements
            .unlock(&user.id, "WELCOME", "Joined fintrack")
            .await?;

        // Best effort: a failed welcome mail must never fail registration.
        self.mailer.send_welcome(&user.email, &user.full_name);

        self.issue_pair(&user)
    }

    pub async fn login(&self, req: &LoginRequest) -> Result<AuthTokens, ServiceError> {
        let user = self
            .users
            .get_user_by_email(&req.email)
            .await?
            .ok_or_else(|| ServiceError::unauthorized(INVALID_CREDENTIALS))?;

        if !verify_password(&req.password, &user.password_hash) {
            return Err(ServiceError::unauthorized(INVALID_CREDENTIALS));
        }
        if !user.enabled {
            return Err(ServiceError::unauthorized("Account is disabled"));
        }

        if let Some(secret) = &user.totp_secret {
            let code = req
                .totp_code
                .as_deref()
                .ok_or_else(|| ServiceError::unauthorized("Two-factor code required"))?;
            if !self.totp.verify_code(secret, code) {
                return Err(ServiceError::unauthorized(INVALID_TOTP));
            }
        }

        self.issue_pair(&user)
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, ServiceError> {
        if !self.tokens.validate(refresh_token) {
            return Err(ServiceError::unauthorized("Invalid or expired refresh token"));
        }
        let claims = self
            .tokens
            .decode(refresh_token)
            .map_err(|_| ServiceError::unauthorized("Invalid or expired refresh token"))?;
        if claims.typ != TokenUse::Refresh {
            return Err(ServiceError::unauthorized("Invalid or expired refresh token"));
        }

        let user = self
            .users
            .get_user_by_id(&claims.sub)
            .await?
            .ok_or_else(|| {
                ServiceError::unauthorized("Invalid token or user no longer exists")
            })?;
        if !user.enabled {
            return Err(ServiceError::unauthorized("Account is disabled"));
        }
        if claims.tv != user.token_version {
            return Err(ServiceError::unauthorized("Token has been invalidated"));
        }

        self.issue_pair(&user)
    }

    /// "Log out everywhere": bumping the persisted token version makes every
    /// previously issued token fail the gate's version comparison.
    pub async fn logout_all_devices(
        &self,
        user_id: &str,
        password: &str,
    ) -> Result<(), ServiceError> {
        let user = self
            .users
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User not found"))?;

        if !verify_password(password, &user.password_hash) {
            return Err(ServiceError::unauthorized(INVALID_CREDENTIALS));
        }

        self.users.bump_token_version(user_id).await?;
        log::info!("User {} logged out of all devices", user_id);

        Ok(())
    }

    pub async fn totp_setup(&self, user_id: &str) -> Result<TotpSetup, ServiceError> {
        let user = self
            .users
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User not found"))?;

        let secret = self.totp.generate_secret();
        self.users.set_totp_secret(user_id, Some(&secret)).await?;

        Ok(TotpSetup {
            provisioning_uri: self.totp.provisioning_uri(&user.email, &secret),
            secret,
        })
    }

    pub async fn totp_disable(&self, user_id: &str, code: &str) -> Result<(), ServiceError> {
        let user = self
            .users
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User not found"))?;
        let secret = user.totp_secret.as_deref().ok_or_else(|| {
            ServiceError::bad_request("Two-factor authentication is not enabled")
        })?;

        if !self.totp.verify_code(secret, code) {
            return Err(ServiceError::unauthorized(INVALID_TOTP));
        }

        self.users.set_totp_secret(user_id, None).await?;

        Ok(())
    }

    async fn bootstrap_defaults(&self, user_id: &str) -> Result<(), ServiceError> {
        self.wallets
            .insert_wallet(
                user_id,
                DEFAULT_WALLET_NAME,
                WalletKind::Cash,
                &self.default_currency,
                true,
            )
            .await?;

        for (name, kind) in DEFAULT_CATEGORIES {
            self.categories.insert_category(user_id, name, *kind).await?;
        }

        Ok(())
    }

    fn issue_pair(&self, user: &User) -> Result<AuthTokens, ServiceError> {
        let access_token = self
            .tokens
            .issue_access_token(&user.id, user.role, user.token_version)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        let refresh_token = self
            .tokens
            .issue_refresh_token(&user.id, user.token_version)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;

        Ok(AuthTokens {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.tokens.access_ttl_secs(),
        })
    }
}

pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::Internal(format!("Password hashing failed: {}", e)))
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(password_hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies_only_the_original() {
        let hash = hash_password("correct horse battery").unwrap();

        assert!(verify_password("correct horse battery", &hash));
        assert!(!verify_password("wrong horse battery", &hash));
    }

    #[test]
    fn hashes_are_salted() {
        let first = hash_password("same password").unwrap();
        let second = hash_password("same password").unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn corrupt_stored_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}
