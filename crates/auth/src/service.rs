//! Credential service
//!
//! Account lifecycle and request authentication: registration with password
//! policy, login, bearer-token verification and withdrawal. Tokens are
//! stateless HS256 JWTs; expiry is the only invalidation.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{debug, info, warn};

use crate::claims::TokenClaims;
use crate::error::{AuthError, Result};
use crate::password::{check_policy, hash_password, verify_password};
use crate::user::{NewUser, StoredUser, UserInfo};
use crate::user_store_trait::UserStore;

/// Minimum HS256 secret length in bytes
const MIN_SECRET_BYTES: usize = 32;

/// Successful login
#[derive(Debug, Clone)]
pub struct AuthResponse {
    /// Signed bearer token
    pub token: String,
    /// Authenticated user information
    pub user: UserInfo,
    /// When the token expires (Unix timestamp)
    pub expires_at: i64,
    /// This login was the user's first
    pub first_login: bool,
}

/// Configuration for the credential service
#[derive(Clone)]
pub struct CredentialConfig {
    /// JWT signing secret (must be at least 32 bytes)
    pub jwt_secret: Vec<u8>,
    /// Token time-to-live
    pub token_ttl: StdDuration,
    /// Issuer claim for tokens
    pub issuer: Option<String>,
}

impl std::fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("token_ttl", &self.token_ttl)
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            jwt_secret: vec![],
            token_ttl: StdDuration::from_secs(60 * 60),
            issuer: Some("mediguard".to_string()),
        }
    }
}

impl CredentialConfig {
    /// Create a new config with the given secret
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            jwt_secret: secret.into(),
            ..Default::default()
        }
    }

    /// Set token TTL
    pub fn with_ttl(mut self, ttl: StdDuration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Set issuer
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }
}

/// Credential service
///
/// # Example
///
/// ```ignore
/// let store = LocalUserStore::new(pool).await?;
/// let config = CredentialConfig::new(b"your-secret-key-at-least-32-bytes!".to_vec());
/// let credentials = CredentialService::new(Arc::new(store), config)?;
///
/// credentials.register(&candidate).await?;
/// let login = credentials.authenticate("alice", "Secret1!").await?;
/// let user = credentials.verify(&login.token).await?;
/// ```
pub struct CredentialService {
    store: Arc<dyn UserStore>,
    config: CredentialConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for CredentialService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialService")
            .field("token_ttl", &self.config.token_ttl)
            .field("issuer", &self.config.issuer)
            .finish()
    }
}

impl CredentialService {
    /// Create a new credential service
    ///
    /// Fails if the JWT secret is shorter than 32 bytes.
    pub fn new(store: Arc<dyn UserStore>, config: CredentialConfig) -> Result<Self> {
        if config.jwt_secret.len() < MIN_SECRET_BYTES {
            return Err(AuthError::Config(format!(
                "JWT secret must be at least {} bytes",
                MIN_SECRET_BYTES
            )));
        }

        let encoding_key = EncodingKey::from_secret(&config.jwt_secret);
        let decoding_key = DecodingKey::from_secret(&config.jwt_secret);

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.required_spec_claims.clear();
        validation.required_spec_claims.insert("exp".to_string());

        if let Some(ref issuer) = config.issuer {
            validation.set_issuer(&[issuer]);
        }

        Ok(Self {
            store,
            config,
            encoding_key,
            decoding_key,
            validation,
        })
    }

    /// Get the underlying user store
    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    // =========================================================================
    // Account lifecycle
    // =========================================================================

    /// Register a new account
    ///
    /// Validates the profile and password policy, hashes the password and
    /// stores the user as active with the first-login flag unset.
    /// A withdrawn user with the same id is revived in place.
    pub async fn register(&self, candidate: &NewUser) -> Result<String> {
        candidate.validate()?;
        check_policy(&candidate.password)?;

        let password_hash = hash_password(&candidate.password)?;
        let user = self.store.create_user(candidate, &password_hash).await?;

        Ok(user.user_id)
    }

    /// Authenticate with user id and password
    ///
    /// The first successful login flips the first-login flag before the
    /// token is issued.
    pub async fn authenticate(&self, user_id: &str, password: &str) -> Result<AuthResponse> {
        if user_id.is_empty() || password.is_empty() {
            return Err(AuthError::validation("user_id and password are required"));
        }

        let user = self
            .store
            .get_active(user_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            debug!(user_id = %user_id, "password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let first_login = !user.first_login && self.store.mark_first_login(user_id).await?;

        let (token, claims) = self.generate_token(&user)?;

        info!(user_id = %user.user_id, first_login, "user logged in");

        Ok(AuthResponse {
            token,
            user: user.to_user_info(),
            expires_at: claims.expires_at,
            first_login,
        })
    }

    /// Verify a bearer token and resolve its user
    ///
    /// Fails on bad signature, expiry, or when the user is no longer active.
    pub async fn verify(&self, token: &str) -> Result<UserInfo> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let claims = self.validate_jwt(token)?;

        let user = self
            .store
            .get_active(&claims.user_id)
            .await?
            .ok_or_else(|| AuthError::InactiveUser(claims.user_id.clone()))?;

        Ok(user.to_user_info())
    }

    /// Withdraw (soft-delete) an active user
    ///
    /// Returns false when there was nothing to withdraw.
    pub async fn withdraw(&self, user_id: &str) -> Result<bool> {
        let withdrawn = self.store.withdraw(user_id).await?;
        if !withdrawn {
            warn!(user_id = %user_id, "withdrawal matched no active user");
        }
        Ok(withdrawn)
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Whether no active user holds `user_id`
    pub async fn check_id_available(&self, user_id: &str) -> Result<bool> {
        if user_id.trim().is_empty() {
            return Err(AuthError::validation("user_id is required"));
        }
        Ok(self.store.get_active(user_id).await?.is_none())
    }

    /// Display name of an active user
    pub async fn display_name(&self, user_id: &str) -> Result<String> {
        self.store
            .get_active(user_id)
            .await?
            .map(|u| u.display_name)
            .ok_or_else(|| AuthError::NotFound(user_id.to_string()))
    }

    /// Update the elderly-role flag; false if no active user matched
    pub async fn set_role(&self, user_id: &str, is_elderly: bool) -> Result<bool> {
        let updated = self.store.set_role(user_id, is_elderly).await?;
        if updated {
            info!(user_id = %user_id, is_elderly, "role updated");
        }
        Ok(updated)
    }

    /// Store or replace the user's push-notification token
    pub async fn register_push_token(&self, user_id: &str, token: &str) -> Result<()> {
        if token.trim().is_empty() {
            return Err(AuthError::validation("push token is required"));
        }
        if !self.store.set_push_token(user_id, token.trim()).await? {
            return Err(AuthError::NotFound(user_id.to_string()));
        }
        debug!(user_id = %user_id, "push token registered");
        Ok(())
    }

    // =========================================================================
    // Internal methods
    // =========================================================================

    /// Generate a JWT token for a user
    fn generate_token(&self, user: &StoredUser) -> Result<(String, TokenClaims)> {
        let now = chrono::Utc::now();
        let ttl = Duration::from_std(self.config.token_ttl).unwrap_or_else(|_| Duration::hours(1));

        let claims = TokenClaims {
            user_id: user.user_id.clone(),
            display_name: user.display_name.clone(),
            expires_at: (now + ttl).timestamp(),
            issued_at: now.timestamp(),
            issuer: self.config.issuer.clone(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(format!("failed to encode JWT: {}", e)))?;

        Ok((token, claims))
    }

    /// Validate JWT and return claims
    fn validate_jwt(&self, jwt: &str) -> Result<TokenClaims> {
        let token_data =
            decode::<TokenClaims>(jwt, &self.decoding_key, &self.validation).map_err(|e| {
                debug!("JWT validation failed: {:?}", e);
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AuthError::InvalidSignature
                    }
                    _ => AuthError::InvalidToken(e.to_string()),
                }
            })?;

        Ok(token_data.claims)
    }
}
