use crate::{
    dtos::auth::{
        LoginRequest, LogoutRequest, PasswordResetConfirmRequest, PasswordResetRequest,
        RegisterRequest, TokenPairResponse,
    },
    models::{User, UserDetailsResponse, USER_RESOURCE},
    services::{
        decode_uid, encode_uid, AccessTokenClaims, EmailProvider, JwtService, RefreshTokenClaims,
        ResetTokenGenerator, ServiceError, Store, TokenBlacklist,
    },
    utils::{hash_password, verify_password, Password, PasswordHashString},
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Account lifecycle: registration, the token pair, revocation, and the
/// stateless password-reset flow.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    email: Arc<dyn EmailProvider>,
    jwt: JwtService,
    blacklist: Arc<dyn TokenBlacklist>,
    reset: ResetTokenGenerator,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn Store>,
        email: Arc<dyn EmailProvider>,
        jwt: JwtService,
        blacklist: Arc<dyn TokenBlacklist>,
        reset: ResetTokenGenerator,
    ) -> Self {
        Self {
            store,
            email,
            jwt,
            blacklist,
            reset,
        }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<User, ServiceError> {
        if self
            .store
            .find_user_by_email(&req.email)
            .await
            .map_err(ServiceError::Storage)?
            .is_some()
        {
            return Err(ServiceError::Validation(
                "A user with this email already exists".to_string(),
            ));
        }

        if self
            .store
            .find_user_by_username(&req.username)
            .await
            .map_err(ServiceError::Storage)?
            .is_some()
        {
            return Err(ServiceError::Validation(
                "A user with this username already exists".to_string(),
            ));
        }

        let password_hash = hash_password(&Password::new(req.password))
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Password hashing error: {}", e)))?;

        let user = User::new(req.email, req.username, password_hash.into_string());

        self.store
            .insert_user(&user)
            .await
            .map_err(ServiceError::Storage)?;

        tracing::info!(user_id = %user.user_id, "User registered");

        Ok(user)
    }

    /// Authenticate by email and password, issue a token pair.
    ///
    /// Unknown email, wrong password and deactivated accounts all surface
    /// the same error so the response never leaks which one it was.
    pub async fn login(&self, req: LoginRequest) -> Result<TokenPairResponse, ServiceError> {
        let user = self
            .store
            .find_user_by_email(&req.email)
            .await
            .map_err(ServiceError::Storage)?
            .ok_or(ServiceError::InvalidCredentials)?;

        verify_password(
            &Password::new(req.password),
            &PasswordHashString::new(user.password_hash.clone()),
        )
        .map_err(|_| ServiceError::InvalidCredentials)?;

        if !user.is_active {
            return Err(ServiceError::InvalidCredentials);
        }

        // Side effect: any previously issued reset token is invalidated.
        self.store
            .touch_last_login(user.user_id, Utc::now())
            .await
            .map_err(ServiceError::Storage)?;

        let access = self.jwt.generate_access_token(&user)?;
        let refresh = self.jwt.generate_refresh_token(user.user_id)?;

        tracing::info!(user_id = %user.user_id, "User logged in");

        Ok(TokenPairResponse { access, refresh })
    }

    /// Revoke a refresh token by blacklisting its JWT ID for the token's
    /// remaining lifetime. Idempotent; every failure mode surfaces as an
    /// invalid-token error.
    pub async fn logout(&self, req: LogoutRequest) -> Result<(), ServiceError> {
        let claims = self
            .jwt
            .validate_refresh_token(&req.refresh)
            .map_err(|_| ServiceError::InvalidToken)?;

        let remaining = claims.exp - Utc::now().timestamp();
        self.blacklist
            .blacklist_token(&claims.jti, remaining)
            .await
            .map_err(|_| ServiceError::InvalidToken)?;

        tracing::info!(user_id = %claims.sub, "Refresh token revoked");

        Ok(())
    }

    /// Validate a refresh token, including the revocation check.
    pub async fn verify_refresh(&self, token: &str) -> Result<RefreshTokenClaims, ServiceError> {
        let claims = self
            .jwt
            .validate_refresh_token(token)
            .map_err(|_| ServiceError::InvalidToken)?;

        if self
            .blacklist
            .is_blacklisted(&claims.jti)
            .await
            .map_err(ServiceError::Storage)?
        {
            return Err(ServiceError::InvalidToken);
        }

        Ok(claims)
    }

    /// Load the user behind a validated access token.
    pub async fn current_user(&self, claims: &AccessTokenClaims) -> Result<User, ServiceError> {
        let user_id =
            Uuid::parse_str(&claims.sub).map_err(|_| ServiceError::InvalidToken)?;

        self.store
            .find_user_by_id(user_id)
            .await
            .map_err(ServiceError::Storage)?
            .ok_or_else(|| ServiceError::NotFound("User".to_string()))
    }

    /// The sanitized user plus group read-models and directly-assigned
    /// permissions, filtered to the assignable set.
    pub async fn user_details(&self, user: &User) -> Result<UserDetailsResponse, ServiceError> {
        let group_ids = self
            .store
            .user_group_ids(user.user_id)
            .await
            .map_err(ServiceError::Storage)?;

        let mut groups = Vec::with_capacity(group_ids.len());
        for group_id in group_ids {
            if let Some(record) = self
                .store
                .group_record(group_id)
                .await
                .map_err(ServiceError::Storage)?
            {
                groups.push(record.into());
            }
        }

        let permissions = self
            .store
            .user_direct_permissions(user.user_id)
            .await
            .map_err(ServiceError::Storage)?
            .into_iter()
            .filter(|p| p.resource == USER_RESOURCE && !p.is_reserved())
            .map(Into::into)
            .collect();

        Ok(UserDetailsResponse {
            user: user.sanitized(),
            permissions,
            groups,
        })
    }

    /// Derive a reset token from the user's current state and email it.
    pub async fn request_reset(&self, req: PasswordResetRequest) -> Result<(), ServiceError> {
        let user = self
            .store
            .find_user_by_email(&req.email)
            .await
            .map_err(ServiceError::Storage)?
            .ok_or_else(|| ServiceError::Validation("email not found".to_string()))?;

        let uid = encode_uid(user.user_id);
        let token = self.reset.make_token(&user)?;

        self.email
            .send_password_reset_email(&user.email, &uid, &token)
            .await
            .map_err(|e| ServiceError::Email(e.to_string()))?;

        tracing::info!(user_id = %user.user_id, "Password reset email sent");

        Ok(())
    }

    /// Set a new password if the uid/token pair checks out against the
    /// user's current state. A successful reset changes that state, so the
    /// token cannot be replayed.
    pub async fn confirm_reset(
        &self,
        uid: &str,
        token: &str,
        req: PasswordResetConfirmRequest,
    ) -> Result<(), ServiceError> {
        if req.password != req.confirm_password {
            return Err(ServiceError::Validation(
                "Passwords do not match".to_string(),
            ));
        }

        let user_id = decode_uid(uid).ok_or(ServiceError::InvalidToken)?;

        let user = self
            .store
            .find_user_by_id(user_id)
            .await
            .map_err(ServiceError::Storage)?
            .ok_or(ServiceError::InvalidToken)?;

        if !self.reset.check_token(&user, token) {
            return Err(ServiceError::InvalidToken);
        }

        let password_hash = hash_password(&Password::new(req.password))
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Password hashing error: {}", e)))?;

        self.store
            .update_user_password(user.user_id, password_hash.as_str())
            .await
            .map_err(ServiceError::Storage)?;

        tracing::info!(user_id = %user.user_id, "Password reset completed");

        Ok(())
    }
}
