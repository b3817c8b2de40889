use log::info;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error;
use crate::modules::user::model::{InsertUser, SignInModel, SignUpModel, UserResponse};
use crate::modules::user::repository::{SessionStore, UserRepository};
use crate::utils::{Claims, TokenSettings, TypeClaims, hash_password, verify_password};

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository + Send + Sync>,
    sessions: Arc<dyn SessionStore + Send + Sync>,
    tokens: TokenSettings,
}

impl UserService {
    pub fn with_dependencies(
        repo: Arc<dyn UserRepository + Send + Sync>,
        sessions: Arc<dyn SessionStore + Send + Sync>,
        tokens: TokenSettings,
    ) -> Self {
        info!("UserService initialized with dependencies");
        UserService { repo, sessions, tokens }
    }

    pub fn refresh_expiration(&self) -> u64 {
        self.tokens.refresh_expiration
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<UserResponse, error::SystemError> {
        self.repo
            .find_by_id(&id)
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| error::SystemError::not_found("User not found"))
    }

    pub async fn sign_up(&self, user: SignUpModel) -> Result<Uuid, error::SystemError> {
        let hash_password = hash_password(&user.password)?;

        let new_user = InsertUser {
            username: user.username,
            name: user.name,
            email: user.email,
            phone: Some(user.phone),
            hash_password: Some(hash_password),
        };

        let user_id = self.repo.create(&new_user).await?;
        info!("User {user_id} registered");
        Ok(user_id)
    }

    pub async fn sign_in(&self, user: SignInModel) -> Result<(String, String), error::SystemError> {
        let user_entity = self
            .repo
            .find_by_phone(&user.phone)
            .await?
            .ok_or_else(|| error::SystemError::unauthorized("Invalid phone or password"))?;

        let Some(hash) = user_entity.hash_password.as_deref() else {
            return Err(error::SystemError::unauthorized("Invalid phone or password"));
        };

        if !verify_password(hash, &user.password)? {
            return Err(error::SystemError::unauthorized("Invalid phone or password"));
        }

        self.issue_tokens(&user_entity.id).await
    }

    /// Consumes a refresh token and issues a fresh pair.
    pub async fn refresh(
        &self,
        refresh_token: Option<String>,
    ) -> Result<(String, String), error::SystemError> {
        let claims = self.verify_refresh_token(refresh_token)?;
        let jti = claims.jti.ok_or_else(|| error::SystemError::unauthorized("Invalid token"))?;

        if !self.sessions.revoke(&jti).await? {
            return Err(error::SystemError::unauthorized("Refresh token revoked"));
        }

        self.issue_tokens(&claims.sub).await
    }

    pub async fn sign_out(&self, refresh_token: Option<String>) -> Result<(), error::SystemError> {
        // an unusable cookie is already signed out
        let Ok(claims) = self.verify_refresh_token(refresh_token) else {
            return Ok(());
        };

        if let Some(jti) = claims.jti {
            self.sessions.revoke(&jti).await?;
            info!("User {} signed out", claims.sub);
        }
        Ok(())
    }

    fn verify_refresh_token(&self, token: Option<String>) -> Result<Claims, error::SystemError> {
        let token = token.ok_or_else(|| error::SystemError::unauthorized("Missing token"))?;
        let claims = Claims::decode(&token, self.tokens.secret.as_bytes())
            .map_err(|_| error::SystemError::unauthorized("Invalid token"))?;

        if !claims.is_type(TypeClaims::RefreshToken) {
            return Err(error::SystemError::unauthorized("Invalid token"));
        }
        Ok(claims)
    }

    async fn issue_tokens(&self, user_id: &Uuid) -> Result<(String, String), error::SystemError> {
        let secret = self.tokens.secret.as_bytes();
        let access_token =
            Claims::access(user_id, self.tokens.access_expiration).encode(secret)?;

        let jti = Uuid::now_v7();
        let refresh_token =
            Claims::refresh(user_id, self.tokens.refresh_expiration, jti).encode(secret)?;

        self.sessions.save(&jti, user_id, self.tokens.refresh_expiration).await?;

        Ok((access_token, refresh_token))
    }
}
