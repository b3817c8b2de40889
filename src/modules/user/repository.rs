use uuid::Uuid;

use crate::{api::error, modules::user::model::InsertUser, modules::user::schema::UserEntity};

#[async_trait::async_trait]
pub trait UserRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError>;

    async fn find_by_phone(&self, phone: &str) -> Result<Option<UserEntity>, error::SystemError>;

    async fn create(&self, user: &InsertUser) -> Result<Uuid, error::SystemError>;

    /// Case-insensitive substring match on name, username, email and phone,
    /// never returning `exclude_id`.
    async fn search_users(
        &self,
        query: &str,
        exclude_id: &Uuid,
        limit: i64,
    ) -> Result<Vec<UserEntity>, error::SystemError>;
}

/// Refresh-token sessions, keyed by the token's `jti`.
#[async_trait::async_trait]
pub trait SessionStore {
    async fn save(&self, jti: &Uuid, user_id: &Uuid, ttl_secs: u64)
    -> Result<(), error::SystemError>;

    /// `false` when no live session exists for `jti`.
    async fn revoke(&self, jti: &Uuid) -> Result<bool, error::SystemError>;
}
