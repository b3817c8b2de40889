use deadpool_redis::{Runtime, redis::AsyncCommands};
use sqlx::{PgPool, postgres::PgPoolOptions};
use uuid::Uuid;

use crate::{ENV, api::error, modules::user::repository::SessionStore};

pub async fn connect_database() -> Result<PgPool, error::SystemError> {
    let pool = PgPoolOptions::new()
        .max_connections(ENV.database_max_connections)
        .min_connections(1)
        .acquire_slow_threshold(std::time::Duration::from_secs(3))
        .connect(&ENV.database_url)
        .await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| error::SystemError::InternalError(Box::new(e)))?;
    log::info!("Database migrations applied");

    Ok(pool)
}

#[derive(Clone)]
pub struct RedisCache {
    pool: deadpool_redis::Pool,
}

impl RedisCache {
    pub async fn new() -> Result<Self, error::SystemError> {
        let mut cfg = deadpool_redis::Config::from_url(&ENV.redis_url);
        cfg.pool = Some(deadpool_redis::PoolConfig { max_size: 16, ..Default::default() });
        let pool = cfg.create_pool(Some(Runtime::Tokio1))?;
        Ok(Self { pool })
    }

    pub async fn set<T>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: u64,
    ) -> Result<(), error::SystemError>
    where
        T: serde::Serialize,
    {
        let mut conn = self.pool.get().await?;
        let serialized = serde_json::to_vec(value)?;
        conn.set_ex::<_, _, ()>(key, serialized, ttl_secs).await?;
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<bool, error::SystemError> {
        let mut conn = self.pool.get().await?;
        let removed: u64 = conn.del(key).await?;
        Ok(removed > 0)
    }
}

fn refresh_key(jti: &Uuid) -> String {
    format!("refresh_token:{jti}")
}

#[async_trait::async_trait]
impl SessionStore for RedisCache {
    async fn save(
        &self,
        jti: &Uuid,
        user_id: &Uuid,
        ttl_secs: u64,
    ) -> Result<(), error::SystemError> {
        self.set(&refresh_key(jti), user_id, ttl_secs).await
    }

    async fn revoke(&self, jti: &Uuid) -> Result<bool, error::SystemError> {
        self.delete(&refresh_key(jti)).await
    }
}
