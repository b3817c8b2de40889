use uuid::Uuid;

use crate::{
    api::error,
    modules::friend::{
        model::{FriendRequestResponse, FriendResponse, IdOrInfo, PendingRequestRow},
        repository::{FriendRepo, FriendRequestRepository, FriendshipRepository},
        schema::{FriendRequestEntity, FriendshipEntity, RequestStatus, ordered_pair},
    },
};

#[derive(Clone)]
pub struct FriendRepositoryPg {
    pool: sqlx::PgPool,
}

impl FriendRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    async fn insert_friendship<'e, E>(
        user_id_a: &Uuid,
        user_id_b: &Uuid,
        tx: E,
    ) -> Result<(), error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let (user1, user2) = ordered_pair(*user_id_a, *user_id_b);

        sqlx::query(
            r#"
            INSERT INTO friendships (id, user1_id, user2_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (user1_id, user2_id) DO NOTHING
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(user1)
        .bind(user2)
        .execute(tx)
        .await?;

        Ok(())
    }

    async fn respond_atomic(
        &self,
        request_id: &Uuid,
        user_id: &Uuid,
        status: RequestStatus,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        let request = sqlx::query_as::<_, FriendRequestEntity>(
            "SELECT * FROM friend_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(request_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| error::SystemError::not_found("Friend request not found"))?;

        if let Err(e) = request.ensure_respondable(user_id) {
            tx.rollback().await?;
            return Err(e);
        }

        let updated = sqlx::query_as::<_, FriendRequestEntity>(
            r#"
            UPDATE friend_requests
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(status)
        .fetch_one(&mut *tx)
        .await?;

        if status == RequestStatus::Accepted {
            Self::insert_friendship(&updated.sender_id, &updated.receiver_id, &mut *tx).await?;
        }

        tx.commit().await?;

        Ok(updated)
    }
}

fn into_responses(
    rows: Vec<PendingRequestRow>,
    user_id: &Uuid,
    incoming: bool,
) -> Vec<FriendRequestResponse> {
    rows.into_iter()
        .map(|r| {
            let (sender, receiver) = if incoming {
                (IdOrInfo::Info(r.profile()), IdOrInfo::Id(*user_id))
            } else {
                (IdOrInfo::Id(*user_id), IdOrInfo::Info(r.profile()))
            };
            FriendRequestResponse {
                id: r.req_id,
                sender,
                receiver,
                status: r.status,
                created_at: r.created_at,
            }
        })
        .collect()
}

#[async_trait::async_trait]
impl FriendshipRepository for FriendRepositoryPg {
    async fn find_friendship(
        &self,
        user_id_a: &Uuid,
        user_id_b: &Uuid,
    ) -> Result<Option<FriendshipEntity>, error::SystemError> {
        let (user1, user2) = ordered_pair(*user_id_a, *user_id_b);

        let friendship = sqlx::query_as::<_, FriendshipEntity>(
            "SELECT * FROM friendships WHERE user1_id = $1 AND user2_id = $2",
        )
        .bind(user1)
        .bind(user2)
        .fetch_optional(&self.pool)
        .await?;

        Ok(friendship)
    }

    async fn find_friends(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendResponse>, error::SystemError> {
        let friends = sqlx::query_as::<_, FriendResponse>(
            r#"
            SELECT
                u.id,
                u.name,
                u.email,
                u.image
            FROM friendships f
            JOIN users u
                ON u.id = CASE
                    WHEN f.user1_id = $1 THEN f.user2_id
                    ELSE f.user1_id
                END
            WHERE f.user1_id = $1
               OR f.user2_id = $1
            ORDER BY f.created_at DESC, f.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(friends)
    }
}

#[async_trait::async_trait]
impl FriendRequestRepository for FriendRepositoryPg {
    async fn find_pending_request(
        &self,
        sender_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError> {
        let request = sqlx::query_as::<_, FriendRequestEntity>(
            r#"
            SELECT *
            FROM friend_requests
            WHERE sender_id = $1 AND receiver_id = $2 AND status = 'pending'
            "#,
        )
        .bind(sender_id)
        .bind(receiver_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn find_pending_request_between(
        &self,
        user_id_a: &Uuid,
        user_id_b: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError> {
        let request = sqlx::query_as::<_, FriendRequestEntity>(
            r#"
            SELECT *
            FROM friend_requests
            WHERE status = 'pending'
            AND (
                (sender_id = $1 AND receiver_id = $2)
             OR (sender_id = $2 AND receiver_id = $1)
            )
            "#,
        )
        .bind(user_id_a)
        .bind(user_id_b)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn find_pending_requests_to_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendRequestResponse>, error::SystemError> {
        let rows = sqlx::query_as::<_, PendingRequestRow>(
            r#"
            SELECT
                fr.id AS req_id,
                u.id AS user_id,
                u.name,
                u.email,
                u.image,
                fr.status,
                fr.created_at
            FROM friend_requests fr
            JOIN users u
                ON fr.sender_id = u.id
            WHERE fr.receiver_id = $1 AND fr.status = 'pending'
            ORDER BY fr.created_at DESC, fr.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(into_responses(rows, user_id, true))
    }

    async fn find_pending_requests_from_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendRequestResponse>, error::SystemError> {
        let rows = sqlx::query_as::<_, PendingRequestRow>(
            r#"
            SELECT
                fr.id AS req_id,
                u.id AS user_id,
                u.name,
                u.email,
                u.image,
                fr.status,
                fr.created_at
            FROM friend_requests fr
            JOIN users u
                ON fr.receiver_id = u.id
            WHERE fr.sender_id = $1 AND fr.status = 'pending'
            ORDER BY fr.created_at DESC, fr.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(into_responses(rows, user_id, false))
    }

    async fn create_friend_request(
        &self,
        sender_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        let request = sqlx::query_as::<_, FriendRequestEntity>(
            r#"
            INSERT INTO friend_requests (id, sender_id, receiver_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(sender_id)
        .bind(receiver_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(request)
    }
}

#[async_trait::async_trait]
impl FriendRepo for FriendRepositoryPg {
    async fn accept_friend_request_atomic(
        &self,
        request_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        self.respond_atomic(request_id, user_id, RequestStatus::Accepted).await
    }

    async fn reject_friend_request_atomic(
        &self,
        request_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        self.respond_atomic(request_id, user_id, RequestStatus::Rejected).await
    }
}
