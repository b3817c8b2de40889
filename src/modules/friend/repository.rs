use uuid::Uuid;

use crate::api::error;
use crate::modules::friend::model::{FriendRequestResponse, FriendResponse};
use crate::modules::friend::schema::{FriendRequestEntity, FriendshipEntity};

#[async_trait::async_trait]
pub trait FriendshipRepository {
    /// Matches the pair regardless of argument order.
    async fn find_friendship(
        &self,
        user_id_a: &Uuid,
        user_id_b: &Uuid,
    ) -> Result<Option<FriendshipEntity>, error::SystemError>;

    /// The other participant of every friendship of `user_id`, newest first.
    async fn find_friends(&self, user_id: &Uuid)
    -> Result<Vec<FriendResponse>, error::SystemError>;
}

#[async_trait::async_trait]
pub trait FriendRequestRepository {
    /// Pending request in the given direction only.
    async fn find_pending_request(
        &self,
        sender_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError>;

    /// Pending request in either direction.
    async fn find_pending_request_between(
        &self,
        user_id_a: &Uuid,
        user_id_b: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError>;

    async fn find_pending_requests_to_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendRequestResponse>, error::SystemError>;

    async fn find_pending_requests_from_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendRequestResponse>, error::SystemError>;

    async fn create_friend_request(
        &self,
        sender_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<FriendRequestEntity, error::SystemError>;
}

#[async_trait::async_trait]
pub trait FriendRepo: FriendshipRepository + FriendRequestRepository + Send + Sync {
    /// Marks the request accepted and creates the friendship in one transaction.
    async fn accept_friend_request_atomic(
        &self,
        request_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<FriendRequestEntity, error::SystemError>;

    async fn reject_friend_request_atomic(
        &self,
        request_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<FriendRequestEntity, error::SystemError>;
}
