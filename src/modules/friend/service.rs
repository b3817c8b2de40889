use std::sync::Arc;

use futures_util::future::join_all;
use log::{info, warn};
use uuid::Uuid;

use crate::{
    api::error,
    constants::{SEARCH_MIN_QUERY_LEN, SEARCH_RESULT_LIMIT},
    modules::{
        friend::{
            model::{
                FriendRequestResponse, FriendRequestsResponse, FriendResponse, IdOrInfo,
                SearchUserResponse,
            },
            repository::FriendRepo,
        },
        user::{repository::UserRepository, schema::UserEntity},
    },
};

#[derive(Clone)]
pub struct FriendService<R, U>
where
    R: FriendRepo + Send + Sync,
    U: UserRepository + Send + Sync,
{
    friend_repo: Arc<R>,
    user_repo: Arc<U>,
}

impl<R, U> FriendService<R, U>
where
    R: FriendRepo + Send + Sync,
    U: UserRepository + Send + Sync,
{
    pub fn with_dependencies(friend_repo: Arc<R>, user_repo: Arc<U>) -> Self {
        FriendService { friend_repo, user_repo }
    }

    pub async fn get_friends(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<FriendResponse>, error::SystemError> {
        self.friend_repo.find_friends(&user_id).await
    }

    pub async fn send_friend_request(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
    ) -> Result<FriendRequestResponse, error::SystemError> {
        if receiver_id == sender_id {
            return Err(error::SystemError::invalid_operation(
                "Cannot send friend request to yourself",
            ));
        }

        let (sender, receiver) = tokio::try_join!(
            self.user_repo.find_by_id(&sender_id),
            self.user_repo.find_by_id(&receiver_id),
        )?;
        let sender = sender.ok_or_else(|| error::SystemError::not_found("User not found"))?;
        let receiver =
            receiver.ok_or_else(|| error::SystemError::not_found("Receiver user not found"))?;

        let (friendship, pending) = tokio::try_join!(
            self.friend_repo.find_friendship(&sender_id, &receiver_id),
            self.friend_repo.find_pending_request_between(&sender_id, &receiver_id),
        )?;

        if friendship.is_some() {
            return Err(error::SystemError::conflict("Users are already friends"));
        }

        if pending.is_some() {
            return Err(error::SystemError::conflict("Friend request already pending"));
        }

        let request = self.friend_repo.create_friend_request(&sender_id, &receiver_id).await?;
        info!("Friend request {} sent from {} to {}", request.id, sender_id, receiver_id);

        Ok(FriendRequestResponse {
            id: request.id,
            sender: IdOrInfo::Info(sender.into()),
            receiver: IdOrInfo::Info(receiver.into()),
            status: request.status,
            created_at: request.created_at,
        })
    }

    /// Returns the profile of the new friend (the request's sender).
    pub async fn accept_friend_request(
        &self,
        user_id: Uuid,
        request_id: Uuid,
    ) -> Result<FriendResponse, error::SystemError> {
        let request = self.friend_repo.accept_friend_request_atomic(&request_id, &user_id).await?;
        info!("Friend request {} accepted by {}", request_id, user_id);

        let sender = self
            .user_repo
            .find_by_id(&request.sender_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("User not found"))?;

        Ok(FriendResponse::from(sender))
    }

    pub async fn reject_friend_request(
        &self,
        user_id: Uuid,
        request_id: Uuid,
    ) -> Result<(), error::SystemError> {
        self.friend_repo.reject_friend_request_atomic(&request_id, &user_id).await?;
        info!("Friend request {} rejected by {}", request_id, user_id);
        Ok(())
    }

    pub async fn get_friend_requests(
        &self,
        user_id: Uuid,
    ) -> Result<FriendRequestsResponse, error::SystemError> {
        let (received, sent) = tokio::try_join!(
            self.friend_repo.find_pending_requests_to_user(&user_id),
            self.friend_repo.find_pending_requests_from_user(&user_id),
        )?;

        Ok(FriendRequestsResponse { received, sent })
    }

    pub async fn search_users(
        &self,
        user_id: Uuid,
        query: &str,
    ) -> Result<Vec<SearchUserResponse>, error::SystemError> {
        let query = query.trim();
        if query.chars().count() < SEARCH_MIN_QUERY_LEN {
            return Ok(Vec::new());
        }

        let candidates =
            self.user_repo.search_users(query, &user_id, SEARCH_RESULT_LIMIT).await?;

        let annotated =
            join_all(candidates.into_iter().map(|candidate| self.annotate(user_id, candidate)))
                .await;

        Ok(annotated)
    }

    /// A failed lookup degrades the flags to `false` instead of failing the search.
    async fn annotate(&self, user_id: Uuid, candidate: UserEntity) -> SearchUserResponse {
        let lookups = tokio::try_join!(
            self.friend_repo.find_friendship(&user_id, &candidate.id),
            self.friend_repo.find_pending_request(&user_id, &candidate.id),
        );

        let (is_friend, request_sent) = match lookups {
            Ok((friendship, request)) => (friendship.is_some(), request.is_some()),
            Err(e) => {
                warn!("Search annotation for {} failed: {:?}", candidate.id, e);
                (false, false)
            }
        };

        SearchUserResponse::annotate(candidate, is_friend, request_sent)
    }
}
