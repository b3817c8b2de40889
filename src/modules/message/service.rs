use std::sync::Arc;

use log::info;
use uuid::Uuid;

use crate::api::error;
use crate::constants::{MESSAGE_MAX_LENGTH, THREAD_MESSAGE_LIMIT};
use crate::modules::friend::repository::FriendshipRepository;
use crate::modules::message::model::InsertMessage;
use crate::modules::message::repository::MessageRepository;
use crate::modules::message::schema::MessageEntity;

/// Direct messages between friends.
#[derive(Clone)]
pub struct MessageService<M, F>
where
    M: MessageRepository + Send + Sync,
    F: FriendshipRepository + Send + Sync,
{
    message_repo: Arc<M>,
    friend_repo: Arc<F>,
}

impl<M, F> MessageService<M, F>
where
    M: MessageRepository + Send + Sync,
    F: FriendshipRepository + Send + Sync,
{
    pub fn with_dependencies(message_repo: Arc<M>, friend_repo: Arc<F>) -> Self {
        MessageService { message_repo, friend_repo }
    }

    pub async fn send_message(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
        content: &str,
    ) -> Result<MessageEntity, error::SystemError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(error::SystemError::bad_request("Message content cannot be empty"));
        }
        if content.chars().count() > MESSAGE_MAX_LENGTH {
            return Err(error::SystemError::bad_request(format!(
                "Message content cannot exceed {MESSAGE_MAX_LENGTH} characters"
            )));
        }

        if self.friend_repo.find_friendship(&sender_id, &receiver_id).await?.is_none() {
            return Err(error::SystemError::forbidden("Not friends"));
        }

        let message = self
            .message_repo
            .create(&InsertMessage { sender_id, receiver_id, content: content.to_string() })
            .await?;
        info!("Message {} sent from {} to {}", message.id, sender_id, receiver_id);

        Ok(message)
    }

    /// Fetching a thread is what marks the friend's messages as read.
    pub async fn get_thread(
        &self,
        user_id: Uuid,
        friend_id: Uuid,
        limit: Option<i64>,
    ) -> Result<Vec<MessageEntity>, error::SystemError> {
        let limit = limit.unwrap_or(THREAD_MESSAGE_LIMIT).clamp(1, THREAD_MESSAGE_LIMIT);
        self.message_repo.find_thread_and_mark_read(&user_id, &friend_id, limit).await
    }
}
